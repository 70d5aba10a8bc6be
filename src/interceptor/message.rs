use serde::Deserialize;

use crate::consts::CLEAR_CACHE_MESSAGE;

/// Commands a controlled page can send over the control channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlMessage {
    ClearCache,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl ControlMessage {
    /// 解析页面发送的消息，无法识别的内容返回 `None`
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let envelope: Envelope = serde_json::from_slice(payload).ok()?;
        match envelope.kind.as_deref() {
            Some(CLEAR_CACHE_MESSAGE) => Some(Self::ClearCache),
            _ => None,
        }
    }
}
