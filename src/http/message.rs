use axum::{body::Bytes, extract::State, http::StatusCode};

use super::AppState;
use crate::interceptor::Event;

/// 控制通道
///
/// 消息处理在后台完成，发送方总是立即收到 `202 Accepted`，
/// 无法识别的消息静默忽略。
pub async fn message(State(state): State<AppState>, body: Bytes) -> StatusCode {
    // 消息事件不会返回错误
    let _ = state.interceptor.dispatch(Event::Message(body)).await;
    StatusCode::ACCEPTED
}
