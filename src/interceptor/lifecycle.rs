use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// 已停止，不再拦截请求
    Redundant,
}

/// 拦截器的安装与激活状态，以及受控页面
///
/// 安装时跳过等待期，激活时接管所有已知页面，无需页面刷新。
#[derive(Debug)]
pub struct Lifecycle {
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
    /// client id -> 是否受控
    clients: DashMap<String, bool>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: RwLock::new(LifecycleState::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients: DashMap::new(),
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Activated
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<()> {
        let mut state = self.state.write();
        if *state != from {
            return Err(Error::Lifecycle(format!(
                "expected {from:?} before {to:?}, found {:?}",
                *state
            )));
        }
        debug!("lifecycle {:?} -> {:?}", *state, to);
        *state = to;
        Ok(())
    }

    pub fn begin_install(&self) -> Result<()> {
        self.transition(LifecycleState::Parsed, LifecycleState::Installing)
    }

    pub fn finish_install(&self) -> Result<()> {
        self.transition(LifecycleState::Installing, LifecycleState::Installed)
    }

    /// 不等待旧实例退出，安装完成后立即进入激活
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::Release);
    }

    pub fn is_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    pub fn begin_activate(&self) -> Result<()> {
        if !self.is_skip_waiting() {
            return Err(Error::Lifecycle(
                "activate requested while still waiting".to_string(),
            ));
        }
        self.transition(LifecycleState::Installed, LifecycleState::Activating)
    }

    pub fn finish_activate(&self) -> Result<()> {
        self.transition(LifecycleState::Activating, LifecycleState::Activated)
    }

    /// 接管所有已知页面，返回新接管的数量
    pub fn claim(&self) -> usize {
        let mut claimed = 0;
        for mut client in self.clients.iter_mut() {
            if !*client.value() {
                *client.value_mut() = true;
                claimed += 1;
            }
        }
        info!("Claimed {claimed} clients");
        claimed
    }

    /// 记录激活前打开的页面，返回该页面当前是否受控。
    ///
    /// 只有激活完成前的页面需要等待 `claim`，激活之后所有页面直接受控，
    /// 不再记录。
    pub fn register_client(&self, client_id: &str) -> bool {
        match self.state() {
            LifecycleState::Activated => true,
            LifecycleState::Redundant => false,
            _ => *self
                .clients
                .entry(client_id.to_string())
                .or_insert(false)
                .value(),
        }
    }

    /// 请求是否应交给拦截器处理
    pub fn controls(&self, client_id: Option<&str>) -> bool {
        match client_id {
            Some(id) => self.register_client(id),
            None => self.is_active(),
        }
    }

    pub fn clients(&self) -> Vec<(String, bool)> {
        self.clients
            .iter()
            .map(|client| (client.key().clone(), *client.value()))
            .collect()
    }

    pub fn retire(&self) {
        *self.state.write() = LifecycleState::Redundant;
        self.clients.clear();
    }
}
