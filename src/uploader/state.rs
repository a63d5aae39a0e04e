//! # 状态容器模块
//!
//! ## 设计思路
//!
//! 宿主框架的状态钩子被替换为显式的 `StateContainer`：
//! - `state()` 获取当前快照（列表 + 错误标志）
//! - `subscribe` / `subscribe_errors` 注册变更与错误监听
//!
//! 状态只通过 `commit` / `publish_errors` 整体写入，监听者拿到的永远是完整结果。

use std::fmt;

use serde::Serialize;

use super::source::{PublicItem, UploadItem, to_public_list};
use super::store::ItemStore;

/// 最近一次校验的错误标志，每次校验都会整体重算。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ErrorState {
    pub max_file_size: bool,
    pub max_number: bool,
    pub accept_type: bool,
    pub resolution: bool,
}

impl ErrorState {
    pub fn has_error(&self) -> bool {
        self.max_file_size || self.max_number || self.accept_type || self.resolution
    }
}

/// 当前状态快照。
#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub items: ItemStore,
    pub errors: ErrorState,
}

pub type ChangeListener = Box<dyn Fn(&[PublicItem]) + Send + Sync>;
pub type ErrorListener = Box<dyn Fn(&ErrorState, &[PublicItem]) + Send + Sync>;

/// 监听句柄，用于取消订阅。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// 显式状态容器。
#[derive(Default)]
pub struct StateContainer {
    state: UploadState,
    next_listener_id: u64,
    change_listeners: Vec<(ListenerId, ChangeListener)>,
    error_listeners: Vec<(ListenerId, ErrorListener)>,
}

impl fmt::Debug for StateContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateContainer")
            .field("state", &self.state)
            .field("change_listeners", &self.change_listeners.len())
            .field("error_listeners", &self.error_listeners.len())
            .finish()
    }
}

impl StateContainer {
    pub fn new(items: ItemStore) -> Self {
        Self {
            state: UploadState {
                items,
                errors: ErrorState::default(),
            },
            ..Self::default()
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// 注册列表变更监听。
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&[PublicItem]) + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        self.change_listeners.push((id, Box::new(listener)));
        id
    }

    /// 注册校验失败监听。
    pub fn subscribe_errors<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ErrorState, &[PublicItem]) + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        self.error_listeners.push((id, Box::new(listener)));
        id
    }

    /// 取消订阅，返回是否找到对应监听。
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.change_listeners.len() + self.error_listeners.len();
        self.change_listeners.retain(|(listener_id, _)| *listener_id != id);
        self.error_listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.change_listeners.len() + self.error_listeners.len()
    }

    /// 记录本次校验的错误标志（无论成败都会整体覆盖）。
    pub fn set_errors(&mut self, errors: ErrorState) {
        self.state.errors = errors;
    }

    /// 写入新列表并通知变更监听。
    pub fn commit(&mut self, items: ItemStore) {
        self.state.items = items;
        let public = self.state.items.to_public();
        for (_, listener) in &self.change_listeners {
            listener(&public);
        }
    }

    /// 通知错误监听：错误标志 + 出问题的批次。
    pub fn publish_errors(&self, errors: &ErrorState, batch: &[UploadItem]) {
        let public = to_public_list(batch);
        for (_, listener) in &self.error_listeners {
            listener(errors, &public);
        }
    }

    fn allocate_id(&mut self) -> ListenerId {
        self.next_listener_id += 1;
        ListenerId(self.next_listener_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn item(key: &str) -> UploadItem {
        UploadItem {
            key: key.to_string(),
            data_url: format!("data:image/png;base64,{}", key),
            file: None,
        }
    }

    #[test]
    fn error_state_defaults_to_ready() {
        let errors = ErrorState::default();
        assert!(!errors.has_error());
        assert!(ErrorState { resolution: true, ..errors }.has_error());
    }

    #[test]
    fn commit_notifies_change_listeners_with_public_list() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut container = StateContainer::new(ItemStore::new());

        let sink = Arc::clone(&seen);
        container.subscribe(move |items| {
            let urls: Vec<String> = items.iter().map(|item| item.data_url.clone()).collect();
            sink.lock().expect("lock").push(urls);
        });

        container.commit(ItemStore::from_items(vec![item("a"), item("b")]));

        let seen = seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ["data:image/png;base64,a", "data:image/png;base64,b"]);
        assert_eq!(container.state().items.len(), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let calls = Arc::new(Mutex::new(0_u32));
        let mut container = StateContainer::new(ItemStore::new());

        let sink = Arc::clone(&calls);
        let id = container.subscribe(move |_| *sink.lock().expect("lock") += 1);

        container.commit(ItemStore::new());
        assert!(container.unsubscribe(id));
        assert!(!container.unsubscribe(id));
        container.commit(ItemStore::new());

        assert_eq!(*calls.lock().expect("lock"), 1);
    }

    #[test]
    fn publish_errors_passes_flags_and_batch() {
        let seen = Arc::new(Mutex::new(None));
        let mut container = StateContainer::new(ItemStore::new());

        let sink = Arc::clone(&seen);
        container.subscribe_errors(move |errors, batch| {
            *sink.lock().expect("lock") = Some((*errors, batch.len()));
        });

        let errors = ErrorState {
            max_number: true,
            ..ErrorState::default()
        };
        container.publish_errors(&errors, &[item("a"), item("b"), item("c")]);

        assert_eq!(*seen.lock().expect("lock"), Some((errors, 3)));
    }
}
