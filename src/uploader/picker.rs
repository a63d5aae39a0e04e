//! # 文件选择能力
//!
//! 核心只需要“请宿主弹出文件选择器”这一能力，具体对话框由宿主实现 `FilePicker`。
//! `ScriptedPicker` 按顺序返回预先排好的选择结果，供命令行入口与测试使用。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::source::FileHandle;

/// 发给宿主的选择请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRequest {
    /// 是否允许多选：仅在追加模式且开启多选时为 `true`。
    pub multiple: bool,
    /// 过滤串，如 `.png, .jpg` 或 `image/*`。
    pub accept: String,
}

/// 宿主提供的文件选择器。返回空列表表示用户取消。
#[async_trait]
pub trait FilePicker: Send + Sync {
    async fn pick(&self, request: PickerRequest) -> Vec<FileHandle>;
}

/// 按顺序回放预设选择结果的选择器。
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    selections: Mutex<VecDeque<Vec<FileHandle>>>,
    requests: Mutex<Vec<PickerRequest>>,
}

impl ScriptedPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一次选择结果；预设用完后 `pick` 返回空列表。
    pub fn push_selection(&self, handles: Vec<FileHandle>) {
        if let Ok(mut selections) = self.selections.lock() {
            selections.push_back(handles);
        }
    }

    /// 迄今收到的所有请求。
    pub fn requests(&self) -> Vec<PickerRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FilePicker for ScriptedPicker {
    async fn pick(&self, request: PickerRequest) -> Vec<FileHandle> {
        log::debug!(
            "🗂️ 文件选择请求 - multiple: {} accept: {}",
            request.multiple,
            request.accept
        );
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.selections
            .lock()
            .ok()
            .and_then(|mut selections| selections.pop_front())
            .unwrap_or_default()
    }
}
