//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `UploadCoordinator` 负责一次“选择文件”事件的完整链路：
//! 1. 编码（`Encoder`，批内并发）
//! 2. 校验（`ValidationPipeline`，逐文件顺序执行）
//! 3. 提交（`ItemStore` 纯函数生成新列表，整体写入 `StateContainer`）
//!
//! 并根据当前模式决定是追加还是替换：
//! - 追加模式：多选时整批追加（超过 `max_number` 则静默丢弃）；单选时第一个文件替换整个列表
//! - 替换模式：由 `trigger_replace(key)` 进入，只对接下来的一次选择生效，第一个文件替换目标条目，
//!   跳过数量检查
//!
//! ## 实现思路
//!
//! - 所有会改状态的操作都取 `&mut self`，借用规则保证两次选择不会交错执行，无需加锁。
//! - 进入 `handle_selection` 时先把模式取出并复位为追加，保证无论成功、校验失败、编码失败还是
//!   空选择，都只影响这一次。
//! - 记录 `ingest/validate/commit/total` 阶段耗时，便于性能诊断。

use std::sync::Arc;
use std::time::Instant;

use super::encoder::Encoder;
use super::picker::{FilePicker, PickerRequest};
use super::resolution::{ImageHeaderChecker, ResolutionChecker};
use super::source::{FileHandle, PublicItem, SeedItem, UploadItem};
use super::state::{ErrorState, ListenerId, StateContainer, UploadState};
use super::store::ItemStore;
use super::validation::{EditMode, ValidationPipeline, ValidationReport};
use super::{UploadConfig, UploadError};

/// 一次选择事件的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// 校验通过并已提交（追加超限时列表保持不变，同样视为已提交）。
    Committed,
    /// 校验未通过，列表保持不变。
    Rejected(ValidationReport),
    /// 用户没有选择任何文件。
    Empty,
    /// 编码失败，本次选择整体作废。
    EncodingFailed(UploadError),
}

/// 上传暂存协调器。
pub struct UploadCoordinator {
    encoder: Encoder,
    pipeline: ValidationPipeline,
    picker: Arc<dyn FilePicker>,
    container: StateContainer,
    mode: EditMode,
}

impl UploadCoordinator {
    /// 使用默认分辨率检查后端创建协调器。
    ///
    /// # 示例
    /// ```rust
    /// use std::sync::Arc;
    /// use image_uploading::uploader::{ScriptedPicker, SeedItem, UploadConfig, UploadCoordinator};
    ///
    /// let coordinator = UploadCoordinator::new(
    ///     UploadConfig::default(),
    ///     Arc::new(ScriptedPicker::new()),
    ///     vec![SeedItem::new("data:image/png;base64,AA==")],
    /// )?;
    /// assert_eq!(coordinator.current_list().len(), 1);
    /// # Ok::<(), image_uploading::uploader::UploadError>(())
    /// ```
    pub fn new(
        config: UploadConfig,
        picker: Arc<dyn FilePicker>,
        seed: Vec<SeedItem>,
    ) -> Result<Self, UploadError> {
        Self::with_resolution_checker(config, picker, Arc::new(ImageHeaderChecker), seed)
    }

    /// 注入自定义分辨率检查后端。
    pub fn with_resolution_checker(
        config: UploadConfig,
        picker: Arc<dyn FilePicker>,
        checker: Arc<dyn ResolutionChecker>,
        seed: Vec<SeedItem>,
    ) -> Result<Self, UploadError> {
        config.validate()?;

        let seeded = ItemStore::from_items(
            seed.into_iter()
                .map(|item| UploadItem {
                    key: item.data_url.clone(),
                    data_url: item.data_url,
                    file: item.file,
                })
                .collect(),
        );
        log::info!("⚙️ 上传协调器已创建 - 预置条目: {}", seeded.len());

        Ok(Self {
            encoder: Encoder::new(config.ingest_size_limit)
                .with_max_file_size(config.max_file_size),
            pipeline: ValidationPipeline::new(config, checker),
            picker,
            container: StateContainer::new(seeded),
            mode: EditMode::Append,
        })
    }

    pub fn config(&self) -> &UploadConfig {
        self.pipeline.config()
    }

    /// 当前状态快照。
    pub fn state(&self) -> &UploadState {
        self.container.state()
    }

    /// 对外发布形态的当前列表。
    pub fn current_list(&self) -> Vec<PublicItem> {
        self.container.state().items.to_public()
    }

    /// 当前列表中各条目的 key，供宿主做按 key 分发。
    pub fn current_keys(&self) -> Vec<String> {
        self.container
            .state()
            .items
            .keys()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn current_errors(&self) -> ErrorState {
        self.container.state().errors
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&[PublicItem]) + Send + Sync + 'static,
    {
        self.container.subscribe(listener)
    }

    pub fn subscribe_errors<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ErrorState, &[PublicItem]) + Send + Sync + 'static,
    {
        self.container.subscribe_errors(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.container.unsubscribe(id)
    }

    /// 下一次选择应发给宿主的请求：替换模式下强制单选。
    pub fn picker_request(&self) -> PickerRequest {
        let config = self.pipeline.config();
        PickerRequest {
            multiple: config.multiple && self.mode == EditMode::Append,
            accept: config.accept_string(),
        }
    }

    /// 以追加模式打开文件选择器并处理结果。
    pub async fn trigger_upload_for_new_item(&mut self) -> SelectionOutcome {
        self.mode = EditMode::Append;
        let handles = self.picker.pick(self.picker_request()).await;
        self.handle_selection(handles).await
    }

    /// 以替换模式打开文件选择器，选中的第一个文件将替换 `key` 对应条目。
    pub async fn trigger_replace(&mut self, key: &str) -> SelectionOutcome {
        self.begin_replace(key);
        let handles = self.picker.pick(self.picker_request()).await;
        self.handle_selection(handles).await
    }

    /// 仅进入替换模式，供自行驱动文件选择器的宿主使用。
    pub fn begin_replace(&mut self, key: &str) {
        log::debug!("✏️ 进入替换模式 - key: {}", key);
        self.mode = EditMode::Replace(key.to_string());
    }

    /// 处理一次选择完成事件。无论结果如何，结束后都回到追加模式。
    pub async fn handle_selection(&mut self, handles: Vec<FileHandle>) -> SelectionOutcome {
        let mode = std::mem::replace(&mut self.mode, EditMode::Append);

        if handles.is_empty() {
            log::info!("📭 未选择任何文件，保持列表不变");
            return SelectionOutcome::Empty;
        }

        let total_start = Instant::now();

        let ingest_start = Instant::now();
        let batch = match self.encoder.ingest(&handles).await {
            Ok(batch) => batch,
            Err(err) => {
                log::error!("❌ 批次编码失败，本次选择作废：{}", err);
                return SelectionOutcome::EncodingFailed(err);
            }
        };
        let ingest_elapsed = ingest_start.elapsed();

        let validate_start = Instant::now();
        let report = self
            .pipeline
            .validate(&batch, self.container.state().items.len(), &mode)
            .await;
        let validate_elapsed = validate_start.elapsed();

        self.container.set_errors(report.errors);
        if !report.ok {
            self.container.publish_errors(&report.errors, &batch);
            return SelectionOutcome::Rejected(report);
        }

        let commit_start = Instant::now();
        let next = self.apply(mode, batch);
        self.container.commit(next);
        let commit_elapsed = commit_start.elapsed();

        log::info!(
            "✅ 选择处理完成 - 列表长度: {} ingest={}ms validate={}ms commit={}ms total={}ms",
            self.container.state().items.len(),
            ingest_elapsed.as_millis(),
            validate_elapsed.as_millis(),
            commit_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        SelectionOutcome::Committed
    }

    /// 删除指定 key 的条目；key 不存在时列表不变。
    pub fn remove_by_key(&mut self, key: &str) {
        let next = self.container.state().items.remove_by_key(key);
        self.container.commit(next);
    }

    pub fn remove_all(&mut self) {
        let next = self.container.state().items.clear();
        self.container.commit(next);
    }

    /// 按模式把已通过校验的批次合入当前列表。
    fn apply(&self, mode: EditMode, batch: Vec<UploadItem>) -> ItemStore {
        let current = &self.container.state().items;
        let config = self.pipeline.config();

        match mode {
            EditMode::Replace(key) => {
                if !current.contains_key(&key) {
                    log::warn!("⚠️ 替换目标已不在列表中，列表保持不变 - key: {}", key);
                }
                match batch.into_iter().next() {
                    Some(first) => current.replace_by_key(&key, first),
                    None => current.clone(),
                }
            }
            EditMode::Append if config.multiple => {
                let appended = current.append(batch);
                match config.max_number {
                    Some(max) if appended.len() > max => {
                        log::warn!(
                            "⚠️ 追加后数量 {} 超过上限 {}，本次追加被丢弃",
                            appended.len(),
                            max
                        );
                        current.clone()
                    }
                    _ => appended,
                }
            }
            EditMode::Append => match batch.into_iter().next() {
                Some(first) => ItemStore::new().append(vec![first]),
                None => current.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::ScriptedPicker;
    use crate::uploader::resolution::tests::create_png_bytes;
    use std::sync::Mutex;

    fn png(name: &str) -> FileHandle {
        FileHandle::from_bytes(name, create_png_bytes(4, 4))
    }

    fn coordinator(config: UploadConfig, picker: Arc<ScriptedPicker>) -> UploadCoordinator {
        UploadCoordinator::new(config, picker, Vec::new()).expect("coordinator init failed")
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = UploadConfig::default();
        config.max_number = Some(0);

        let result = UploadCoordinator::new(config, Arc::new(ScriptedPicker::new()), Vec::new());
        assert!(matches!(result, Err(UploadError::InvalidConfig(_))));
    }

    #[test]
    fn seeds_use_data_url_as_key_and_drop_duplicates() {
        let seeds = vec![
            SeedItem::new("data:image/png;base64,AA=="),
            SeedItem::new("data:image/png;base64,AQ=="),
            SeedItem::new("data:image/png;base64,AA=="),
        ];
        let coordinator =
            UploadCoordinator::new(UploadConfig::default(), Arc::new(ScriptedPicker::new()), seeds)
                .expect("coordinator init failed");

        assert_eq!(
            coordinator.current_keys(),
            ["data:image/png;base64,AA==", "data:image/png;base64,AQ=="]
        );
    }

    #[tokio::test]
    async fn picker_request_reflects_mode_and_config() {
        let picker = Arc::new(ScriptedPicker::new());
        let mut config = UploadConfig::default();
        config.multiple = true;
        config.accept_type = vec!["png".to_string()];
        let mut coordinator = coordinator(config, picker.clone());

        coordinator.trigger_upload_for_new_item().await;
        coordinator.trigger_replace("missing").await;

        let requests = picker.requests();
        assert!(requests[0].multiple);
        assert!(!requests[1].multiple);
        assert_eq!(requests[1].accept, ".png");
        assert_eq!(coordinator.mode, EditMode::Append);
    }

    #[tokio::test]
    async fn single_select_replaces_whole_list_with_first_file() {
        let picker = Arc::new(ScriptedPicker::new());
        picker.push_selection(vec![png("a.png")]);
        picker.push_selection(vec![png("b.png"), png("c.png")]);
        let mut coordinator = coordinator(UploadConfig::default(), picker);

        assert_eq!(coordinator.trigger_upload_for_new_item().await, SelectionOutcome::Committed);
        assert_eq!(coordinator.trigger_upload_for_new_item().await, SelectionOutcome::Committed);

        let list = coordinator.current_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].file.as_ref().map(|f| f.name.as_str()), Some("b.png"));
    }

    #[tokio::test]
    async fn encoding_failure_leaves_list_and_resets_mode() {
        let picker = Arc::new(ScriptedPicker::new());
        picker.push_selection(vec![png("a.png")]);
        picker.push_selection(vec![FileHandle::from_path("/no/such/file.png")]);
        let mut coordinator = coordinator(UploadConfig::default(), picker);

        coordinator.trigger_upload_for_new_item().await;
        let key = coordinator.current_keys()[0].clone();

        let outcome = coordinator.trigger_replace(&key).await;
        assert!(matches!(outcome, SelectionOutcome::EncodingFailed(UploadError::EncodingFailure(_))));
        assert_eq!(coordinator.current_keys(), [key]);
        assert_eq!(coordinator.mode, EditMode::Append);
    }

    #[tokio::test]
    async fn listeners_see_commits_and_rejections() {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let failures = Arc::new(Mutex::new(Vec::new()));

        let picker = Arc::new(ScriptedPicker::new());
        picker.push_selection(vec![png("a.png")]);
        picker.push_selection(vec![FileHandle::from_bytes("a.txt", b"hi".to_vec())]);
        let mut coordinator = coordinator(UploadConfig::default(), picker);

        let sink = Arc::clone(&changes);
        coordinator.subscribe(move |items| sink.lock().expect("lock").push(items.len()));
        let sink = Arc::clone(&failures);
        coordinator.subscribe_errors(move |errors, batch| {
            sink.lock().expect("lock").push((*errors, batch.len()))
        });

        coordinator.trigger_upload_for_new_item().await;
        coordinator.trigger_upload_for_new_item().await;
        coordinator.remove_all();

        assert_eq!(*changes.lock().expect("lock"), [1, 0]);
        let failures = failures.lock().expect("lock");
        assert_eq!(failures.len(), 1);
        assert!(failures[0].0.accept_type);
        assert_eq!(failures[0].1, 1);
    }
}
