//! # 上传暂存模块（uploader）
//!
//! ## 设计思路
//!
//! 该模块将“文件句柄 → 编码 → 校验 → 提交 → 通知”按职责拆分为多个子模块：
//!
//! - `coordinator`：编排一次选择事件的完整链路，管理追加 / 替换两种模式
//! - `encoder`：并发编码为 `data:` URL 并提取元数据，生成条目 key
//! - `validation`：按固定顺序执行数量 / 类型 / 体积 / 扩展名 / 分辨率检查
//! - `resolution`：分辨率判定后端（默认只读图片头）
//! - `store`：有序、key 唯一的纯函数式列表
//! - `state`：显式状态容器与变更 / 错误监听
//! - `picker`：宿主文件选择器能力
//! - `config/error/source`：配置、错误、数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 宿主调用 trigger_upload_for_new_item / trigger_replace(key)
//!    ↓
//! picker.rs（宿主弹出文件选择器）
//!    ↓
//! coordinator.rs（模式判定 + 阶段耗时日志）
//!    ├─ encoder.rs（并发编码，all-or-nothing）
//!    ├─ validation.rs（逐文件检查，首个失败即中止整批）
//!    │    └─ resolution.rs（读图片头比较宽高）
//!    └─ store.rs（生成新列表）
//!    ↓
//! state.rs（整体写入 + 通知监听）
//! ```

mod config;
mod coordinator;
mod encoder;
mod error;
mod picker;
mod resolution;
mod source;
mod state;
mod store;
mod validation;

pub use config::{
    DEFAULT_INGEST_SIZE_LIMIT, DEFAULT_MAX_NUMBER, ResolutionConstraint, ResolutionType,
    UploadConfig,
};
pub use coordinator::{SelectionOutcome, UploadCoordinator};
pub use encoder::{Encoder, KeyGenerator, decode_data_url, encode_data_url};
pub use error::UploadError;
pub use picker::{FilePicker, PickerRequest, ScriptedPicker};
pub use resolution::{ImageHeaderChecker, ResolutionChecker};
pub use source::{FileContent, FileHandle, FileInfo, PublicItem, SeedItem, UploadItem};
pub use state::{ChangeListener, ErrorListener, ErrorState, ListenerId, StateContainer, UploadState};
pub use store::ItemStore;
pub use validation::{EditMode, ValidationPipeline, ValidationReport};
