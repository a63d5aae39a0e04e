//! # 图片上传暂存 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            宿主（渲染层 / 文件选择对话框）                 │
//! │                                                          │
//! │  FilePicker 实现 ── 变更监听 ── 错误监听 ── 视图          │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ trigger_upload_for_new_item / trigger_replace / remove_*
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  └─ uploader ─── UploadCoordinator                       │
//! │      ├─ encoder     并发编码 → data: URL                  │
//! │      ├─ validation  数量·类型·体积·扩展名·分辨率           │
//! │      ├─ store       有序 key 唯一列表                     │
//! │      └─ state       状态快照 + 订阅                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，命令行入口的返回类型 |
//! | [`uploader`] | 文件编码、约束校验、列表维护与追加 / 替换状态机 |

pub mod error;
pub mod uploader;
