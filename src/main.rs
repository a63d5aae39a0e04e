//! # 图片上传暂存 — 命令行入口
//!
//! 本文件只负责参数解析、日志初始化与结果输出。
//! 以命令行参数中的文件作为一次“选择文件”事件，走完整的编码 → 校验 → 提交链路，
//! 并以 JSON 输出最终列表与错误标志。业务逻辑详见 `lib.rs` 架构文档。

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use image_uploading::error::AppError;
use image_uploading::uploader::{
    FileHandle, ScriptedPicker, SelectionOutcome, UploadConfig, UploadCoordinator,
};
use serde::Serialize;

/// 把命令行给出的文件当作一次选择，走完编码、校验、提交并输出 JSON 结果
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "image-uploading")]
#[command(version, long_about = None)]
struct CliArgs {
    /// JSON 配置文件，缺省时使用默认配置
    #[arg(long, value_name = "配置.json")]
    config: Option<PathBuf>,

    /// 允许一次选择多个文件（覆盖配置中的 multiple）
    #[arg(long)]
    multiple: bool,

    /// 要暂存的文件
    #[arg(value_name = "文件")]
    files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ItemSummary {
    name: Option<String>,
    size: Option<u64>,
    mime_type: Option<String>,
    data_url_len: usize,
}

fn outcome_label(outcome: &SelectionOutcome) -> &'static str {
    match outcome {
        SelectionOutcome::Committed => "committed",
        SelectionOutcome::Rejected(_) => "rejected",
        SelectionOutcome::Empty => "empty",
        SelectionOutcome::EncodingFailed(_) => "encoding_failed",
    }
}

async fn run(args: CliArgs) -> Result<(), AppError> {
    let mut config = match &args.config {
        Some(path) => UploadConfig::load_from_path(path)?,
        None => UploadConfig::default(),
    };
    config.multiple |= args.multiple;

    let picker = Arc::new(ScriptedPicker::new());
    picker.push_selection(args.files.into_iter().map(FileHandle::from_path).collect());

    let mut coordinator = UploadCoordinator::new(config, picker, Vec::new())?;
    log::info!(
        "setup: coordinator ready (multiple={}, max_number={:?}, accept={})",
        coordinator.config().multiple,
        coordinator.config().max_number,
        coordinator.config().accept_string()
    );
    coordinator.subscribe_errors(|errors, batch| {
        log::warn!("校验未通过：{:?}（批次 {} 个文件）", errors, batch.len());
    });

    let outcome = coordinator.trigger_upload_for_new_item().await;

    let state = coordinator.state();
    if state.items.is_empty() {
        log::info!("📭 暂存列表为空");
    }
    let items: Vec<ItemSummary> = state
        .items
        .to_public()
        .into_iter()
        .map(|item| ItemSummary {
            name: item.file.as_ref().map(|file| file.name.clone()),
            size: item.file.as_ref().map(|file| file.size),
            mime_type: item.file.as_ref().map(|file| file.mime_type.clone()),
            data_url_len: item.data_url.len(),
        })
        .collect();

    let report = serde_json::json!({
        "outcome": outcome_label(&outcome),
        "errors": state.errors,
        "items": items,
    });
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::Serialize(e.to_string()))?;
    writeln!(std::io::stdout().lock(), "{}", rendered)?;

    if let SelectionOutcome::EncodingFailed(err) = outcome {
        return Err(err.into());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(args).await {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_files() {
        let parsed = CliArgs::try_parse_from([
            "image-uploading",
            "--multiple",
            "--config",
            "cfg.json",
            "a.png",
            "b.png",
        ])
        .expect("args should parse");

        assert_eq!(
            parsed,
            CliArgs {
                config: Some(PathBuf::from("cfg.json")),
                multiple: true,
                files: vec![PathBuf::from("a.png"), PathBuf::from("b.png")],
            }
        );
    }

    #[test]
    fn defaults_to_single_select_without_config() {
        let parsed =
            CliArgs::try_parse_from(["image-uploading", "a.png"]).expect("args should parse");

        assert_eq!(parsed.config, None);
        assert!(!parsed.multiple);
        assert_eq!(parsed.files, [PathBuf::from("a.png")]);
    }

    #[test]
    fn rejects_unknown_flag_and_missing_value() {
        assert!(CliArgs::try_parse_from(["image-uploading", "--bogus"]).is_err());
        assert!(CliArgs::try_parse_from(["image-uploading", "--config"]).is_err());
    }

    #[test]
    fn outcome_labels_are_stable() {
        assert_eq!(outcome_label(&SelectionOutcome::Empty), "empty");
        assert_eq!(outcome_label(&SelectionOutcome::Committed), "committed");
    }
}
