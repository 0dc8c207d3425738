//! # 命令层
//!
//! ## 设计思路
//!
//! 命令层只做 UI 消息的参数接收与结果返回，不承载业务逻辑。
//! 前端以 JSON 发送带 `type` 标签的 `Command`，`dispatch` 将其路由到 `ImageHandler`，
//! 结果统一转换为可序列化的 DTO，错误统一为 `AppError`（`{ code, stage, message }`）。

use serde::{Deserialize, Serialize};

use super::{
    EditorControl, ImageHandler, ImagePerformanceProfile, ProcessedResult, ResultHandle,
    TransformState,
};
use crate::error::AppError;
use crate::settings::GlobalSettings;

/// UI 发往会话的命令（批量上传走 `ImageHandler::process_batch`，字节数据不经 JSON）。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    OpenEditor { index: usize },
    UpdateEditorControl { control: EditorControl },
    CancelEdit,
    ResetEdit,
    ApplyEdit,
    RemoveImage { index: usize },
    ClearAll,
    UpdateSettings { settings: GlobalSettings },
    SetPerformanceProfile { profile: String },
}

impl Command {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json).map_err(|e| AppError::Command(format!("解析命令失败: {}", e)))
    }
}

/// 图库中一项的展示信息。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub index: usize,
    pub file_name: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub handle: ResultHandle,
    pub url: String,
}

impl GalleryItem {
    fn from_result(index: usize, result: &ProcessedResult) -> Self {
        Self {
            index,
            file_name: result.file_name(),
            mime_type: result.container.mime_type(),
            width: result.width,
            height: result.height,
            handle: result.handle,
            url: result.handle.to_string(),
        }
    }
}

/// 跳过项的展示信息。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureItem {
    pub file_name: String,
    pub code: &'static str,
    pub message: String,
}

/// 命令执行结果。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandOutcome {
    /// 编辑器状态变化后的工作状态。
    Editing {
        index: usize,
        working: TransformState,
        render_scale: f64,
    },
    /// 编辑器已关闭。
    EditorClosed,
    /// 当前图库（附带本次跳过的项）。
    Gallery {
        items: Vec<GalleryItem>,
        failures: Vec<FailureItem>,
        summary: String,
    },
    ProfileChanged { profile: &'static str },
}

/// 当前图库快照。
pub fn gallery(handler: &ImageHandler) -> Vec<GalleryItem> {
    handler
        .results()
        .enumerate()
        .map(|(index, result)| GalleryItem::from_result(index, result))
        .collect()
}

fn gallery_outcome(handler: &ImageHandler, failures: Vec<FailureItem>) -> CommandOutcome {
    CommandOutcome::Gallery {
        items: gallery(handler),
        failures,
        summary: handler.summary(),
    }
}

fn editing_outcome(handler: &ImageHandler) -> Result<CommandOutcome, AppError> {
    let render_scale = handler.preview_render_scale()?;
    match handler.editor().editing_index().zip(handler.editor().working()) {
        Some((index, working)) => Ok(CommandOutcome::Editing {
            index,
            working: *working,
            render_scale,
        }),
        None => Ok(CommandOutcome::EditorClosed),
    }
}

/// 执行一条命令。
pub async fn dispatch(
    handler: &mut ImageHandler,
    command: Command,
) -> Result<CommandOutcome, AppError> {
    log::debug!("📨 收到命令：{:?}", command);

    match command {
        Command::OpenEditor { index } => {
            handler.open_editor(index)?;
            editing_outcome(handler)
        }
        Command::UpdateEditorControl { control } => {
            handler.update_editor_control(control)?;
            editing_outcome(handler)
        }
        Command::ResetEdit => {
            handler.reset_edit()?;
            editing_outcome(handler)
        }
        Command::CancelEdit => {
            handler.cancel_edit()?;
            Ok(CommandOutcome::EditorClosed)
        }
        Command::ApplyEdit => {
            handler.apply_edit().await?;
            Ok(gallery_outcome(handler, Vec::new()))
        }
        Command::RemoveImage { index } => {
            handler.remove_image(index)?;
            Ok(gallery_outcome(handler, Vec::new()))
        }
        Command::ClearAll => {
            handler.clear_all();
            Ok(gallery_outcome(handler, Vec::new()))
        }
        Command::UpdateSettings { settings } => {
            let report = handler.update_settings(settings).await;
            let failures = report
                .failures
                .into_iter()
                .map(|failure| FailureItem {
                    code: failure.error.code(),
                    message: failure.error.to_string(),
                    file_name: failure.file_name,
                })
                .collect();
            Ok(gallery_outcome(handler, failures))
        }
        Command::SetPerformanceProfile { profile } => {
            let profile = ImagePerformanceProfile::from_str(&profile)?;
            handler.set_performance_profile(profile);
            Ok(CommandOutcome::ProfileChanged {
                profile: profile.as_str(),
            })
        }
    }
}
