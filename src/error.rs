//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 引擎内部使用 `ImageError`；面向 UI 胶水层的入口（设置解析、命令分发）统一返回 `AppError`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 输出结构化的 `{ code, stage, message }`，前端可按 code 分支处理。

use serde::ser::SerializeStruct;
use serde::Serialize;

use crate::image_handler::ImageError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片处理流水线错误（解码 / 合成 / 编码 / 编辑）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 全局设置无效
    #[error("设置无效: {0}")]
    Settings(String),

    /// 命令无法解析或不适用
    #[error("命令无效: {0}")]
    Command(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Image(err) => err.code(),
            Self::Settings(_) => "invalid_settings",
            Self::Command(_) => "invalid_command",
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::Image(err) => err.stage(),
            Self::Settings(_) => "settings",
            Self::Command(_) => "command",
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AppError", 3)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("stage", self.stage())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
