//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载“加载 → 解码 → 合成 → 编码 → 编辑”链路中的所有错误来源，
//! 避免字符串拼接式错误处理。通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 所有错误都只影响当前这一张图片：批处理遇到错误时跳过该项并继续。

/// 图片处理统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("几何参数无效：{0}")]
    InvalidGeometry(String),

    #[error("编辑器状态错误：{0}")]
    Editor(String),

    #[error("索引越界：{index}（当前共 {len} 张）")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("后台任务失败：{0}")]
    Task(String),
}

impl ImageError {
    /// 稳定的错误码，供前端按分支处理。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_failed",
            Self::InvalidFormat(_) => "invalid_format",
            Self::Encode(_) => "encode_failed",
            Self::ResourceLimit(_) => "resource_limit",
            Self::InvalidGeometry(_) => "invalid_geometry",
            Self::Editor(_) => "editor_state",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::Task(_) => "task_failed",
        }
    }

    /// 出错所在的处理阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) | Self::ResourceLimit(_) => "load",
            Self::Decode(_) => "decode",
            Self::InvalidGeometry(_) => "render",
            Self::Encode(_) => "encode",
            Self::Editor(_) => "edit",
            Self::IndexOutOfRange { .. } | Self::Task(_) => "session",
        }
    }
}

impl From<ImageError> for String {
    fn from(error: ImageError) -> Self {
        error.to_string()
    }
}
