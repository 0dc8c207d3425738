//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“上传校验 → 解码 → 画布几何 → 变换合成 → 编码导出 → 交互编辑”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `commands`：UI 命令的入参/出参适配（薄封装）
//! - `service`：承载可共享状态（`ImageService`）
//! - `handler`：会话与整条流水线的编排
//! - `pipeline`：解码、资源限制、预览代理图降采样
//! - `codec`：编解码 trait 与基于 `image` 的默认实现
//! - `geometry`：画布尺寸与预览 render scale（纯函数）
//! - `compositor`：逆映射合成（翻转 · 旋转 · 缩放 · 平移）
//! - `editor`：单图编辑器状态机
//! - `handles`：结果句柄的签发与释放
//! - `config/error/source/transform`：配置、错误、中间数据模型、变换状态
//!
//! ## 实现思路
//!
//! 对外仅暴露必要类型与函数，内部细节（`pipeline`）保持私有。
//! 几何与合成都是纯函数，可以脱离会话单独测试。
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! UI 消息 (JSON)
//!    ↓
//! commands.rs（参数适配）
//!    ↓
//! service.rs（互斥锁，命令串行）
//!    ↓
//! handler.rs（会话编排 + 阶段耗时日志）
//!    ├─ codec.rs / pipeline.rs（解码 + 资源限制 + 代理图）
//!    ├─ geometry.rs（画布尺寸）
//!    ├─ compositor.rs（合成）
//!    ├─ codec.rs（编码）
//!    ├─ editor.rs（编辑器状态）
//!    └─ handles.rs（句柄签发 / 释放）
//!    ↓
//! 返回 AppError / CommandOutcome 给前端
//! ```
//!
//! ## 分层职责建议
//!
//! - 调用入口变更（命令名/参数）优先改 `commands.rs`
//! - 配置与策略变更优先改 `config.rs`
//! - 业务流程顺序变更优先改 `handler.rs`
//! - 画面错位问题优先看 `geometry.rs` 与 `compositor.rs`
//!
//! # 示例
//! ```rust
//! use letterbox_studio::image_handler::{resolve_canvas, CanvasSize, Rotation};
//!
//! let canvas = resolve_canvas(800, 600, Rotation::Deg90, (1, 1));
//! assert_eq!(canvas, CanvasSize::new(800, 800));
//! ```

pub mod codec;
pub mod commands;
pub mod compositor;
mod config;
pub mod editor;
mod error;
pub mod geometry;
mod handler;
pub mod handles;
mod pipeline;
mod service;
mod source;
pub mod transform;

pub use codec::{ContainerType, DecodedImage, ImageCrateCodec, ImageDecoder, RasterEncoder};
pub use commands::{dispatch, Command, CommandOutcome, FailureItem, GalleryItem};
pub use compositor::{render, RenderTarget, SourceView};
pub use config::{ImageConfig, ImagePerformanceProfile};
pub use editor::{EditorControl, EditorState};
pub use error::ImageError;
pub use geometry::{preview_render_scale, resolve_canvas, CanvasSize};
pub use handler::{BatchFailure, BatchReport, GalleryEntry, ImageHandler};
pub use handles::{HandleRegistry, ResultHandle};
pub use service::ImageService;
pub use source::{OutputName, ProcessedResult, SourceImage, UploadedFile};
pub use transform::{Rotation, TransformState};
