//! # Letterbox Studio — 库入口
//!
//! 将任意尺寸的图片放进固定宽高比的画布（不足部分以纯色边框填充），
//! 并提供逐张的交互编辑：旋转、翻转、缩放、拖拽平移。
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  前端 (任意 UI 层)                        │
//! │   上传 ── 全局设置 ── 编辑器弹窗 ── 图库 / 下载           │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ JSON 命令 (Result<CommandOutcome, AppError>)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ settings ─── 边框颜色 / 宽高比 / 输出格式             │
//! │  │                                                       │
//! │  └─ image_handler                                        │
//! │      ├─ service / commands   命令串行 + 参数适配          │
//! │      ├─ handler              会话：图库·编辑器·句柄        │
//! │      ├─ geometry / compositor 画布几何 + 逆映射合成        │
//! │      └─ codec / pipeline     解码·资源限制·代理图·编码    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有命令的返回错误 |
//! | [`settings`] | 全局设置及其 JSON 表示 |
//! | [`image_handler`] | 解码、合成、编码、编辑器与会话编排 |

pub mod error;
pub mod image_handler;
pub mod settings;

/// 初始化日志（默认 `info` 级别，可通过 `RUST_LOG` 覆盖）。
///
/// 重复调用是安全的：已初始化时直接忽略。
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
