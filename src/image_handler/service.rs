//! # 服务层（可共享状态）
//!
//! ## 设计思路
//!
//! `ImageHandler` 需要 `&mut self`，适合单个所有者；UI 胶水层往往需要在多个事件回调之间共享会话。
//! `ImageService` 用 `tokio::sync::Mutex` 包装会话：
//! 1. 同一时刻只执行一条命令，批处理与重新渲染天然串行
//! 2. 锁跨越 `.await` 持有，渲染/编码等待期间其它命令排队
//! 3. 测试可创建独立实例，互不影响
//!
//! ## 实现思路
//!
//! 对外仅暴露少量稳定 API：
//! - `upload`：批量上传
//! - `execute`：执行一条 `Command`
//! - `set_performance_profile` / `get_performance_profile`：档位切换与查询

use tokio::sync::Mutex;

use super::commands::{self, Command, CommandOutcome, FailureItem, GalleryItem};
use super::{ImageConfig, ImageHandler, ImagePerformanceProfile, UploadedFile};
use crate::error::AppError;

pub struct ImageService {
    handler: Mutex<ImageHandler>,
}

impl ImageService {
    /// 使用默认配置创建服务。
    ///
    /// # 示例
    /// ```rust
    /// use letterbox_studio::image_handler::ImageService;
    ///
    /// let service = ImageService::new();
    /// # drop(service);
    /// ```
    pub fn new() -> Self {
        Self::with_config(ImageConfig::default())
    }

    pub fn with_config(config: ImageConfig) -> Self {
        Self::from_handler(ImageHandler::new(config))
    }

    /// 包装一个已构造好的会话（例如注入了自定义编解码器）。
    pub fn from_handler(handler: ImageHandler) -> Self {
        Self {
            handler: Mutex::new(handler),
        }
    }

    /// 批量上传并返回最新图库。
    pub async fn upload(&self, files: Vec<UploadedFile>) -> CommandOutcome {
        let mut handler = self.handler.lock().await;
        let report = handler.process_batch(files).await;
        let failures = report
            .failures
            .into_iter()
            .map(|failure| FailureItem {
                code: failure.error.code(),
                message: failure.error.to_string(),
                file_name: failure.file_name,
            })
            .collect();

        CommandOutcome::Gallery {
            items: commands::gallery(&handler),
            failures,
            summary: handler.summary(),
        }
    }

    /// 执行一条命令。
    pub async fn execute(&self, command: Command) -> Result<CommandOutcome, AppError> {
        let mut handler = self.handler.lock().await;
        commands::dispatch(&mut handler, command).await
    }

    /// 解析 JSON 命令并执行。
    pub async fn execute_json(&self, json: &str) -> Result<CommandOutcome, AppError> {
        let command = Command::from_json(json)?;
        self.execute(command).await
    }

    pub async fn gallery(&self) -> Vec<GalleryItem> {
        commands::gallery(&*self.handler.lock().await)
    }

    /// 按档位名切换性能档位。
    ///
    /// # 示例
    /// ```rust
    /// use letterbox_studio::image_handler::ImageService;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let service = ImageService::new();
    /// service.set_performance_profile("speed").await?;
    /// assert_eq!(service.get_performance_profile().await, "speed");
    /// # Ok::<(), letterbox_studio::error::AppError>(())
    /// # }).unwrap();
    /// ```
    pub async fn set_performance_profile(&self, profile: &str) -> Result<(), AppError> {
        let profile = ImagePerformanceProfile::from_str(profile)?;
        self.handler.lock().await.set_performance_profile(profile);
        Ok(())
    }

    /// 获取当前生效性能档位（字符串）。
    pub async fn get_performance_profile(&self) -> String {
        let profile = self.handler.lock().await.performance_profile();
        profile.as_str().to_string()
    }
}

impl Default for ImageService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::Arc;

    fn png_file(name: &str, width: u32, height: u32) -> UploadedFile {
        let img = RgbaImage::from_pixel(width, height, Rgba([20, 120, 220, 255]));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        UploadedFile::new(name, cursor.into_inner()).with_mime("image/png")
    }

    #[tokio::test]
    async fn service_set_and_get_profile_roundtrip() {
        let service = ImageService::new();

        for profile in ["quality", "balanced", "speed"] {
            service
                .set_performance_profile(profile)
                .await
                .expect("set profile should succeed");
            assert_eq!(service.get_performance_profile().await, profile);
        }
    }

    #[tokio::test]
    async fn service_rejects_invalid_profile() {
        let service = ImageService::new();
        let result = service.set_performance_profile("unknown-profile").await;
        assert!(matches!(result, Err(AppError::Image(_))));
        assert_eq!(service.get_performance_profile().await, "balanced");
    }

    #[tokio::test]
    async fn service_upload_and_json_commands() {
        let service = ImageService::new();
        let outcome = service
            .upload(vec![png_file("a.png", 10, 4), png_file("b.png", 4, 10)])
            .await;
        let CommandOutcome::Gallery { items, failures, .. } = outcome else {
            panic!("expected gallery outcome");
        };
        assert_eq!(items.len(), 2);
        assert!(failures.is_empty());

        service
            .execute_json(r#"{ "type": "removeImage", "index": 0 }"#)
            .await
            .expect("remove");
        let items = service.gallery().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].file_name, "b_1x1.png");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn service_concurrent_commands_are_serialized() {
        let service = Arc::new(ImageService::new());
        service
            .upload(vec![png_file("a.png", 16, 8), png_file("b.png", 8, 16)])
            .await;

        let mut tasks = Vec::new();
        for worker_id in 0..8usize {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move {
                let profiles = ["quality", "balanced", "speed"];
                for i in 0..20 {
                    let profile = profiles[(worker_id + i) % profiles.len()];
                    service
                        .set_performance_profile(profile)
                        .await
                        .expect("set profile should succeed");
                    let _ = service.gallery().await;
                }
            }));
        }

        for task in tasks {
            task.await.expect("worker task should not panic");
        }
        assert_eq!(service.gallery().await.len(), 2);
    }
}
