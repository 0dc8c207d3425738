//! # 核心编排模块（会话）
//!
//! ## 设计思路
//!
//! `ImageHandler` 是唯一的会话对象：持有图库、全局设置、编辑器状态与句柄表，
//! 所有操作都通过 `&mut self` 进行，没有全局可变状态。
//!
//! 图库使用单一集合 `Vec<GalleryEntry>`，原图、变换状态与导出结果成对存放，索引天然对齐。
//!
//! ## 实现思路
//!
//! - 批量上传严格顺序执行：一张图片完整处理（解码 → 渲染 → 编码）后才开始下一张。
//! - 解码与编码通过 `spawn_blocking` 交给外部编解码器并等待结果，等待期间不做其它工作。
//! - 单张失败只跳过该项，记录日志后继续；不产生部分结果。
//! - 渲染前按解码上限校验输出画布尺寸，细长图加边框后不会撑爆内存。
//! - 结果被替换时先释放旧句柄、再签发新句柄；移除/清空时释放全部句柄。
//! - 记录 `decode/render/encode/total` 阶段耗时，便于性能诊断。

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use image::RgbaImage;

use super::codec::{ContainerType, ImageCrateCodec, ImageDecoder, RasterEncoder};
use super::compositor::{self, RenderTarget, SourceView};
use super::editor::{EditorControl, EditorState};
use super::geometry::{self, CanvasSize};
use super::handles::HandleRegistry;
use super::pipeline;
use super::source::{OutputName, ProcessedResult, SourceImage, UploadedFile};
use super::transform::TransformState;
use super::{ImageConfig, ImageError, ImagePerformanceProfile};
use crate::settings::GlobalSettings;

/// 图库中的一项：原图、持久变换状态与当前导出结果。
#[derive(Debug)]
pub struct GalleryEntry {
    pub source: SourceImage,
    pub transform: TransformState,
    pub result: ProcessedResult,
}

/// 批处理中被跳过的一项。
#[derive(Debug)]
pub struct BatchFailure {
    pub file_name: String,
    pub error: ImageError,
}

/// 批处理 / 重新渲染报告。
#[derive(Debug, Default)]
pub struct BatchReport {
    /// 成功产出的结果（按输入顺序）。
    pub processed: Vec<ProcessedResult>,
    pub failures: Vec<BatchFailure>,
}

/// 编码完成、尚未签发句柄的输出。
struct EncodedOutput {
    bytes: Vec<u8>,
    container: ContainerType,
    size: CanvasSize,
}

/// 图片会话。
pub struct ImageHandler {
    config: ImageConfig,
    settings: GlobalSettings,
    decoder: Arc<dyn ImageDecoder>,
    encoder: Arc<dyn RasterEncoder>,
    entries: Vec<GalleryEntry>,
    editor: EditorState,
    handles: HandleRegistry,
}

impl ImageHandler {
    /// 使用默认 `image` 编解码器创建会话。
    ///
    /// # 示例
    /// ```rust
    /// use letterbox_studio::image_handler::{ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default());
    /// assert!(handler.is_empty());
    /// ```
    pub fn new(config: ImageConfig) -> Self {
        Self::with_codecs(config, Arc::new(ImageCrateCodec), Arc::new(ImageCrateCodec))
    }

    /// 注入自定义编解码器（测试或其它平台实现）。
    pub fn with_codecs(
        config: ImageConfig,
        decoder: Arc<dyn ImageDecoder>,
        encoder: Arc<dyn RasterEncoder>,
    ) -> Self {
        Self {
            config,
            settings: GlobalSettings::default(),
            decoder,
            encoder,
            entries: Vec::new(),
            editor: EditorState::Closed,
            handles: HandleRegistry::new(),
        }
    }

    /// 以指定全局设置起步（不触发渲染，图库为空）。
    pub fn with_settings(mut self, settings: GlobalSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Result<&GalleryEntry, ImageError> {
        self.entries.get(index).ok_or(ImageError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    pub fn results(&self) -> impl Iterator<Item = &ProcessedResult> {
        self.entries.iter().map(|entry| &entry.result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 当前仍未释放的句柄数量；正常情况下等于图库长度。
    pub fn active_handle_count(&self) -> usize {
        self.handles.active_count()
    }

    /// 图库状态文案，例如 `3 images ready`。
    pub fn summary(&self) -> String {
        match self.entries.len() {
            0 => String::new(),
            1 => "1 image ready".to_string(),
            n => format!("{} images ready", n),
        }
    }

    /// 按图库顺序给出 `(文件名, 字节)`，供“全部下载”使用。
    pub fn downloads(&self) -> Vec<(String, Bytes)> {
        self.results()
            .map(|result| (result.file_name(), result.raster.clone()))
            .collect()
    }

    /// 切换性能档位；只影响交互预览与之后上传图片的代理图。
    pub fn set_performance_profile(&mut self, profile: ImagePerformanceProfile) {
        self.config.apply_performance_profile(profile);
        log::info!(
            "⚙️ 已切换图片性能档位：{:?}（preview_max={}, proxy_max={}, filter={:?}）",
            profile,
            self.config.preview_max_dimension,
            self.config.proxy_max_dimension,
            self.config.resize_filter
        );
    }

    pub fn performance_profile(&self) -> ImagePerformanceProfile {
        self.config.infer_performance_profile()
    }

    // ------------------------------------------------------------------
    // 批量上传
    // ------------------------------------------------------------------

    /// 顺序处理一批上传文件；失败项跳过，其余继续。
    pub async fn process_batch(&mut self, files: Vec<UploadedFile>) -> BatchReport {
        let mut report = BatchReport::default();
        let batch_start = Instant::now();
        let total = files.len();

        for file in files {
            let file_name = file.name.clone();
            match self.process_file(file).await {
                Ok(index) => report.processed.push(self.entries[index].result.clone()),
                Err(error) => {
                    log::warn!("⚠️ 跳过图片 {}：{}", file_name, error);
                    report.failures.push(BatchFailure { file_name, error });
                }
            }
        }

        log::info!(
            "✅ 批处理完成 - 成功 {} / 共 {}，耗时 {}ms",
            report.processed.len(),
            total,
            batch_start.elapsed().as_millis()
        );

        report
    }

    /// 处理单个文件并追加到图库，返回新索引。
    async fn process_file(&mut self, file: UploadedFile) -> Result<usize, ImageError> {
        let total_start = Instant::now();

        let decode_start = Instant::now();
        let source = self.decode_file(file).await?;
        let decode_elapsed = decode_start.elapsed();

        let transform = TransformState::default();
        let encoded = self.render_and_encode(&source, &transform).await?;

        let result = self.issue_result(&source, encoded);
        log::info!(
            "✅ 图片处理完成 - {} -> {} ({}x{}) decode={}ms total={}ms",
            source.file_name,
            result.file_name(),
            result.width,
            result.height,
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        self.entries.push(GalleryEntry {
            source,
            transform,
            result,
        });
        Ok(self.entries.len() - 1)
    }

    async fn decode_file(&self, file: UploadedFile) -> Result<SourceImage, ImageError> {
        let mime = file.effective_mime();
        let is_image = mime.as_deref().is_some_and(|m| m.starts_with("image/"));
        if !is_image && !self.config.accept_non_image_mime {
            return Err(ImageError::InvalidFormat(format!(
                "不是图片文件：{}（{}）",
                file.name,
                mime.as_deref().unwrap_or("未知类型")
            )));
        }

        let decoder = Arc::clone(&self.decoder);
        let config = self.config.clone();
        let bytes = file.bytes.clone();
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&bytes, &config))
            .await
            .map_err(|e| ImageError::Task(format!("解码任务异常：{}", e)))??;

        Ok(SourceImage::new(
            file.name,
            decoded.mime_hint,
            decoded.pixels,
            decoded.preview_pixels,
        ))
    }

    // ------------------------------------------------------------------
    // 渲染
    // ------------------------------------------------------------------

    /// 全分辨率渲染目标（旋转感知）。
    fn export_target(&self, source: &SourceImage, state: &TransformState) -> RenderTarget {
        let size = geometry::resolve_canvas(
            source.width,
            source.height,
            state.rotation,
            self.settings.aspect_ratio.ratio(),
        );
        RenderTarget::new(size, self.settings.border_color.0)
    }

    /// 全分辨率渲染 + 编码（编码阶段交给外部编码器并等待）。
    async fn render_and_encode(
        &self,
        source: &SourceImage,
        state: &TransformState,
    ) -> Result<EncodedOutput, ImageError> {
        let target = self.export_target(source, state);
        pipeline::validate_canvas_limits(&self.config, target.size.width, target.size.height)?;

        let render_start = Instant::now();
        let raster = compositor::render(&target, SourceView::full(source), state, 1.0);
        let render_elapsed = render_start.elapsed();

        let container = self.settings.output_format.resolve(&source.mime_hint);
        let quality = if container.is_lossy() {
            self.config.jpeg_quality
        } else {
            100
        };

        let encode_start = Instant::now();
        let encoder = Arc::clone(&self.encoder);
        let bytes = tokio::task::spawn_blocking(move || encoder.encode(&raster, container, quality))
            .await
            .map_err(|e| ImageError::Task(format!("编码任务异常：{}", e)))??;

        log::debug!(
            "🖼️ 渲染 {}x{} render={}ms encode={}ms 格式={:?}",
            target.size.width,
            target.size.height,
            render_elapsed.as_millis(),
            encode_start.elapsed().as_millis(),
            container
        );

        Ok(EncodedOutput {
            bytes,
            container,
            size: target.size,
        })
    }

    fn output_name(&self, source: &SourceImage, container: ContainerType) -> OutputName {
        OutputName {
            base_name: source.base_name().to_string(),
            ratio_label: self.settings.aspect_ratio.label(),
            extension: container.extension().to_string(),
        }
    }

    fn issue_result(&mut self, source: &SourceImage, encoded: EncodedOutput) -> ProcessedResult {
        let name = self.output_name(source, encoded.container);
        ProcessedResult {
            name,
            container: encoded.container,
            width: encoded.size.width,
            height: encoded.size.height,
            raster: Bytes::from(encoded.bytes),
            handle: self.handles.issue(),
        }
    }

    /// 用新输出替换第 `index` 项的结果：先释放旧句柄，再签发新句柄。
    fn supersede(&mut self, index: usize, encoded: EncodedOutput) {
        let old_handle = self.entries[index].result.handle;
        self.handles.release(old_handle);

        let source = self.entries[index].source.clone();
        let result = self.issue_result(&source, encoded);
        self.entries[index].result = result;
    }

    /// 交互预览的 render scale（随工作状态的旋转而变化）。
    pub fn preview_render_scale(&self) -> Result<f64, ImageError> {
        let (index, working) = self.editing()?;
        let source = &self.entries[index].source;
        let canvas = self.export_target(source, &working).size;
        Ok(geometry::preview_render_scale(
            canvas,
            self.config.preview_max_dimension,
        ))
    }

    /// 以预览保真度渲染当前工作状态。
    pub fn preview(&self) -> Result<RgbaImage, ImageError> {
        let (index, working) = self.editing()?;
        let source = &self.entries[index].source;
        let render_scale = self.preview_render_scale()?;
        let target = self.export_target(source, &working).scaled(render_scale);
        Ok(compositor::render(
            &target,
            SourceView::preview(source),
            &working,
            render_scale,
        ))
    }

    // ------------------------------------------------------------------
    // 编辑器
    // ------------------------------------------------------------------

    fn editing(&self) -> Result<(usize, TransformState), ImageError> {
        match &self.editor {
            EditorState::Editing { index, working } => Ok((*index, *working)),
            EditorState::Closed => Err(ImageError::Editor("编辑器未打开".to_string())),
        }
    }

    pub fn open_editor(&mut self, index: usize) -> Result<TransformState, ImageError> {
        let persisted = self.entry(index)?.transform;
        self.editor.open(index, &persisted)?;
        Ok(persisted)
    }

    pub fn update_editor_control(
        &mut self,
        control: EditorControl,
    ) -> Result<TransformState, ImageError> {
        // 拖拽增量对应的是调整发生时所见的预览
        let render_scale = self.preview_render_scale()?;
        self.editor
            .apply_control(control, render_scale, &self.config)
            .copied()
    }

    /// 丢弃工作状态，持久状态不变。
    pub fn cancel_edit(&mut self) -> Result<(), ImageError> {
        let (index, _) = self.editor.close()?;
        log::debug!("✏️ 取消编辑 - index={}", index);
        Ok(())
    }

    /// 工作状态恢复默认值，编辑器保持打开。
    pub fn reset_edit(&mut self) -> Result<TransformState, ImageError> {
        self.editor.reset().copied()
    }

    /// 提交工作状态并重新全分辨率渲染。
    ///
    /// 编码成功后才写入持久状态并关闭编辑器；失败时编辑器保持打开。
    pub async fn apply_edit(&mut self) -> Result<&ProcessedResult, ImageError> {
        let (index, working) = self.editing()?;
        let encoded = self
            .render_and_encode(&self.entries[index].source, &working)
            .await?;

        self.editor.close()?;
        self.entries[index].transform = working;
        self.supersede(index, encoded);

        log::info!(
            "✅ 已应用编辑 - index={} 输出 {}",
            index,
            self.entries[index].result.file_name()
        );
        Ok(&self.entries[index].result)
    }

    // ------------------------------------------------------------------
    // 移除 / 清空 / 设置
    // ------------------------------------------------------------------

    pub fn remove_image(&mut self, index: usize) -> Result<(), ImageError> {
        self.entry(index)?;
        let entry = self.entries.remove(index);
        self.handles.release(entry.result.handle);
        self.editor.on_removed(index);
        log::info!("🗑️ 已移除图片 {}", entry.source.file_name);
        Ok(())
    }

    pub fn clear_all(&mut self) {
        for entry in self.entries.drain(..) {
            self.handles.release(entry.result.handle);
        }
        self.editor = EditorState::Closed;
        log::info!("🗑️ 已清空图库");
    }

    /// 更新全局设置；有变化时按图库顺序逐张重新渲染后才返回。
    ///
    /// 单张重新渲染失败时保留其旧结果并记入报告。
    pub async fn update_settings(&mut self, settings: GlobalSettings) -> BatchReport {
        let mut report = BatchReport::default();
        if settings == self.settings {
            return report;
        }
        self.settings = settings;

        let start = Instant::now();
        for index in 0..self.entries.len() {
            let transform = self.entries[index].transform;
            match self
                .render_and_encode(&self.entries[index].source, &transform)
                .await
            {
                Ok(encoded) => {
                    self.supersede(index, encoded);
                    report.processed.push(self.entries[index].result.clone());
                }
                Err(error) => {
                    let file_name = self.entries[index].source.file_name.clone();
                    log::warn!("⚠️ 重新渲染失败，保留旧结果 {}：{}", file_name, error);
                    report.failures.push(BatchFailure { file_name, error });
                }
            }
        }

        log::info!(
            "⚙️ 全局设置已更新，重新渲染 {} 张，耗时 {}ms",
            report.processed.len(),
            start.elapsed().as_millis()
        );
        report
    }
}
