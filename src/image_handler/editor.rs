//! # 编辑器状态机
//!
//! ## 设计思路
//!
//! 状态只有两种：`Closed` 与 `Editing { index, working }`。
//! 同一时刻最多一张图片处于编辑中；编辑期间其它图片的持久状态不受影响。
//!
//! - 打开：`working` 是持久状态的一份拷贝（不是引用），保证编辑可丢弃。
//! - 控件调整：旋转 ±90°（同时清零偏移）、翻转、缩放、拖拽平移。
//! - 拖拽增量以“显示像素”给出，先经逆翻转、逆旋转换到图像坐标系，
//!   再除以当前 render scale 换算为全分辨率单位后累加，与合成器“偏移只除以 zoom”的规则互为逆运算。
//!   这样无论是否翻转或旋转，画面都跟随指针移动。
//! - 取消：丢弃 `working`；重置：`working` 回到默认值但编辑器保持打开；
//!   应用：由 `ImageHandler` 在编码成功后调用 `close` 提交。

use serde::Deserialize;

use super::transform::TransformState;
use super::{ImageConfig, ImageError};

/// 编辑器控件消息。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorControl {
    RotateClockwise,
    RotateCounterClockwise,
    ToggleFlipHorizontal,
    ToggleFlipVertical,
    SetZoom { percent: f64 },
    /// 显示像素下的拖拽增量（屏幕坐标轴，向右/向下为正）；图像沿同一方向移动。
    Drag { dx: f64, dy: f64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorState {
    #[default]
    Closed,
    Editing {
        index: usize,
        working: TransformState,
    },
}

impl EditorState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }

    pub fn editing_index(&self) -> Option<usize> {
        match self {
            Self::Editing { index, .. } => Some(*index),
            Self::Closed => None,
        }
    }

    pub fn working(&self) -> Option<&TransformState> {
        match self {
            Self::Editing { working, .. } => Some(working),
            Self::Closed => None,
        }
    }

    /// `Closed → Editing`，以持久状态的拷贝作为工作状态。
    pub fn open(&mut self, index: usize, persisted: &TransformState) -> Result<(), ImageError> {
        if let Self::Editing { index: current, .. } = self {
            return Err(ImageError::Editor(format!(
                "第 {} 张图片正在编辑，请先应用或取消",
                current
            )));
        }

        *self = Self::Editing {
            index,
            working: *persisted,
        };
        log::debug!("✏️ 打开编辑器 - index={}", index);
        Ok(())
    }

    /// `Editing → Editing`：应用一次控件调整。
    pub fn apply_control(
        &mut self,
        control: EditorControl,
        render_scale: f64,
        config: &ImageConfig,
    ) -> Result<&TransformState, ImageError> {
        let Self::Editing { working, .. } = self else {
            return Err(ImageError::Editor("编辑器未打开".to_string()));
        };

        match control {
            EditorControl::RotateClockwise => {
                working.rotation = working.rotation.clockwise();
                working.offset_x = 0.0;
                working.offset_y = 0.0;
            }
            EditorControl::RotateCounterClockwise => {
                working.rotation = working.rotation.counter_clockwise();
                working.offset_x = 0.0;
                working.offset_y = 0.0;
            }
            EditorControl::ToggleFlipHorizontal => {
                working.flip_horizontal = !working.flip_horizontal;
            }
            EditorControl::ToggleFlipVertical => {
                working.flip_vertical = !working.flip_vertical;
            }
            EditorControl::SetZoom { percent } => {
                working.zoom_percent = config.clamp_zoom(percent)?;
            }
            EditorControl::Drag { dx, dy } => {
                if !render_scale.is_finite() || render_scale <= 0.0 {
                    return Err(ImageError::InvalidGeometry(format!(
                        "render scale 必须为正数：{}",
                        render_scale
                    )));
                }
                if !dx.is_finite() || !dy.is_finite() {
                    return Err(ImageError::InvalidGeometry(format!(
                        "拖拽增量无效：({}, {})",
                        dx, dy
                    )));
                }
                // 偏移位于翻转·旋转之内，增量需做逆变换
                let flipped_x = if working.flip_horizontal { -dx } else { dx };
                let flipped_y = if working.flip_vertical { -dy } else { dy };
                let (cos, sin) = working.rotation.cos_sin();
                let image_dx = flipped_x * cos + flipped_y * sin;
                let image_dy = -flipped_x * sin + flipped_y * cos;

                working.offset_x += image_dx / render_scale;
                working.offset_y += image_dy / render_scale;
            }
        }

        Ok(working)
    }

    /// 重置工作状态为默认值；编辑器保持打开。
    pub fn reset(&mut self) -> Result<&TransformState, ImageError> {
        let Self::Editing { working, .. } = self else {
            return Err(ImageError::Editor("编辑器未打开".to_string()));
        };
        *working = TransformState::default();
        Ok(working)
    }

    /// `Editing → Closed`：返回被关闭的索引与工作状态（取消时直接丢弃）。
    pub fn close(&mut self) -> Result<(usize, TransformState), ImageError> {
        match std::mem::take(self) {
            Self::Editing { index, working } => {
                log::debug!("✏️ 关闭编辑器 - index={}", index);
                Ok((index, working))
            }
            Self::Closed => Err(ImageError::Editor("编辑器未打开".to_string())),
        }
    }

    /// 图片被移除后保持索引对齐：移除的正是编辑中的图片则关闭，移除更靠前的图片则索引前移。
    pub fn on_removed(&mut self, removed: usize) {
        match self {
            Self::Editing { index, .. } if *index == removed => {
                log::debug!("✏️ 编辑中的图片被移除，编辑器关闭 - index={}", removed);
                *self = Self::Closed;
            }
            Self::Editing { index, .. } if *index > removed => {
                *index -= 1;
            }
            _ => {}
        }
    }
}
