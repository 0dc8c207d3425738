//! # 临时展示句柄
//!
//! 每个 `ProcessedResult` 持有一个句柄（类似浏览器里的 object URL）。
//! 句柄必须恰好释放一次：结果被替换时先释放旧句柄再签发新句柄，移除/清空时全部释放。
//! 忘记释放属于资源泄漏，`active_count()` 供测试核对。

use std::collections::HashSet;
use std::fmt;

/// 结果展示句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct ResultHandle(u64);

impl ResultHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:letterbox/{}", self.0)
    }
}

/// 句柄签发与回收表。
#[derive(Debug, Default)]
pub struct HandleRegistry {
    next_id: u64,
    active: HashSet<u64>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> ResultHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.active.insert(id);
        log::debug!("🔗 签发句柄 blob:letterbox/{}", id);
        ResultHandle(id)
    }

    /// 释放句柄；重复释放返回 `false` 并记录警告。
    pub fn release(&mut self, handle: ResultHandle) -> bool {
        if self.active.remove(&handle.0) {
            log::debug!("🧹 释放句柄 {}", handle);
            true
        } else {
            log::warn!("⚠️ 句柄重复释放或不存在：{}", handle);
            false
        }
    }

    pub fn is_active(&self, handle: ResultHandle) -> bool {
        self.active.contains(&handle.0)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
