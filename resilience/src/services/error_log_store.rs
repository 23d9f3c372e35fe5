//! 错误日志本地队列
//!
//! 有界环形缓冲: 按插入顺序保存最近 [`MAX_LOG_ENTRIES`] 条记录,
//! 超出时先淘汰最旧的。只有追加和淘汰两种写法,从不修改已有记录。

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{ErrorLogEntry, Severity, StorageError};
use crate::services::local_storage::{LocalStorage, ERROR_LOG_KEY};

/// 本地队列容量
pub const MAX_LOG_ENTRIES: usize = 50;

/// 错误日志存储
///
/// 由 [`ErrorReporter`](crate::services::ErrorReporter) 独占持有,UI层只生产不读取。
/// 上报可能来自任意线程 (panic钩子、受保护任务、网络监视器),
/// 每次读-改-写都在 `lock` 内完成。
pub struct ErrorLogStore {
    storage: Arc<dyn LocalStorage>,
    capacity: usize,
    lock: Mutex<()>,
}

impl ErrorLogStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self::with_capacity(storage, MAX_LOG_ENTRIES)
    }

    pub fn with_capacity(storage: Arc<dyn LocalStorage>, capacity: usize) -> Self {
        Self {
            storage,
            capacity: capacity.max(1),
            lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 读取全部排队记录
    ///
    /// 逐条解码: 无法解码的记录被丢弃,缺少 `id` 的记录补发新id并写回,
    /// 保证后续按id删除时标识稳定。整体不是JSON数组时视为空队列。
    pub fn entries(&self) -> Result<Vec<ErrorLogEntry>, StorageError> {
        let _guard = self.guard()?;
        self.load()
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// 追加一条记录,必要时淘汰最旧的记录
    ///
    /// # 返回值
    /// 被淘汰的记录数
    pub fn append(&self, entry: ErrorLogEntry) -> Result<usize, StorageError> {
        let _guard = self.guard()?;
        let mut entries = self.load()?;
        entries.push(entry);

        let evicted = entries.len().saturating_sub(self.capacity);
        if evicted > 0 {
            entries.drain(..evicted);
            tracing::debug!(evicted, capacity = self.capacity, "错误日志已满,淘汰最旧记录");
        }

        self.write(&entries)?;
        Ok(evicted)
    }

    /// 按严重程度过滤 (>= min)
    pub fn entries_at_least(&self, min: Severity) -> Result<Vec<ErrorLogEntry>, StorageError> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.severity >= min)
            .collect())
    }

    /// 删除已成功提交的记录
    ///
    /// 提交期间新追加的记录保留在队列中。
    pub fn remove_submitted(&self, ids: &HashSet<Uuid>) -> Result<usize, StorageError> {
        let _guard = self.guard()?;
        let entries = self.load()?;
        let before = entries.len();
        let remaining: Vec<ErrorLogEntry> = entries
            .into_iter()
            .filter(|entry| !ids.contains(&entry.id))
            .collect();
        let removed = before - remaining.len();

        if remaining.is_empty() {
            self.storage.remove_item(ERROR_LOG_KEY)?;
        } else if removed > 0 {
            self.write(&remaining)?;
        }

        Ok(removed)
    }

    /// 清空队列
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.guard()?;
        self.storage.remove_item(ERROR_LOG_KEY)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.lock
            .lock()
            .map_err(|_| StorageError::Unavailable("错误日志锁已中毒".to_string()))
    }

    /// 调用方需持有 `lock`
    fn load(&self) -> Result<Vec<ErrorLogEntry>, StorageError> {
        let Some(raw) = self.storage.get_item(ERROR_LOG_KEY)? else {
            return Ok(Vec::new());
        };

        let items = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    key = ERROR_LOG_KEY,
                    error = %e,
                    "本地错误日志已损坏,按空队列处理"
                );
                return Ok(Vec::new());
            }
        };

        let total = items.len();
        let mut repaired = false;
        let mut entries = Vec::with_capacity(total);
        for item in items {
            let missing_id = item.get("id").is_none();
            match serde_json::from_value::<ErrorLogEntry>(item) {
                Ok(entry) => {
                    repaired |= missing_id;
                    entries.push(entry);
                }
                Err(e) => {
                    tracing::warn!(key = ERROR_LOG_KEY, error = %e, "丢弃无法解码的错误日志记录");
                }
            }
        }

        if repaired || entries.len() != total {
            tracing::debug!(
                kept = entries.len(),
                dropped = total - entries.len(),
                "错误日志已规整并写回"
            );
            self.write(&entries)?;
        }

        Ok(entries)
    }

    fn write(&self, entries: &[ErrorLogEntry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries)?;
        self.storage.set_item(ERROR_LOG_KEY, &raw)
    }
}
