//! 本地持久化存储
//!
//! 键值均为字符串,语义与浏览器的 localStorage 一致。
//! 内部的Mutex保证单个键的读写互斥,跨多次调用的读-改-写由调用方自行加锁。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::models::StorageError;

/// 错误日志队列
pub const ERROR_LOG_KEY: &str = "app_error_log";
/// 认证标记,值为字面量 "true" / "false"
pub const AUTH_FLAG_KEY: &str = "isAuthenticated";
/// 错误边界记录的故障路由
pub const ERROR_LOCATION_KEY: &str = "error_location";
/// 缓存的用户资料
pub const USER_PROFILE_KEY: &str = "user_profile";

/// 本地存储接口
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// 文件存储
///
/// 所有键保存在同一个JSON对象文件中,每次写入通过临时文件+重命名原子替换。
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// 在数据目录下打开 `local_storage.json`
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join("local_storage.json");

        tracing::debug!(path = %path.display(), "本地存储已打开");
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(items) => Ok(items),
                Err(e) => {
                    // 损坏的文件移到旁边保留,之后从空表重新开始
                    let backup = self.path.with_extension("json.corrupt");
                    tracing::warn!(
                        path = %self.path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "本地存储文件已损坏,按空存储处理"
                    );
                    if let Err(e) = fs::rename(&self.path, &backup) {
                        tracing::warn!(error = %e, "备份损坏的本地存储文件失败");
                    }
                    Ok(BTreeMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string(items)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, StorageError> {
        self.lock
            .lock()
            .map_err(|_| StorageError::Unavailable("存储锁已中毒".to_string()))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard()?;
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.guard()?;
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.guard()?;
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// 内存存储
///
/// 用于测试与无数据目录的场景,带故障开关以模拟存储不可用。
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
    should_fail: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置失败模式 (模拟存储不可用)
    pub fn set_fail_mode(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("模拟的存储故障".to_string()));
        }
        Ok(())
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.items
            .lock()
            .map_err(|_| StorageError::Unavailable("存储锁已中毒".to_string()))
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items()?.remove(key);
        Ok(())
    }
}
