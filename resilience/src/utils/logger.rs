use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志系统
///
/// 这里是上报器的"次级通道": 本地存储失败、远程提交失败等被吞掉的故障
/// 最终都落在这里,而不会展示给用户。
///
/// - JSON格式: 便于机器解析和日志分析
/// - 按天轮转: 文件命名 `coach-resilience.2025-10-05.log`
/// - 双输出: 控制台(人类可读) + 文件(JSON)
/// - 环境变量控制: RUST_LOG=debug 可调整日志级别
///
/// # 重要提示
/// 返回的guard必须被调用者保存,直到进程退出。
/// 如果guard被drop,文件写入器将被关闭。
pub fn init(log_dir: &Path) -> Result<WorkerGuard, io::Error> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("coach-resilience")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    // non_blocking: 避免日志I/O阻塞上报路径
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // 默认: INFO级别
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    // 控制台写到stderr,stdout留给命令输出
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{error, info, warn};

    #[test]
    fn test_logger_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let result = init(dir.path());
        assert!(result.is_ok());
        let _guard = result.unwrap();

        info!("日志系统测试: INFO级别");
        warn!("日志系统测试: WARN级别");
        error!(
            action = "uncaught_render_error",
            severity = "error",
            "结构化日志测试"
        );

        assert!(dir.path().exists());
    }
}
