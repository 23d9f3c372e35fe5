//! 错误日志命令
//!
//! 提供上报、补交和查看本地队列的入口,全部经由 ErrorReporter。

use crate::models::{ErrorContext, Severity};
use crate::services::FlushOutcome;
use crate::state::AppState;

/// 上报一条错误
pub async fn report_error(
    state: &AppState,
    message: String,
    severity: Severity,
    component: Option<String>,
    action: Option<String>,
) -> Result<(), String> {
    let mut context = ErrorContext::new();
    context.component = component;
    context.action = action;

    let handle = state.reporter.report(message, severity, context);

    // 命令行进程很快退出,等待单条提交完成以免被丢弃
    if let Some(submission) = handle.submission {
        let _ = submission.await;
    }

    println!(
        "{} [{}] {}{}",
        handle.entry.id,
        handle.entry.severity,
        handle.entry.message,
        if handle.persisted { "" } else { " (not persisted)" }
    );
    Ok(())
}

/// 批量提交本地队列
///
/// 调用方负责确认网络可用: 离线时直接返回,不发请求。
pub async fn flush_errors(state: &AppState) -> Result<(), String> {
    if !state.connectivity.is_online() {
        println!("Backend unreachable, queue kept for the next reconnect");
        return Ok(());
    }

    match state.reporter.submit_queued().await {
        Ok(FlushOutcome::Empty) => println!("Queue is empty"),
        Ok(FlushOutcome::Submitted(count)) => println!("Submitted {} queued error(s)", count),
        Ok(FlushOutcome::InProgress) => println!("A flush is already in progress"),
        Err(e) => return Err(e.to_string()),
    }
    Ok(())
}

/// 列出本地队列
pub fn list_errors(state: &AppState, min_severity: Option<Severity>) -> Result<(), String> {
    let entries = match min_severity {
        Some(min) => state.reporter.queued_at_least(min),
        None => state.reporter.queued(),
    }
    .map_err(|e| e.to_string())?;

    if entries.is_empty() {
        println!("No queued errors");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {:<8} {}{}",
            entry.timestamp,
            entry.severity,
            entry.message,
            entry
                .context
                .action
                .as_deref()
                .map(|action| format!("  ({})", action))
                .unwrap_or_default()
        );
    }
    Ok(())
}
