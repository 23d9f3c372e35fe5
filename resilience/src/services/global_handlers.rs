//! 全局故障处理
//!
//! 边界之外的故障 (全局运行时错误、未处理的异步失败、未处理的网络失败)
//! 都汇入同一个 [`ErrorReporter`],记录后继续默认处理,应用不会因此崩溃。

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle};

use crate::models::{ErrorContext, Severity};
use crate::services::error_reporter::{ErrorInput, ErrorReporter};

pub const GLOBAL_ERROR_ACTION: &str = "global_error";
pub const UNHANDLED_REJECTION_ACTION: &str = "unhandled_rejection";
pub const NETWORK_FAILURE_ACTION: &str = "network_request";

thread_local! {
    static BOUNDARY_DEPTH: Cell<usize> = const { Cell::new(0) };
    static CAPTURED_STACK: RefCell<Option<String>> = const { RefCell::new(None) };
}

tokio::task_local! {
    static GUARDED_TASK: &'static str;
}

/// 错误边界渲染期间的作用域标记
///
/// 作用域内的panic交给边界处理,全局钩子只负责捕获堆栈。
pub(crate) struct BoundaryScope {
    _private: (),
}

impl BoundaryScope {
    pub(crate) fn enter() -> Self {
        BOUNDARY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        CAPTURED_STACK.with(|stack| stack.borrow_mut().take());
        Self { _private: () }
    }

    /// 取出钩子在本作用域内捕获的堆栈
    pub(crate) fn take_captured_stack(&self) -> Option<String> {
        CAPTURED_STACK.with(|stack| stack.borrow_mut().take())
    }
}

impl Drop for BoundaryScope {
    fn drop(&mut self) {
        BOUNDARY_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn in_boundary() -> bool {
    BOUNDARY_DEPTH.with(|depth| depth.get() > 0)
}

fn in_guarded_task() -> bool {
    GUARDED_TASK.try_with(|_| ()).is_ok()
}

/// 提取panic负载中的消息
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 安装全局panic钩子
///
/// - 边界内的panic: 只捕获堆栈,由边界上报并渲染回退界面
/// - 受保护任务内的panic: 交给 [`spawn_guarded`] 上报,避免重复
/// - 其余panic: 以 `critical` 上报,然后交给原有钩子继续默认处理
pub fn install_panic_hook(reporter: Arc<ErrorReporter>) {
    let previous = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        if in_boundary() {
            let stack = Backtrace::force_capture().to_string();
            CAPTURED_STACK.with(|captured| *captured.borrow_mut() = Some(stack));
            return;
        }

        if !in_guarded_task() {
            let mut context = ErrorContext::new().with_action(GLOBAL_ERROR_ACTION);
            if let Some(location) = info.location() {
                context = context.with_data("location", serde_json::json!(location.to_string()));
            }

            reporter.report(
                ErrorInput::Exception {
                    message: panic_message(info.payload()),
                    stack: Some(Backtrace::force_capture().to_string()),
                },
                Severity::Critical,
                context,
            );
        }

        previous(info);
    }));

    tracing::debug!("全局panic钩子已安装");
}

/// 外层任务被丢弃 (含abort) 时一并中止内层任务
struct AbortInnerOnDrop(AbortHandle);

impl Drop for AbortInnerOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// 启动受保护的异步任务
///
/// 任务panic时以 `unhandled_rejection` 上报并返回 `None`,
/// 不会波及调用方。任务被取消时同样返回 `None`。
/// 对返回的句柄调用 `abort()` 会连同实际执行的任务一起中止。
pub fn spawn_guarded<F>(
    reporter: Arc<ErrorReporter>,
    task_name: &'static str,
    future: F,
) -> JoinHandle<Option<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let inner = tokio::spawn(GUARDED_TASK.scope(task_name, future));
    let abort_inner = AbortInnerOnDrop(inner.abort_handle());

    tokio::spawn(async move {
        let _abort_inner = abort_inner;
        match inner.await {
            Ok(output) => Some(output),
            Err(e) if e.is_panic() => {
                let message = panic_message(&*e.into_panic());
                tracing::error!(task = task_name, message = %message, "异步任务panic");

                reporter.report(
                    ErrorInput::Exception {
                        message,
                        stack: None,
                    },
                    Severity::Error,
                    ErrorContext::new()
                        .with_action(UNHANDLED_REJECTION_ACTION)
                        .with_data("task", serde_json::json!(task_name)),
                );
                None
            }
            Err(_) => {
                tracing::debug!(task = task_name, "异步任务已取消");
                None
            }
        }
    })
}

/// 上报未处理的网络失败
pub fn report_network_failure(
    reporter: &ErrorReporter,
    method: &str,
    url: &str,
    err: &(dyn std::error::Error + 'static),
) {
    reporter.report(
        ErrorInput::from_error(err),
        Severity::Error,
        ErrorContext::new()
            .with_action(NETWORK_FAILURE_ACTION)
            .with_data("method", serde_json::json!(method))
            .with_data("endpoint", serde_json::json!(url)),
    );
}
