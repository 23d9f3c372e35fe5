//! 错误边界
//!
//! 包裹渲染单元,把渲染期间的任何故障 (返回 `Err` 或 panic) 转换为稳定的回退界面。
//!
//! 状态转换:
//! ```text
//! Normal ──渲染故障──► Faulted ──recover(Reload | GoHome)──► 新的 Normal (重新挂载)
//! ```
//! `Faulted` 不会自愈;每次挂载最多进入一次,之后的渲染直接返回回退界面,
//! 不再执行子单元,也不会重复上报。

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::models::{ErrorContext, Severity};
use crate::services::config_service::BuildProfile;
use crate::services::error_reporter::{ErrorInput, ErrorReporter};
use crate::services::global_handlers::{panic_message, BoundaryScope};
use crate::services::local_storage::{LocalStorage, ERROR_LOCATION_KEY};

pub const UNCAUGHT_RENDER_ACTION: &str = "uncaught_render_error";
pub const HOME_ROUTE: &str = "/";

/// 故障详情
#[derive(Debug, Clone, PartialEq)]
pub struct FaultDetails {
    pub error: String,
    /// 组件路径,如 `App > Dashboard`
    pub component_stack: String,
    /// panic 堆栈 (仅当全局钩子已安装时可得)
    pub stack: Option<String>,
}

/// 边界状态
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryState {
    Normal,
    Faulted(FaultDetails),
}

/// 回退界面上的恢复操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 重新加载当前路由
    Reload,
    /// 返回应用根路由
    GoHome,
}

/// 回退界面
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackView {
    pub title: String,
    pub message: String,
    /// 仅开发环境可见
    pub details: Option<FaultDetails>,
    pub actions: [RecoveryAction; 2],
}

impl fmt::Display for FallbackView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.message)?;
        if let Some(details) = &self.details {
            writeln!(f)?;
            writeln!(f, "Error: {}", details.error)?;
            writeln!(f, "Component stack: {}", details.component_stack)?;
            if let Some(stack) = &details.stack {
                writeln!(f, "{}", stack)?;
            }
        }
        writeln!(f)?;
        write!(f, "[Reload page]  [Go to home]")
    }
}

/// 渲染结果
#[derive(Debug)]
pub enum Rendered<T> {
    Content(T),
    Fallback(FallbackView),
}

impl<T> Rendered<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Rendered::Fallback(_))
    }

    pub fn content(self) -> Option<T> {
        match self {
            Rendered::Content(value) => Some(value),
            Rendered::Fallback(_) => None,
        }
    }
}

/// 重新挂载
///
/// 恢复操作的结果: 一个处于 `Normal` 的新边界,以及要导航到的路由。
pub struct Remount {
    pub boundary: ErrorBoundary,
    pub navigate_to: String,
    /// Reload 为整页重新加载,GoHome 为导航
    pub full_reload: bool,
}

/// 错误边界
pub struct ErrorBoundary {
    name: String,
    reporter: Arc<ErrorReporter>,
    storage: Arc<dyn LocalStorage>,
    profile: BuildProfile,
    state: BoundaryState,
    route: String,
}

impl ErrorBoundary {
    /// # 参数
    /// - `name`: 边界所包裹的根组件名,作为组件路径的起点
    pub fn new(
        name: impl Into<String>,
        reporter: Arc<ErrorReporter>,
        storage: Arc<dyn LocalStorage>,
    ) -> Self {
        let profile = reporter.profile();
        Self {
            name: name.into(),
            reporter,
            storage,
            profile,
            state: BoundaryState::Normal,
            route: HOME_ROUTE.to_string(),
        }
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self.state, BoundaryState::Faulted(_))
    }

    /// 在边界内渲染一个子单元
    ///
    /// # 参数
    /// - `route`: 当前路由
    /// - `component`: 子单元名称
    /// - `child`: 渲染函数,`Err` 与 panic 都视为渲染故障
    pub fn render<T, E, F>(&mut self, route: &str, component: &str, child: F) -> Rendered<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        if let BoundaryState::Faulted(details) = &self.state {
            return Rendered::Fallback(self.fallback_view(details));
        }

        self.route = route.to_string();

        let scope = BoundaryScope::enter();
        let outcome = catch_unwind(AssertUnwindSafe(child));
        let captured_stack = scope.take_captured_stack();
        drop(scope);

        let error = match outcome {
            Ok(Ok(content)) => return Rendered::Content(content),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(&*payload),
        };

        let details = FaultDetails {
            error,
            component_stack: format!("{} > {}", self.name, component),
            stack: captured_stack,
        };
        self.enter_faulted(details, component)
    }

    fn enter_faulted<T>(&mut self, details: FaultDetails, component: &str) -> Rendered<T> {
        tracing::error!(
            boundary = %self.name,
            route = %self.route,
            component_stack = %details.component_stack,
            error = %details.error,
            "渲染故障,切换到回退界面"
        );

        self.reporter.report(
            ErrorInput::Exception {
                message: details.error.clone(),
                stack: details.stack.clone(),
            },
            Severity::Error,
            ErrorContext::new()
                .with_component(component)
                .with_action(UNCAUGHT_RENDER_ACTION)
                .with_data(
                    "componentStack",
                    serde_json::json!(details.component_stack),
                ),
        );

        // 尽力而为: 存储不可用时仍必须渲染回退界面
        if let Err(e) = self.storage.set_item(ERROR_LOCATION_KEY, &self.route) {
            tracing::warn!(error = %e, route = %self.route, "无法保存故障路由");
        }

        let view = self.fallback_view(&details);
        self.state = BoundaryState::Faulted(details);
        Rendered::Fallback(view)
    }

    fn fallback_view(&self, details: &FaultDetails) -> FallbackView {
        FallbackView {
            title: "Something went wrong".to_string(),
            message: "We're sorry, but an unexpected error occurred. \
                      Try reloading the page or return to the home page."
                .to_string(),
            details: self.profile.is_development().then(|| details.clone()),
            actions: [RecoveryAction::Reload, RecoveryAction::GoHome],
        }
    }

    /// 执行恢复操作
    ///
    /// 消耗当前边界 (丢弃全部内存状态),返回重新挂载后的新边界。
    pub fn recover(self, action: RecoveryAction) -> Remount {
        let navigate_to = match action {
            RecoveryAction::Reload if !self.route.is_empty() => self.route.clone(),
            RecoveryAction::Reload | RecoveryAction::GoHome => HOME_ROUTE.to_string(),
        };

        tracing::info!(
            boundary = %self.name,
            action = ?action,
            navigate_to = %navigate_to,
            "错误边界重新挂载"
        );

        let boundary = ErrorBoundary {
            name: self.name,
            reporter: self.reporter,
            storage: self.storage,
            profile: self.profile,
            state: BoundaryState::Normal,
            route: navigate_to.clone(),
        };

        Remount {
            boundary,
            navigate_to,
            full_reload: action == RecoveryAction::Reload,
        }
    }
}

/// 读取最近一次故障时的路由
pub fn last_error_location(storage: &dyn LocalStorage) -> Option<String> {
    match storage.get_item(ERROR_LOCATION_KEY) {
        Ok(location) => location,
        Err(e) => {
            tracing::debug!(error = %e, "无法读取故障路由");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::connectivity::ConnectivitySignal;
    use crate::services::error_collector::ErrorCollector;
    use crate::services::error_log_store::ErrorLogStore;
    use crate::services::local_storage::MemoryStorage;
    use crate::models::{ErrorLogEntry, ReporterError};
    use async_trait::async_trait;

    struct NullCollector;

    #[async_trait]
    impl ErrorCollector for NullCollector {
        async fn submit_one(&self, _entry: &ErrorLogEntry) -> Result<(), ReporterError> {
            Ok(())
        }

        async fn submit_batch(&self, _entries: &[ErrorLogEntry]) -> Result<(), ReporterError> {
            Ok(())
        }
    }

    fn boundary(profile: BuildProfile) -> (Arc<MemoryStorage>, Arc<ErrorReporter>, ErrorBoundary) {
        let storage = Arc::new(MemoryStorage::new());
        let reporter = Arc::new(ErrorReporter::new(
            ErrorLogStore::new(storage.clone()),
            Arc::new(NullCollector),
            ConnectivitySignal::new(false),
            profile,
        ));
        let boundary = ErrorBoundary::new("App", reporter.clone(), storage.clone());
        (storage, reporter, boundary)
    }

    #[test]
    fn test_normal_render_passes_content_through() {
        let (_, reporter, mut boundary) = boundary(BuildProfile::Development);
        let rendered = boundary.render("/dashboard", "Dashboard", || Ok::<_, String>("sessions"));
        assert_eq!(rendered.content(), Some("sessions"));
        assert!(!boundary.is_faulted());
        assert!(reporter.queued().unwrap().is_empty());
    }

    #[test]
    fn test_err_enters_faulted_and_reports() {
        let (storage, reporter, mut boundary) = boundary(BuildProfile::Development);
        let rendered = boundary.render("/cv", "CvAnalysis", || Err::<(), _>("cannot read skills"));

        assert!(rendered.is_fallback());
        assert!(boundary.is_faulted());

        let queued = reporter.queued().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].severity, Severity::Error);
        assert_eq!(queued[0].context.action.as_deref(), Some(UNCAUGHT_RENDER_ACTION));
        assert_eq!(queued[0].context.component.as_deref(), Some("CvAnalysis"));
        assert_eq!(
            queued[0].context.additional_data["componentStack"],
            "App > CvAnalysis"
        );
        assert_eq!(last_error_location(storage.as_ref()).as_deref(), Some("/cv"));
    }

    #[test]
    fn test_panic_is_contained() {
        let (_, _, mut boundary) = boundary(BuildProfile::Development);
        let rendered: Rendered<()> =
            boundary.render("/chat", "Chat", || -> Result<(), String> { panic!("index out of bounds") });

        match rendered {
            Rendered::Fallback(view) => {
                assert_eq!(view.details.unwrap().error, "index out of bounds");
            }
            Rendered::Content(_) => panic!("应渲染回退界面"),
        }
    }

    #[test]
    fn test_production_hides_details() {
        let (_, _, mut boundary) = boundary(BuildProfile::Production);
        let rendered = boundary.render("/", "Home", || Err::<(), _>("secret token expired"));

        let Rendered::Fallback(view) = rendered else {
            panic!("应渲染回退界面");
        };
        assert!(view.details.is_none());
        assert!(!view.to_string().contains("secret token"));
    }

    #[test]
    fn test_storage_failure_still_renders_fallback() {
        let (storage, _, mut boundary) = boundary(BuildProfile::Development);
        storage.set_fail_mode(true);

        let rendered = boundary.render("/", "Home", || Err::<(), _>("boom"));
        assert!(rendered.is_fallback());
        assert!(boundary.is_faulted());
    }

    #[test]
    fn test_recover_returns_to_normal() {
        let (_, _, mut boundary) = boundary(BuildProfile::Development);
        boundary.render("/sessions/4", "Session", || Err::<(), _>("boom"));

        let remount = boundary.recover(RecoveryAction::Reload);
        assert_eq!(remount.navigate_to, "/sessions/4");
        assert!(remount.full_reload);
        assert_eq!(remount.boundary.state(), &BoundaryState::Normal);

        let mut boundary = remount.boundary;
        boundary.render("/sessions/4", "Session", || Err::<(), _>("again"));
        let remount = boundary.recover(RecoveryAction::GoHome);
        assert_eq!(remount.navigate_to, HOME_ROUTE);
        assert!(!remount.full_reload);
        assert!(!remount.boundary.is_faulted());
    }
}
