use clap::{Parser, Subcommand};
use std::process::ExitCode;

use coach_resilience::commands::{auth_commands, boundary_commands, log_commands, watch_commands};
use coach_resilience::models::Severity;
use coach_resilience::services::{install_panic_hook, ConfigService, HealthProbe};
use coach_resilience::state::AppState;
use coach_resilience::utils::logger;

#[derive(Parser)]
#[command(name = "coach-resilience", version, about = "Interview coach client resilience layer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report an error through the reporter
    Report {
        message: String,
        #[arg(long, default_value = "error")]
        severity: Severity,
        #[arg(long)]
        component: Option<String>,
        #[arg(long)]
        action: Option<String>,
    },
    /// Submit the local error queue in one batch
    Flush,
    /// List queued errors
    Log {
        #[arg(long)]
        min_severity: Option<Severity>,
    },
    /// Show authentication state and queue size
    Status,
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Flush queued errors whenever the backend becomes reachable
    Watch,
    /// Render a faulting view inside an error boundary
    BoundaryDemo {
        #[arg(long, default_value = "/interview")]
        route: String,
        /// Recover by navigating home instead of reloading
        #[arg(long)]
        go_home: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigService::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("配置加载失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 初始化日志系统,guard需保持到进程退出
    let _guard = match logger::init(&config.log_dir()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("日志系统初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(config, false) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "应用状态初始化失败");
            eprintln!("初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    install_panic_hook(state.reporter.clone());

    if matches!(cli.command, Command::Report { .. } | Command::Flush) {
        match HealthProbe::new(
            &state.config.api_base_url,
            state.config.health_interval,
            state.config.request_timeout,
            state.connectivity.clone(),
        ) {
            Ok(probe) => {
                probe.probe_once().await;
            }
            Err(e) => tracing::warn!(error = %e, "无法创建健康探测,按离线处理"),
        }
    }

    let result = match cli.command {
        Command::Report {
            message,
            severity,
            component,
            action,
        } => log_commands::report_error(&state, message, severity, component, action).await,
        Command::Flush => log_commands::flush_errors(&state).await,
        Command::Log { min_severity } => log_commands::list_errors(&state, min_severity),
        Command::Status => auth_commands::show_status(&state).await,
        Command::Login { username, password } => {
            auth_commands::login(&state, username, password).await
        }
        Command::Logout => auth_commands::logout(&state).await,
        Command::Watch => watch_commands::watch(&state).await,
        Command::BoundaryDemo { route, go_home } => {
            boundary_commands::boundary_demo(&state, route, go_home)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
