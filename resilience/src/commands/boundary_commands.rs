use crate::services::{ErrorBoundary, RecoveryAction, Rendered};
use crate::state::AppState;

/// 渲染一个故障单元,打印回退界面,然后执行恢复操作
pub fn boundary_demo(state: &AppState, route: String, go_home: bool) -> Result<(), String> {
    state.reporter.set_current_url(route.clone());

    let mut boundary = ErrorBoundary::new("App", state.reporter.clone(), state.storage.clone());

    // 模拟后端响应缺少结构化反馈字段
    let response = serde_json::json!({ "question": "Tell me about yourself" });
    let rendered: Rendered<String> =
        boundary.render(&route, "InterviewChat", || -> Result<String, String> {
            match response.get("feedback").and_then(|f| f.as_str()) {
                Some(feedback) => Ok(feedback.to_string()),
                None => panic!("feedback field missing from response"),
            }
        });

    match rendered {
        Rendered::Content(content) => println!("{}", content),
        Rendered::Fallback(view) => println!("{}\n", view),
    }

    let action = if go_home {
        RecoveryAction::GoHome
    } else {
        RecoveryAction::Reload
    };
    let remount = boundary.recover(action);
    println!(
        "Recovered via {:?}: navigating to {} (state {:?})",
        action,
        remount.navigate_to,
        remount.boundary.state()
    );
    Ok(())
}
