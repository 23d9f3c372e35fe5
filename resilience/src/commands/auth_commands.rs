use std::sync::Arc;

use crate::models::Credentials;
use crate::services::{error_boundary::last_error_location, AuthBackend, AuthContext};
use crate::state::AppState;

async fn bootstrap(state: &AppState) -> AuthContext {
    let backend: Arc<dyn AuthBackend> = state.auth_backend.clone();
    AuthContext::bootstrap(Arc::clone(&state.storage), backend).await
}

/// 显示认证状态与本地队列概况
pub async fn show_status(state: &AppState) -> Result<(), String> {
    let auth = bootstrap(state).await;

    let authenticated = auth.is_authenticated().await;
    match auth.profile().await {
        Some(profile) if authenticated => {
            println!("Authenticated as {} (id {})", profile.username, profile.id)
        }
        _ if authenticated => println!("Authenticated"),
        _ => println!("Not authenticated"),
    }

    let queued = state.queued_errors().map_err(|e| e.to_string())?;
    println!("Queued errors: {}", queued);

    if let Some(location) = last_error_location(state.storage.as_ref()) {
        println!("Last error location: {}", location);
    }

    auth.teardown();
    Ok(())
}

/// 登录,失败时返回面向用户的提示
pub async fn login(state: &AppState, username: String, password: String) -> Result<(), String> {
    let auth = bootstrap(state).await;

    let profile = auth
        .login(&Credentials::new(username, password))
        .await
        .map_err(|e| e.user_message())?;

    println!("Logged in as {}", profile.username);
    auth.teardown();
    Ok(())
}

pub async fn logout(state: &AppState) -> Result<(), String> {
    let auth = bootstrap(state).await;
    auth.logout().await.map_err(|e| e.user_message())?;

    println!("Logged out");
    auth.teardown();
    Ok(())
}
