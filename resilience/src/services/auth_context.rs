//! 会话/认证状态
//!
//! 进程级的"客户端是否已认证"标记,以显式上下文对象传给使用方 (如路由守卫)。
//!
//! 生命周期:
//! - `bootstrap()`: 应用启动时唯一一次读取持久化标记;
//!   标记不是字面量 `"true"` 时向后端重新校验
//! - `login()` / `logout()`: 仅有的两个修改入口,先与后端往返,再翻转内存标记及其持久化镜像
//! - `teardown()`: 消耗上下文

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{AuthError, Credentials, StorageError, UserProfile};
use crate::services::auth_backend::AuthBackend;
use crate::services::local_storage::{LocalStorage, AUTH_FLAG_KEY, USER_PROFILE_KEY};

const AUTH_TRUE: &str = "true";
const AUTH_FALSE: &str = "false";

#[derive(Debug, Clone, Default)]
struct AuthState {
    authenticated: bool,
    profile: Option<UserProfile>,
}

/// 认证上下文
pub struct AuthContext {
    storage: Arc<dyn LocalStorage>,
    backend: Arc<dyn AuthBackend>,
    state: RwLock<AuthState>,
}

impl AuthContext {
    /// 启动时初始化
    ///
    /// 持久化标记恰为 `"true"` 时直接信任,跳过校验;
    /// 其余任何值 (包括缺失或读取失败) 都触发一次后端校验。
    /// 校验失败视为未认证,只清理认证相关的键,不动其他应用设置。
    pub async fn bootstrap(storage: Arc<dyn LocalStorage>, backend: Arc<dyn AuthBackend>) -> Self {
        let persisted = match storage.get_item(AUTH_FLAG_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "读取认证标记失败,按未认证处理并校验");
                None
            }
        };

        let context = Self {
            storage,
            backend,
            state: RwLock::new(AuthState::default()),
        };

        if persisted.as_deref() == Some(AUTH_TRUE) {
            let profile = context.cached_profile();
            *context.state.write().await = AuthState {
                authenticated: true,
                profile,
            };
            tracing::info!("持久化认证标记有效,跳过会话校验");
            return context;
        }

        tracing::info!(persisted = ?persisted, "认证标记缺失或为假,向后端校验会话");
        context.revalidate().await;
        context
    }

    async fn revalidate(&self) {
        match self.backend.check().await {
            Ok(response) if response.authenticated => {
                self.persist(true, response.user.as_ref());
                *self.state.write().await = AuthState {
                    authenticated: true,
                    profile: response.user,
                };
                tracing::info!("会话校验通过");
            }
            Ok(_) => {
                self.clear_scoped();
                *self.state.write().await = AuthState::default();
                tracing::info!("会话校验: 未认证");
            }
            Err(e) => {
                self.clear_scoped();
                *self.state.write().await = AuthState::default();
                tracing::warn!(error = %e, "会话校验失败,按未认证处理");
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.authenticated
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.read().await.profile.clone()
    }

    /// 登录
    ///
    /// 失败时状态不变,错误需展示给用户 (见 [`AuthError::user_message`])。
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, AuthError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Missing username or password".to_string(),
            ));
        }

        let response = self.backend.login(credentials).await.map_err(|e| {
            tracing::warn!(username = %credentials.username, error = %e, "登录失败");
            e
        })?;

        self.persist(true, Some(&response.user));
        *self.state.write().await = AuthState {
            authenticated: true,
            profile: Some(response.user.clone()),
        };

        tracing::info!(user_id = response.user.id, "登录成功");
        Ok(response.user)
    }

    /// 登出
    ///
    /// 后端确认后才翻转标记;失败时保持已登录状态。
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.backend.logout().await.map_err(|e| {
            tracing::warn!(error = %e, "登出失败");
            e
        })?;

        self.clear_scoped();
        *self.state.write().await = AuthState::default();

        tracing::info!("已登出");
        Ok(())
    }

    /// 结束上下文生命周期
    pub fn teardown(self) {
        tracing::debug!("认证上下文已释放");
    }

    fn cached_profile(&self) -> Option<UserProfile> {
        let raw = self.storage.get_item(USER_PROFILE_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    /// 写入持久化镜像,存储失败只记录日志
    fn persist(&self, authenticated: bool, profile: Option<&UserProfile>) {
        let flag = if authenticated { AUTH_TRUE } else { AUTH_FALSE };
        let result = self.storage.set_item(AUTH_FLAG_KEY, flag).and_then(|_| match profile {
            Some(profile) => {
                let raw = serde_json::to_string(profile).map_err(StorageError::from)?;
                self.storage.set_item(USER_PROFILE_KEY, &raw)
            }
            None => Ok(()),
        });

        if let Err(e) = result {
            tracing::warn!(error = %e, "认证状态持久化失败");
        }
    }

    /// 只清理认证相关的键
    fn clear_scoped(&self) {
        if let Err(e) = self.storage.set_item(AUTH_FLAG_KEY, AUTH_FALSE) {
            tracing::warn!(key = AUTH_FLAG_KEY, error = %e, "写入认证标记失败");
        }
        if let Err(e) = self.storage.remove_item(USER_PROFILE_KEY) {
            tracing::warn!(key = USER_PROFILE_KEY, error = %e, "清理用户资料缓存失败");
        }
    }
}
