use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::models::auth::ApiErrorBody;
use crate::models::{AuthCheckResponse, AuthError, Credentials, LoginResponse};
use crate::services::error_reporter::ErrorReporter;
use crate::services::global_handlers::report_network_failure;

pub const AUTH_CHECK_PATH: &str = "/api/auth/check";
pub const AUTH_LOGIN_PATH: &str = "/api/auth/login";
pub const AUTH_LOGOUT_PATH: &str = "/api/auth/logout";

/// 认证后端
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// 会话校验,解决本地标记与真实状态的偏差
    async fn check(&self) -> Result<AuthCheckResponse, AuthError>;

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError>;

    async fn logout(&self) -> Result<(), AuthError>;
}

/// 基于HTTP的认证后端
///
/// 会话由服务端cookie维持,客户端启用cookie存储。
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
    reporter: Option<Arc<ErrorReporter>>,
}

impl HttpAuthBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            reporter: None,
        })
    }

    /// 网络失败同时上报给错误上报器
    pub fn with_reporter(mut self, reporter: Arc<ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, AuthError> {
        request.send().await.map_err(|e| {
            tracing::warn!(method, url, error = %e, "认证请求失败");
            if let Some(reporter) = &self.reporter {
                report_network_failure(reporter, method, url, &e);
            }
            AuthError::from(e)
        })
    }

    /// 把非2xx响应转换为错误,优先使用后端返回的 `error` 字段
    async fn error_from_response(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        if status == 401 {
            return AuthError::InvalidCredentials;
        }

        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("请求失败,状态码 {}", status),
        };

        if status == 400 {
            AuthError::InvalidInput(message)
        } else {
            AuthError::HttpStatusError { status, message }
        }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn check(&self) -> Result<AuthCheckResponse, AuthError> {
        let url = self.url(AUTH_CHECK_PATH);
        let response = self.send("GET", self.client.get(&url), &url).await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json::<AuthCheckResponse>().await?)
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let url = self.url(AUTH_LOGIN_PATH);
        let response = self
            .send("POST", self.client.post(&url).json(credentials), &url)
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json::<LoginResponse>().await?)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let url = self.url(AUTH_LOGOUT_PATH);
        let response = self.send("POST", self.client.post(&url), &url).await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }
}
