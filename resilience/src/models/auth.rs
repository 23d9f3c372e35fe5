use serde::{Deserialize, Serialize};

/// 用户资料
///
/// 登录成功或会话校验通过后缓存到本地存储的 `user_profile` 键。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// 登录凭据
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// `GET /api/auth/check` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct AuthCheckResponse {
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// `POST /api/auth/login` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

/// 后端错误响应体 `{"error": "..."}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
