//! Authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiResult;
use crate::http::ApiClient;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginParams {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaResponse {
    pub captcha_img: String,
    pub expire_time: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

pub async fn login(client: &ApiClient, params: &LoginParams) -> ApiResult<LoginResponse> {
    client
        .post("/api/login", Some(serde_json::to_value(params).unwrap_or_default()))
        .await
}

/// Login and store the returned credential in the session, which in turn
/// fires the session observers (route regeneration hangs off those).
pub async fn login_and_store(client: &ApiClient, params: &LoginParams) -> ApiResult<LoginResponse> {
    let resp = login(client, params).await?;
    client.session().set(resp.token.clone());
    Ok(resp)
}

pub async fn get_captcha(client: &ApiClient, phone: Option<&str>) -> ApiResult<CaptchaResponse> {
    client.get("/api/captcha", Some(json!({ "phone": phone }))).await
}

pub async fn get_user_info(client: &ApiClient) -> ApiResult<UserInfo> {
    client.get("/api/user/info", None).await
}
