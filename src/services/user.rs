//! Profile and address endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiResult;
use crate::http::ApiClient;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub coupons: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn profile(client: &ApiClient) -> ApiResult<UserProfile> {
    client.get("/api/user/profile", None).await
}

pub async fn update_profile(client: &ApiClient, params: &UpdateProfileParams) -> ApiResult<Value> {
    client
        .put("/api/user/profile", Some(serde_json::to_value(params).unwrap_or_default()))
        .await
}

pub async fn addresses(client: &ApiClient) -> ApiResult<Vec<Address>> {
    client.get("/api/user/addresses", None).await
}
