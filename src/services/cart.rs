//! Cart endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::http::ApiClient;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    #[serde(default)]
    pub spec: String,
    pub price: f64,
    pub quantity: i64,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartData {
    pub list: Vec<CartItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartParams {
    pub product_id: i64,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
}

pub async fn list(client: &ApiClient) -> ApiResult<CartData> {
    client.get("/api/cart", None).await
}

pub async fn add(client: &ApiClient, params: &AddToCartParams) -> ApiResult<Value> {
    client
        .post("/api/cart", Some(serde_json::to_value(params).unwrap_or_default()))
        .await
}

pub async fn update(client: &ApiClient, id: i64, quantity: i64) -> ApiResult<Value> {
    client
        .put(&format!("/api/cart/{id}"), Some(json!({ "quantity": quantity })))
        .await
}

pub async fn remove(client: &ApiClient, id: i64) -> ApiResult<Value> {
    client.delete(&format!("/api/cart/{id}"), None).await
}
