//! Catalog endpoints.

use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::services::PaginationData;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub sales: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub price: f64,
    #[serde(default)]
    pub original_price: f64,
    #[serde(default)]
    pub images: Vec<String>,
}

pub async fn list(client: &ApiClient, query: &ProductQuery) -> ApiResult<PaginationData<ProductSummary>> {
    client
        .get("/api/products", Some(serde_json::to_value(query).unwrap_or_default()))
        .await
}

pub async fn detail(client: &ApiClient, id: &str) -> ApiResult<ProductDetail> {
    client.get(&format!("/api/products/{id}"), None).await
}
