//! Typed endpoint surface over the request pipeline, one sub-module per
//! backend domain.

pub mod auth;
pub mod cart;
pub mod permission;
pub mod product;
pub mod user;

use serde::{Deserialize, Serialize};

/// Paginated list shape shared by catalog endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationData<T> {
    pub list: Vec<T>,
    pub total: i64,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
}
