//! Permission-record fetch and route regeneration.

use std::sync::Arc;

use tracing::warn;

use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::router::{PermissionRouter, Route, RouteTable};

/// The server-declared permission forest for the current session.
pub async fn fetch_routes(client: &ApiClient) -> ApiResult<Vec<Route>> {
    client.get("/api/user/routes", None).await
}

/// Fetch the permission records and swap the active route table. A failed
/// fetch still leaves a navigable table installed (the default shell) before
/// the error is handed back.
pub async fn regenerate(
    client: &ApiClient,
    router: &PermissionRouter,
) -> ApiResult<Arc<RouteTable>> {
    client.loading().set_global(true);
    let fetched = fetch_routes(client).await;
    client.loading().set_global(false);
    match fetched {
        Ok(records) => Ok(router.install(&records)),
        Err(e) => {
            warn!(target: "router", "permission fetch failed, keeping default shell: {}", e);
            router.reset();
            Err(e)
        }
    }
}
