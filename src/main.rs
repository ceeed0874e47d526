use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use mallkit::services::{self, auth::LoginParams, product::ProductQuery};
use mallkit::{ApiClient, ClientConfig, PermissionRouter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let cfg = ClientConfig::from_env();
    info!(
        target: "mallkit",
        "mallkit starting: base_url='{}', timeout_ms={}, session_file={:?}",
        cfg.base_url, cfg.timeout_ms, cfg.session_file
    );

    let client = ApiClient::with_defaults(cfg)?;
    let router = PermissionRouter::with_builtin();
    router.bind_session(client.session());

    // Optional login when credentials are provided in the environment.
    let username = std::env::var("MALLKIT_USERNAME").ok();
    let password = std::env::var("MALLKIT_PASSWORD").ok();
    if let (Some(username), Some(password)) = (username, password) {
        let params = LoginParams { username, password, captcha: None };
        match services::auth::login_and_store(&client, &params).await {
            Ok(resp) => {
                info!(target: "mallkit", user = resp.username.as_str(), "logged in");
                if let Err(e) = services::permission::regenerate(&client, &router).await {
                    info!(target: "mallkit", "route regeneration degraded: {}", e);
                }
            }
            Err(e) => info!(target: "mallkit", "login failed: {}", e),
        }
    }

    let query = ProductQuery { page: Some(1), page_size: Some(10), category: None };
    match services::product::list(&client, &query).await {
        Ok(page) => {
            info!(target: "mallkit", total = page.total, "fetched product feed");
            for p in page.list.iter().take(5) {
                info!(target: "mallkit", id = p.id, name = p.name.as_str(), price = p.price, "product");
            }
        }
        Err(e) => info!(target: "mallkit", "product feed unavailable: {}", e),
    }

    info!(
        target: "mallkit",
        routes = router.table().len(),
        "active route table ready"
    );
    Ok(())
}
