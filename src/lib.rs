pub mod config;
pub mod error;
pub mod http;
pub mod loading;
pub mod nav;
pub mod router;
pub mod services;
pub mod session;

pub use config::ClientConfig;
pub use error::{ApiResult, RequestError};
pub use http::ApiClient;
pub use router::PermissionRouter;
pub use session::AuthSession;
