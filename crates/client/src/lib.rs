pub mod api;
pub mod error;
pub mod refresh;
pub mod session;

pub use api::ApiClient;
pub use error::{ClientError, Result};
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
pub use session::{SessionContext, TokenPair};
