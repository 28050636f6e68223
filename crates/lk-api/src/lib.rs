pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod site;
pub mod state;
pub mod tracing;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::ApiState;
