//! Email-link confirmation and OAuth sign-in.
//!
//! Handlers validate their parameters, hand the token or code to the
//! [`AuthGateway`](lk_gateway::AuthGateway) and redirect with whatever session
//! cookies the backend issued. No session state is kept here.

pub mod params;
pub mod redirect;
mod routes;

pub use routes::routes;

/// Route the OAuth provider returns to.
pub const CALLBACK_PATH: &str = "/auth/callback";
