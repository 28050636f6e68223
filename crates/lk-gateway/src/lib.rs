//! Client side of the hosted authentication backend.
//!
//! The backend owns users, token verification and the OAuth code exchange.
//! This crate exposes the small part of its API the server needs behind the
//! [`AuthGateway`] trait, and turns the sessions it issues into browser
//! cookies.

pub mod cookies;
pub mod error;
pub mod gateway;
pub mod hosted;
pub mod types;

pub use cookies::CookieSettings;
pub use error::GatewayError;
pub use gateway::AuthGateway;
pub use hosted::{GatewayConfig, HostedAuthGateway};
pub use types::{
    OAuthProvider, OAuthStart, OtpType, Session, SessionCookies, UnknownVariant, VerifiedToken,
};
