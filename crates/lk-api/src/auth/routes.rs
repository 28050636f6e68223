use std::collections::HashMap;

use axum::{
    Router,
    extract::{Path, Query, State, rejection::PathRejection},
    response::Redirect,
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;

use super::{
    CALLBACK_PATH,
    params::{CallbackRequest, ConfirmationRequest, INVALID_PROVIDER, OAuthStartRequest},
    redirect,
};
use crate::{ApiState, error::ApiError, metrics::record_auth_event, middleware::rate_limit};

type AuthRedirect = Result<(CookieJar, Redirect), ApiError>;

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/auth/confirm", get(confirm))
        .route("/auth/oauth/{provider}", get(oauth_start))
        .route(CALLBACK_PATH, get(oauth_callback))
        .layer(make_rate_limit_layer!(
            rate_limit::AUTH_REPLENISH_MS,
            rate_limit::AUTH_BURST_SIZE
        ))
}

/// `GET /auth/confirm?token_hash=..&type=..&next=..`
///
/// Target of the links in signup, recovery and email-change mails.
async fn confirm(
    State(state): State<ApiState>,
    jar: CookieJar,
    Query(query): Query<HashMap<String, String>>,
) -> AuthRedirect {
    let request = ConfirmationRequest::from_query(&query).inspect_err(|_| {
        tracing::info!("Rejected confirmation link with invalid parameters");
        record_auth_event("confirm", "invalid", false);
    })?;
    let otp_type = request.otp_type.as_str();

    let verified = state
        .gateway
        .verify_token(&request.token_hash, request.otp_type, &jar)
        .await
        .inspect_err(|e| {
            tracing::warn!(otp_type, error = %e, "Token verification failed");
            record_auth_event("confirm", otp_type, false);
        })?;

    let target = redirect::confirmation_target(&request, verified.message.as_deref());
    tracing::info!(
        otp_type,
        next = %request.next,
        cookies = verified.cookies.len(),
        "Confirmation link verified"
    );
    record_auth_event("confirm", otp_type, true);

    Ok(redirect::redirect_with_session(jar, verified.cookies, &target))
}

/// `GET /auth/oauth/{provider}?next=..`
///
/// Sends the browser to the backend's authorize endpoint, carrying the PKCE
/// verifier cookie for the callback.
async fn oauth_start(
    State(state): State<ApiState>,
    jar: CookieJar,
    provider: Result<Path<String>, PathRejection>,
    Query(query): Query<HashMap<String, String>>,
) -> AuthRedirect {
    // A segment that is not even UTF-8 cannot name a provider.
    let Path(provider) = provider.map_err(|e| {
        tracing::info!(error = %e, "Rejected OAuth sign-in with undecodable provider");
        record_auth_event("oauth_start", "invalid", false);
        ApiError::InvalidParameters(INVALID_PROVIDER)
    })?;
    let request = OAuthStartRequest::from_params(&provider, &query).inspect_err(|_| {
        tracing::info!(%provider, "Rejected OAuth sign-in for unknown provider");
        record_auth_event("oauth_start", "invalid", false);
    })?;
    let provider = request.provider.as_str();

    let callback = redirect::oauth_callback_target(&state.auth_callback_url, request.next.as_deref());
    let start = state
        .gateway
        .start_oauth(request.provider, &callback)
        .await
        .inspect_err(|e| {
            tracing::warn!(provider, error = %e, "Failed to start OAuth sign-in");
            record_auth_event("oauth_start", provider, false);
        })?;

    tracing::info!(provider, "Redirecting to OAuth provider");
    record_auth_event("oauth_start", provider, true);

    Ok(redirect::redirect_with_session(jar, start.cookies, &start.url))
}

/// `GET /auth/callback?code=..&next=..`
///
/// Trades the authorization code for a session using the verifier cookie set
/// by [`oauth_start`].
async fn oauth_callback(
    State(state): State<ApiState>,
    jar: CookieJar,
    Query(query): Query<HashMap<String, String>>,
) -> AuthRedirect {
    let request = CallbackRequest::from_query(&query).inspect_err(|e| {
        tracing::info!(error = %e, "Rejected OAuth callback");
        record_auth_event("oauth_callback", "invalid", false);
    })?;

    let cookies = state
        .gateway
        .exchange_code(&request.code, &jar)
        .await
        .inspect_err(|e| {
            tracing::warn!(error = %e, "Authorization code exchange failed");
            record_auth_event("oauth_callback", "pkce", false);
        })?;

    tracing::info!(next = %request.next, "OAuth sign-in completed");
    record_auth_event("oauth_callback", "pkce", true);

    Ok(redirect::redirect_with_session(jar, cookies, &request.next))
}
