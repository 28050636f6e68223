use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use lk_gateway::{OtpType, SessionCookies};

use super::params::ConfirmationRequest;

/// Shown after an email change when the backend sent no text of its own.
pub const EMAIL_CHANGED_FALLBACK: &str = "Your email has been updated";

/// Destination after a successful confirmation.
///
/// Email changes carry a `message` for the landing page; the other kinds go
/// to `next` untouched.
pub fn confirmation_target(request: &ConfirmationRequest, message: Option<&str>) -> String {
    match request.otp_type {
        OtpType::EmailChange => {
            let message = message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(EMAIL_CHANGED_FALLBACK);
            with_query_param(&request.next, "message", message)
        }
        OtpType::Email | OtpType::Recovery => request.next.clone(),
    }
}

/// Callback URL handed to the provider, remembering where to go afterwards.
pub fn oauth_callback_target(callback_url: &str, next: Option<&str>) -> String {
    match next {
        Some(next) => with_query_param(callback_url, "next", next),
        None => callback_url.to_string(),
    }
}

/// Append `key=value` (percent-encoded) to a path or URL, before any fragment.
pub fn with_query_param(target: &str, key: &str, value: &str) -> String {
    let (base, fragment) = match target.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (target, None),
    };

    let separator = if base.contains('?') { '&' } else { '?' };
    let mut out = format!("{base}{separator}{key}={}", urlencoding::encode(value));

    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }

    out
}

/// Redirect to `target` with every backend cookie attached as issued.
pub fn redirect_with_session(
    jar: CookieJar,
    cookies: SessionCookies,
    target: &str,
) -> (CookieJar, Redirect) {
    let jar = cookies.into_iter().fold(jar, |jar, cookie| jar.add(cookie));
    (jar, Redirect::to(target))
}
