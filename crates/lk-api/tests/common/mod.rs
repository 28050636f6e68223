use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode, header},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use http_body_util::BodyExt;
use lk_api::{ApiConfig, ApiState, router};
use lk_gateway::{
    AuthGateway, GatewayError, OAuthProvider, OAuthStart, OtpType, SessionCookies, VerifiedToken,
};
use serde::Deserialize;
use tower::ServiceExt;

pub const SITE_URL: &str = "https://example.com";
pub const BACKEND_URL: &str = "https://abcdefgh.supabase.co";
pub const SESSION_COOKIE: &str = "sb-abcdefgh-auth-token";
pub const VERIFIER_COOKIE: &str = "sb-abcdefgh-auth-token-code-verifier";

/// Configuration as the binary would read it, with `extra` overriding.
pub fn test_config(extra: &[(&str, &str)]) -> ApiConfig {
    let mut vars = vec![
        ("SITE_URL", SITE_URL.to_string()),
        ("AUTH_BACKEND_URL", BACKEND_URL.to_string()),
        ("AUTH_BACKEND_ANON_KEY", "test-anon-key".to_string()),
        // Keep the sitemap away from whatever is in the working directory.
        ("BLOG_CONTENT_DIR", "/nonexistent/blog".to_string()),
        ("DOCS_CONTENT_DIR", "/nonexistent/docs".to_string()),
    ];
    for (key, value) in extra {
        vars.retain(|(k, _)| k != key);
        vars.push((*key, value.to_string()));
    }

    ApiConfig::from_vars(vars.into_iter().map(|(k, v)| (k.to_string(), v)))
        .expect("Failed to build test config")
}

/// Gateway double recording every call.
///
/// Succeeds with a single session cookie unless `reject` is set, in which
/// case every call fails the way a backend refusal would.
#[derive(Debug, Default)]
pub struct FakeGateway {
    pub reject: Option<String>,
    /// Notice returned by `verify_token` alongside the cookies.
    pub message: Option<String>,
    pub verify_calls: Mutex<Vec<(String, OtpType)>>,
    pub oauth_calls: Mutex<Vec<(OAuthProvider, String)>>,
    /// Code and verifier cookie value seen by each exchange.
    pub exchange_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reject: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub fn with_message(message: &str) -> Arc<Self> {
        Arc::new(Self {
            message: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub fn call_count(&self) -> usize {
        self.verify_calls.lock().unwrap().len()
            + self.oauth_calls.lock().unwrap().len()
            + self.exchange_calls.lock().unwrap().len()
    }

    fn outcome(&self) -> Result<(), GatewayError> {
        match &self.reject {
            Some(message) => Err(GatewayError::Rejected {
                status: 403,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn session_cookies() -> SessionCookies {
        vec![
            Cookie::build((SESSION_COOKIE, "base64-eyJhY2Nlc3NfdG9rZW4iOiJhIn0"))
                .path("/")
                .http_only(true)
                .build(),
        ]
        .into()
    }
}

#[async_trait]
impl AuthGateway for FakeGateway {
    async fn verify_token(
        &self,
        token_hash: &str,
        otp_type: OtpType,
        _cookies: &CookieJar,
    ) -> Result<VerifiedToken, GatewayError> {
        self.verify_calls
            .lock()
            .unwrap()
            .push((token_hash.to_string(), otp_type));
        self.outcome()?;

        Ok(VerifiedToken {
            message: self.message.clone(),
            cookies: Self::session_cookies(),
        })
    }

    async fn start_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthStart, GatewayError> {
        self.oauth_calls
            .lock()
            .unwrap()
            .push((provider, redirect_to.to_string()));
        self.outcome()?;

        Ok(OAuthStart {
            url: format!(
                "{BACKEND_URL}/auth/v1/authorize?provider={provider}&redirect_to={}",
                urlencoding::encode(redirect_to)
            ),
            cookies: vec![
                Cookie::build((VERIFIER_COOKIE, "verifier-1"))
                    .path("/")
                    .http_only(true)
                    .build(),
            ]
            .into(),
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        cookies: &CookieJar,
    ) -> Result<SessionCookies, GatewayError> {
        let verifier = cookies.get(VERIFIER_COOKIE).map(|c| c.value().to_string());
        self.exchange_calls
            .lock()
            .unwrap()
            .push((code.to_string(), verifier.clone()));
        self.outcome()?;

        if verifier.is_none() {
            return Err(GatewayError::MissingCodeVerifier);
        }
        Ok(Self::session_cookies())
    }
}

/// Routes with state but without the outer middleware stack.
pub fn test_router(gateway: Arc<FakeGateway>, config: &ApiConfig) -> Router {
    router::router().with_state(ApiState::with_gateway(config, gateway))
}

pub fn test_client(gateway: Arc<FakeGateway>) -> TestClient {
    TestClient::new(test_router(gateway, &test_config(&[])))
}

/// Helper to make requests to the test app
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    pub async fn request(&self, mut request: Request<Body>) -> TestResponse {
        // The rate limiter falls back to the peer address.
        let test_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);
        request.extensions_mut().insert(ConnectInfo(test_addr));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            body,
            headers,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.get_from(uri, "127.0.0.1").await
    }

    /// GET as the client at `ip`, for rate limit checks.
    pub async fn get_from(&self, uri: &str, ip: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .expect("Failed to build request");

        self.request(request).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-forwarded-for", "127.0.0.1")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .expect("Failed to build request");

        self.request(request).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// Body of every error response.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub hint: Option<String>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not valid UTF-8")
    }

    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    pub fn error(&self) -> ErrorBody {
        self.json()
    }

    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
    }

    /// Assert a 303 and return the `Location` header.
    pub fn assert_redirect(&self) -> String {
        self.assert_status(StatusCode::SEE_OTHER);
        self.headers
            .get(header::LOCATION)
            .expect("Redirect without Location")
            .to_str()
            .expect("Location is not ASCII")
            .to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw `Set-Cookie` header values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    pub fn get_cookie(&self, name: &str) -> Option<String> {
        self.set_cookies().into_iter().find_map(|raw| {
            let cookie = Cookie::parse(raw).ok()?;
            (cookie.name() == name).then(|| cookie.value().to_string())
        })
    }
}
