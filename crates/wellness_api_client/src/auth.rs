//! Bearer-token capability and the allowlist of routes that go out without one.

use async_trait::async_trait;
use secrecy::SecretString;

/// Routes that must never carry a bearer token.
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "/api/v2/auth/login",
    "/api/v2/auth/register",
    "/api/v2/auth/refresh",
    "/api/v2/auth/forgot-password",
];

/// Whether a request to `path` (query string allowed) should be authenticated.
pub fn requires_auth(path: &str) -> bool {
    let route = path.split('?').next().unwrap_or(path).trim_end_matches('/');
    !PUBLIC_ENDPOINTS.contains(&route)
}

/// Supplies the token for outgoing requests. Returning `None` sends the
/// request unauthenticated and leaves the 401 to the server.
#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn bearer_token(&self) -> Option<SecretString>;
}

/// A token fixed at construction time.
#[derive(Clone, Debug, Default)]
pub struct StaticTokenProvider {
    token: Option<SecretString>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<SecretString>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Option<SecretString> {
        self.token.clone()
    }
}
