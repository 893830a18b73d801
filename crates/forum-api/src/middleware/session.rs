//! Session-resolution middleware.
//!
//! Every HTTP request passes through [`resolve_session`]; the WebSocket
//! upgrade handler uses the same [`extract_credential`] helper and the same
//! [`forum_auth::SessionService`], which is what makes a socket inherit the
//! caller's HTTP identity.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use forum_core::types::Identity;

use crate::state::AppState;

/// The identity the session layer attached to this request.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedIdentity(pub Identity);

/// Pull the session credential out of a request: the session cookie first,
/// then a `token` query parameter for non-browser clients.
pub fn extract_credential(
    jar: &CookieJar,
    query: Option<&str>,
    cookie_name: &str,
) -> Option<String> {
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }
    token_from_query(query?)
}

/// Find a `token=` pair in a raw query string.
fn token_from_query(query: &str) -> Option<String> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolve the caller's session and attach the identity to the request.
///
/// Resolution failure is not an HTTP error: the request proceeds as
/// anonymous, exactly as a realtime handshake would.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let credential = extract_credential(
        &jar,
        request.uri().query(),
        state.sessions.cookie_name(),
    );
    let identity = state.sessions.resolve(credential.as_deref()).await;

    request.extensions_mut().insert(ResolvedIdentity(identity));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_query() {
        assert_eq!(
            token_from_query("a=1&token=abc&b=2").as_deref(),
            Some("abc")
        );
        assert_eq!(token_from_query("a=1&b=2"), None);
        assert_eq!(token_from_query("token="), None);
    }
}
