use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::Utc;
use foodtruck_order_service::identity::{resolve_identity, Identity, Principal};

use crate::error::ApiError;
use crate::handlers::AppState;

pub const SESSION_COOKIE: &str = "session_token";
const SESSION_HEADERS: [&str; 2] = ["session_token", "x-session-token"];

/// The session token of a request. When the `Cookie` header repeats
/// `session_token`, the last value wins; the plain headers are a fallback.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .filter(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
        .last();

    from_cookie.or_else(|| {
        SESSION_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })
    })
}

/// Extractor for handlers that require a signed-in user.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Principal);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthenticated)?;

        let identity = state
            .database
            .run(move |conn| Ok(resolve_identity(conn, Some(&token), Utc::now())?))
            .await?;

        match identity {
            Identity::Authenticated(principal) => Ok(CurrentUser(principal)),
            Identity::Unauthenticated => Err(ApiError::Unauthenticated),
            Identity::Expired => Err(ApiError::SessionExpired),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn last_cookie_wins() {
        let headers = headers(&[("cookie", "session_token=old; theme=dark; session_token=new")]);
        assert_eq!(session_token(&headers).as_deref(), Some("new"));
    }

    #[test]
    fn last_cookie_wins_across_headers() {
        let headers = headers(&[
            ("cookie", "session_token=first"),
            ("cookie", "session_token=second"),
        ]);
        assert_eq!(session_token(&headers).as_deref(), Some("second"));
    }

    #[test]
    fn header_fallbacks_in_order() {
        let headers = headers(&[("x-session-token", "custom"), ("session_token", "plain")]);
        assert_eq!(session_token(&headers).as_deref(), Some("plain"));

        let headers = self::headers(&[("x-session-token", "custom")]);
        assert_eq!(session_token(&headers).as_deref(), Some("custom"));
    }

    #[test]
    fn cookie_beats_headers() {
        let headers = headers(&[("session_token", "plain"), ("cookie", "session_token=cookie")]);
        assert_eq!(session_token(&headers).as_deref(), Some("cookie"));
    }

    #[test]
    fn no_token() {
        let headers = headers(&[("cookie", "theme=dark; session_token=")]);
        assert_eq!(session_token(&headers), None);
    }
}
