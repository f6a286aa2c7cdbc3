//! Refresh token cookie
//!
//! The refresh token only ever travels in this cookie: `HttpOnly` keeps it away
//! from scripts, `Secure` off plaintext connections and `SameSite=Strict` out of
//! cross-site requests. It is scoped to the auth routes.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";
pub const REFRESH_COOKIE_PATH: &str = "/auth";

/// Build the cookie carrying a freshly issued refresh token
pub fn refresh_cookie(refresh_token: String, max_age: chrono::Duration) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, refresh_token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path(REFRESH_COOKIE_PATH)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// Build a cookie that makes the browser drop the refresh token
pub fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path(REFRESH_COOKIE_PATH)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Refresh token presented by the client, if any
pub fn refresh_token_from(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("abc123".to_string(), chrono::Duration::days(14));
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("refreshToken=abc123"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Path=/auth"));
        assert!(rendered.contains("Max-Age=1209600"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let rendered = clear_refresh_cookie().to_string();
        assert!(rendered.starts_with("refreshToken=;"));
        assert!(rendered.contains("Max-Age=0"));
    }

    #[test]
    fn test_refresh_token_from_jar() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=deadbeef"),
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(refresh_token_from(&jar).as_deref(), Some("deadbeef"));

        let empty = CookieJar::from_headers(&HeaderMap::new());
        assert!(refresh_token_from(&empty).is_none());
    }
}
