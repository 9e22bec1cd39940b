//! Cookie builders for the session tokens issued after signup completion.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the access token.
pub const CORVID_ACCESS_TOKEN: &str = "corvid_access_token";

/// Cookie name for the refresh token.
pub const CORVID_REFRESH_TOKEN: &str = "corvid_refresh_token";

/// Access-token JWT lifetime in seconds (4 hours).
pub const ACCESS_TOKEN_EXP: u64 = 14400;

/// Cookie Max-Age for both tokens in seconds (7 days).
pub const REFRESH_TOKEN_EXP: u64 = 604800;

/// Set the access-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use corvid_registration::cookie::{set_access_token_cookie, CORVID_ACCESS_TOKEN};
///
/// let jar = CookieJar::new();
/// let jar = set_access_token_cookie(jar, "token_value".to_string(), "example.com".to_string());
/// let cookie = jar.get(CORVID_ACCESS_TOKEN).unwrap();
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_access_token_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    let cookie = Cookie::build((CORVID_ACCESS_TOKEN, value))
        .path("/")
        .domain(domain)
        .max_age(Duration::seconds(REFRESH_TOKEN_EXP as i64))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// Set the refresh-token cookie on the jar. Scoped to the token-refresh
/// endpoint so the long-lived credential is not sent on every request.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use corvid_registration::cookie::{set_refresh_token_cookie, CORVID_REFRESH_TOKEN};
///
/// let jar = CookieJar::new();
/// let jar = set_refresh_token_cookie(jar, "refresh_value".to_string(), "example.com".to_string());
/// let cookie = jar.get(CORVID_REFRESH_TOKEN).unwrap();
/// assert_eq!(cookie.path(), Some("/auth/token"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
/// ```
pub fn set_refresh_token_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    let cookie = Cookie::build((CORVID_REFRESH_TOKEN, value))
        .path("/auth/token")
        .domain(domain)
        .max_age(Duration::seconds(REFRESH_TOKEN_EXP as i64))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}
