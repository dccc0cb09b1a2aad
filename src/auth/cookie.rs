//! Cookie helpers
//!
//! Reads named values out of `Cookie` request headers and renders
//! `Set-Cookie` response headers.

use hyper::header::COOKIE;
use hyper::HeaderMap;

/// Find a cookie value by name across all `Cookie` headers
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// A `Set-Cookie` header value
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: &'static str,
    value: String,
    max_age_secs: i64,
    secure: bool,
    http_only: bool,
    same_site: &'static str,
}

impl SetCookie {
    /// Cookie scoped to the whole site, HttpOnly, SameSite=Lax
    pub fn new(name: &'static str, value: impl Into<String>, max_age_secs: i64) -> Self {
        Self {
            name,
            value: value.into(),
            max_age_secs,
            secure: true,
            http_only: true,
            same_site: "Lax",
        }
    }

    /// Cookie that tells the browser to drop `name` immediately
    pub fn expired(name: &'static str) -> Self {
        Self::new(name, "", 0)
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn strict(mut self) -> Self {
        self.same_site = "Strict";
        self
    }

    /// Render the header value
    pub fn to_header_value(&self) -> String {
        let mut out = format!(
            "{}={}; Path=/; Max-Age={}; SameSite={}",
            self.name, self.value, self.max_age_secs, self.same_site
        );
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_read_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=abc.def.ghi; visitor=xyz"),
        );
        assert_eq!(read_cookie(&headers, "admin_session"), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, "visitor"), Some("xyz"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_read_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(read_cookie(&headers, "b"), Some("2"));
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("admin_session="));
        assert_eq!(read_cookie(&headers, "admin_session"), None);
    }

    #[test]
    fn test_set_cookie_rendering() {
        let cookie = SetCookie::new("admin_session", "tok", 86400).strict();
        assert_eq!(
            cookie.to_header_value(),
            "admin_session=tok; Path=/; Max-Age=86400; SameSite=Strict; HttpOnly; Secure"
        );

        let cleared = SetCookie::expired("admin_session").secure(false);
        assert_eq!(
            cleared.to_header_value(),
            "admin_session=; Path=/; Max-Age=0; SameSite=Lax; HttpOnly"
        );
    }
}
