// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 绝对 URL 构建
//!
//! 把相对路径补全为带协议与主机的绝对 URL。协议、主机和端口默认取自请求上下文，
//! 可由 `UrlOptions` 逐项覆盖。端口等于协议默认端口（80/443）时省略。

use crate::{exception::Exception, param::*, request::Request};
use lazy_static::lazy_static;
use regex::Regex;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

lazy_static! {
    static ref ABSOLUTE_URL: Regex = Regex::new(r"^https?://").unwrap();
}

/// 覆盖请求上下文默认值的选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlOptions {
    https: Option<bool>,
    host: Option<String>,
    port: Option<String>,
}

impl UrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn https(mut self, https: bool) -> Self {
        self.https = Some(https);
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// 端口在构建 URL 时才转换为整数，无法转换时返回 `Exception::InvalidPort`
    pub fn port(mut self, port: impl ToString) -> Self {
        self.port = Some(port.to_string());
        self
    }
}

pub fn is_absolute(url: &str) -> bool {
    ABSOLUTE_URL.is_match(url)
}

/// 生成绝对 URL。`url` 已经是 http(s) 绝对地址时原样返回。
pub fn absolute_url(
    request: &Request,
    url: &str,
    options: &UrlOptions,
) -> Result<String, Exception> {
    if is_absolute(url) {
        return Ok(url.to_string());
    }

    let https = options.https.unwrap_or_else(|| request.is_https());
    let host = options
        .host
        .clone()
        .unwrap_or_else(|| request.server_name().to_string());
    let port = match &options.port {
        Some(port) => coerce_port(port)?,
        None => coerce_port(&request.server_port())?,
    };

    let (prefix, default_port) = if https {
        (HTTPS_PREFIX, DEFAULT_HTTPS_PORT)
    } else {
        (HTTP_PREFIX, DEFAULT_HTTP_PORT)
    };
    let authority = if port == default_port {
        host
    } else {
        format!("{}:{}", host, port)
    };

    Ok([prefix, &join_path(&authority, url)].concat())
}

fn coerce_port(port: &str) -> Result<u16, Exception> {
    port.trim()
        .parse::<u16>()
        .map_err(|_| Exception::InvalidPort(port.to_string()))
}

/// 以 `/` 拼接两段路径，边界处只保留一个分隔符，不改动 `tail` 的其余内容
fn join_path(head: &str, tail: &str) -> String {
    let head = head.trim_end_matches('/');
    let tail = tail.strip_prefix('/').unwrap_or(tail);
    format!("{}/{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::HttpRequestMethod;
    use proptest::prelude::*;

    fn request(scheme: &str, port: &str) -> Request {
        Request::new(HttpRequestMethod::Get, "/")
            .with_scheme(scheme)
            .with_server("example.com", port)
    }

    #[test]
    fn test_default_http_port_omitted() {
        let url = absolute_url(&request("http", "80"), "/login", &UrlOptions::new()).unwrap();
        assert_eq!(url, "http://example.com/login");
    }

    #[test]
    fn test_non_default_port_kept() {
        let url = absolute_url(&request("http", "3000"), "/login", &UrlOptions::new()).unwrap();
        assert_eq!(url, "http://example.com:3000/login");
    }

    #[test]
    fn test_port_option_overrides_context() {
        let options = UrlOptions::new().port(3000);
        let url = absolute_url(&request("http", "80"), "/login", &options).unwrap();
        assert_eq!(url, "http://example.com:3000/login");
    }

    #[test]
    fn test_https_default_port_omitted() {
        let url = absolute_url(&request("https", "443"), "/login", &UrlOptions::new()).unwrap();
        assert_eq!(url, "https://example.com/login");
    }

    #[test]
    fn test_https_option_with_http_port() {
        let options = UrlOptions::new().https(true).host("secure.example.com");
        let url = absolute_url(&request("http", "80"), "/a", &options).unwrap();
        assert_eq!(url, "https://secure.example.com:80/a");
    }

    #[test]
    fn test_relative_path_without_slash() {
        let url = absolute_url(&request("http", "80"), "login?next=%2F", &UrlOptions::new())
            .unwrap();
        assert_eq!(url, "http://example.com/login?next=%2F");
    }

    #[test]
    fn test_empty_path() {
        let url = absolute_url(&request("http", "80"), "", &UrlOptions::new()).unwrap();
        assert_eq!(url, "http://example.com/");
    }

    #[test]
    fn test_absolute_url_unchanged() {
        let url = absolute_url(
            &request("https", "8443"),
            "http://test.com/login",
            &UrlOptions::new().port(1),
        )
        .unwrap();
        assert_eq!(url, "http://test.com/login");
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        assert!(is_absolute("https://x"));
        assert!(!is_absolute("HTTP://x"));
        assert!(!is_absolute("/http://x"));
    }

    #[test]
    fn test_invalid_port_option() {
        let options = UrlOptions::new().port("abc");
        let result = absolute_url(&request("http", "80"), "/login", &options);
        assert_eq!(result, Err(Exception::InvalidPort("abc".to_string())));
    }

    #[test]
    fn test_invalid_context_port() {
        let result = absolute_url(&request("http", "eighty"), "/login", &UrlOptions::new());
        assert!(matches!(result, Err(Exception::InvalidPort(_))));
    }

    proptest! {
        #[test]
        fn prop_absolute_urls_pass_through(rest in "[a-z0-9./?=&-]{0,40}", https in any::<bool>()) {
            let url = format!("{}{}", if https { HTTPS_PREFIX } else { HTTP_PREFIX }, rest);
            let out = absolute_url(&request("http", "not-a-port"), &url, &UrlOptions::new());
            prop_assert_eq!(out, Ok(url));
        }

        #[test]
        fn prop_path_is_preserved(path in "/[a-zA-Z0-9%_./-]{0,40}", port in 1u16..=u16::MAX) {
            let req = request("http", &port.to_string());
            let out = absolute_url(&req, &path, &UrlOptions::new()).unwrap();
            prop_assert!(out.ends_with(&path));
            prop_assert_eq!(out.contains(&format!(":{}", port)), port != 80);
        }
    }
}
