// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 从原始请求报文到响应报文的完整流程，不经过网络。

use webaction::{
    Action, ActionConfig, ActionContext, Endpoint, Exception, Reply, Request, UrlOptions,
};

#[derive(Default)]
struct Items;

impl Action for Items {
    fn respond(&mut self, cx: &mut ActionContext<'_>) -> Result<Reply, Exception> {
        let id = cx.params().get_str("id").unwrap_or_default();
        let name = cx.params().get_str("name").unwrap_or_default();
        Ok(serde_json::json!({ "id": id, "name": name }).into())
    }
}

#[derive(Default)]
struct Secret;

impl Action for Secret {}

fn login_required(_: &mut Secret, cx: &mut ActionContext<'_>) -> Result<(), Exception> {
    cx.redirect_to("/login", &UrlOptions::new())?;
    Ok(())
}

fn parse_response(response: &str) -> (u16, Vec<(String, String)>, String) {
    let (head, body) = response.split_once("\r\n\r\n").unwrap_or((response, ""));
    let mut lines = head.split("\r\n");
    let status_code = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    (status_code, headers, body.to_string())
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod wire_tests {
    use super::*;

    #[test]
    fn test_json_post_roundtrip() {
        let raw = "POST /items/42?name=query HTTP/1.1\r\nHost: example.com:8080\r\nContent-Type: application/json\r\nContent-Length: 17\r\n\r\n{\"name\":\"widget\"}";
        let request = Request::try_from(raw.as_bytes(), 1)
            .unwrap()
            .with_route_param("id", "42");

        let endpoint: Box<dyn Endpoint> = Box::new(ActionConfig::<Items>::new());
        let response = endpoint.call(&request).unwrap();
        let bytes = response.as_bytes();
        let (status, headers, body) = parse_response(&String::from_utf8_lossy(&bytes));

        assert_eq!(status, 200);
        assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
        assert_eq!(body, r#"{"id":"42","name":"widget"}"#);
        assert_eq!(
            header(&headers, "Content-Length"),
            Some(body.len().to_string().as_str())
        );
        assert!(header(&headers, "Date").is_some());
    }

    #[test]
    fn test_redirect_uses_host_header() {
        let raw = "GET /secret HTTP/1.1\r\nHost: example.com:3000\r\n\r\n";
        let request = Request::try_from(raw.as_bytes(), 2).unwrap();
        let config = ActionConfig::<Secret>::new().before_filter("login_required", login_required);

        let bytes = config.call(&request).unwrap().as_bytes();
        let (status, headers, body) = parse_response(&String::from_utf8_lossy(&bytes));

        assert_eq!(status, 302);
        assert_eq!(
            header(&headers, "Location"),
            Some("http://example.com:3000/login")
        );
        assert_eq!(header(&headers, "Content-Length"), Some("0"));
        assert!(body.is_empty());
    }

    #[test]
    fn test_https_scheme_applied_by_adapter() {
        let raw = "GET /secret HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let request = Request::try_from(raw.as_bytes(), 3)
            .unwrap()
            .with_scheme("https");
        let config = ActionConfig::<Secret>::new().before_filter("login_required", login_required);

        let response = config.call(&request).unwrap();
        assert_eq!(response.header("Location"), Some("https://example.com/login"));
    }
}
