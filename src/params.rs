// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求参数
//!
//! 每次调用在运行 filter 之前解析一次参数，之后只读。来源依次为：
//! 1. 查询字符串；
//! 2. `application/x-www-form-urlencoded` 请求体；
//! 3. 路由参数与 JSON 请求体，二者的先后由 `ParamPrecedence` 决定。
//!
//! 后合并的来源在键冲突时覆盖先合并的来源。

use crate::{
    exception::Exception,
    param::{APPLICATION_JSON, FORM_URLENCODED},
    request::{parse_urlencoded, Request},
    serializer::JsonSerializer,
};
use serde_json::{Map, Value};
use std::fmt;

/// 路由参数与 JSON 请求体的合并顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamPrecedence {
    /// 先合并路由参数，再合并 JSON 请求体（JSON 优先）
    #[default]
    JsonLast,
    /// 先合并 JSON 请求体，再合并路由参数（路由参数优先）
    RouteLast,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从请求上下文解析参数。
    ///
    /// 当 Content-Type 含有 `application/json` 且请求体非空白时才解析 JSON；
    /// 请求体不是 JSON 对象时返回 `Exception::MalformedBody`。
    pub fn resolve(
        request: &Request,
        serializer: &dyn JsonSerializer,
        precedence: ParamPrecedence,
    ) -> Result<Self, Exception> {
        let mut params = Self::new();
        params.merge_pairs(parse_urlencoded(request.query_string())?);

        let content_type = request.content_type().unwrap_or("");
        if content_type.contains(FORM_URLENCODED) {
            let body = String::from_utf8_lossy(request.body());
            params.merge_pairs(parse_urlencoded(&body)?);
        }

        let json = if content_type.contains(APPLICATION_JSON) {
            load_json_body(request, serializer)?
        } else {
            None
        };

        let route = request
            .route_params()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()));
        match precedence {
            ParamPrecedence::JsonLast => {
                params.merge_pairs(route);
                if let Some(json) = json {
                    params.merge(json);
                }
            }
            ParamPrecedence::RouteLast => {
                if let Some(json) = json {
                    params.merge(json);
                }
                params.merge_pairs(route);
            }
        }
        Ok(params)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn merge(&mut self, other: Map<String, Value>) {
        self.values.extend(other);
    }

    fn merge_pairs(&mut self, pairs: impl IntoIterator<Item = (String, String)>) {
        self.values
            .extend(pairs.into_iter().map(|(k, v)| (k, Value::String(v))));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 以字符串形式读取参数，非字符串的 JSON 值按其 JSON 文本返回
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl fmt::Display for Params {
    /// 以紧凑 JSON 形式输出，用于调用日志
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.values).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

fn load_json_body(
    request: &Request,
    serializer: &dyn JsonSerializer,
) -> Result<Option<Map<String, Value>>, Exception> {
    let body = std::str::from_utf8(request.body())
        .map_err(|e| Exception::MalformedBody(e.to_string()))?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    match serializer.load(body)? {
        Value::Object(map) => Ok(Some(map)),
        other => Err(Exception::MalformedBody(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::HttpRequestMethod;
    use crate::serializer::StandardJson;
    use serde_json::json;

    fn json_request(body: &str) -> Request {
        Request::new(HttpRequestMethod::Post, "/items?a=1")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_route_param("a", "2")
            .with_route_param("b", "3")
            .with_body(body.to_string())
    }

    #[test]
    fn test_json_wins_by_default() {
        let request = json_request(r#"{"a": 4}"#);
        let params =
            Params::resolve(&request, &StandardJson, ParamPrecedence::JsonLast).unwrap();

        assert_eq!(params.get("a"), Some(&json!(4)));
        assert_eq!(params.get_str("b").as_deref(), Some("3"));
    }

    #[test]
    fn test_route_last_policy() {
        let request = json_request(r#"{"a": 4, "c": true}"#);
        let params =
            Params::resolve(&request, &StandardJson, ParamPrecedence::RouteLast).unwrap();

        assert_eq!(params.get_str("a").as_deref(), Some("2"));
        assert_eq!(params.get("c"), Some(&json!(true)));
    }

    #[test]
    fn test_route_params_override_query() {
        let request = Request::new(HttpRequestMethod::Get, "/items?a=1&q=rust")
            .with_route_param("a", "2");
        let params = Params::resolve(&request, &StandardJson, Default::default()).unwrap();

        assert_eq!(params.get_str("a").as_deref(), Some("2"));
        assert_eq!(params.get_str("q").as_deref(), Some("rust"));
    }

    #[test]
    fn test_blank_json_body_is_ignored() {
        let request = json_request("  \n ");
        let params = Params::resolve(&request, &StandardJson, Default::default()).unwrap();
        assert_eq!(params.get_str("a").as_deref(), Some("2"));
    }

    #[test]
    fn test_malformed_json_body() {
        let request = json_request("{\"a\":");
        let result = Params::resolve(&request, &StandardJson, Default::default());
        assert!(matches!(result, Err(Exception::MalformedBody(_))));
    }

    #[test]
    fn test_non_object_json_body() {
        let request = json_request("[1, 2]");
        let result = Params::resolve(&request, &StandardJson, Default::default());
        assert!(matches!(result, Err(Exception::MalformedBody(_))));
    }

    #[test]
    fn test_json_body_ignored_without_json_content_type() {
        let request = Request::new(HttpRequestMethod::Post, "/")
            .with_header("Content-Type", "text/plain")
            .with_body("{not json");
        let params = Params::resolve(&request, &StandardJson, Default::default()).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_display_as_json() {
        let mut params = Params::new();
        params.insert("a", 1);
        params.insert("b", "x");
        assert_eq!(params.to_string(), r#"{"a":1,"b":"x"}"#);
    }

    #[test]
    fn test_form_body_params() {
        let request = Request::new(HttpRequestMethod::Post, "/login?next=%2Fhome")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body("user=alice&password=s3cret+pw");
        let params = Params::resolve(&request, &StandardJson, Default::default()).unwrap();

        assert_eq!(params.len(), 3);
        assert_eq!(params.get_str("next").as_deref(), Some("/home"));
        assert_eq!(params.get_str("password").as_deref(), Some("s3cret pw"));
    }
}
