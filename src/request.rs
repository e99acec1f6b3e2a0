// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求上下文模块
//!
//! 该模块负责构建 Action 所借用的只读请求上下文 `Request`。它涵盖了：
//! 1. 请求行（Request-Line）的解析（方法、路径、查询字符串、版本）。
//! 2. 全部 HTTP 标头的保存，支持大小写不敏感的查询。
//! 3. 请求体的保存（可重复读取）。
//! 4. 服务器名称、端口与协议（scheme）三元组，以及路由层提供的路由参数。
//!
//! 上下文一旦构建就不再变化，由外部服务器或路由层持有。

use crate::{exception::Exception, param::*};
use bytes::Bytes;
use log::error;
use std::collections::HashMap;

/// 一次请求的完整上下文。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法（GET, POST 等）
    method: HttpRequestMethod,
    /// 请求的资源路径（不含查询字符串）
    path: String,
    /// `?` 之后的原始查询字符串
    query_string: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 按接收顺序保存的标头
    headers: Vec<(String, String)>,
    /// 请求体，读取不会消耗内容
    body: Bytes,
    /// "http" 或 "https"
    scheme: String,
    /// 服务器名称，通常来自 `Host` 标头
    server_name: String,
    /// 服务器端口的原始文本；为 `None` 时按 scheme 取默认端口
    server_port: Option<String>,
    /// 路由层提供的路由参数
    route_params: HashMap<String, String>,
}

impl Request {
    /// 以方法和请求目标（可包含查询字符串）构建请求上下文。
    ///
    /// 默认值：`http` 协议，服务器名 `localhost`，无标头，无请求体。
    pub fn new(method: HttpRequestMethod, target: &str) -> Self {
        let (path, query_string) = split_target(target);
        Self {
            method,
            path,
            query_string,
            version: HttpVersion::V1_1,
            headers: vec![],
            body: Bytes::new(),
            scheme: "http".to_string(),
            server_name: "localhost".to_string(),
            server_port: None,
            route_params: HashMap::new(),
        }
    }

    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 以空行切分报文头与请求体，报文头必须是合法的 UTF-8。
    /// 2. 解析请求行：提取方法、请求目标和协议版本。
    /// 3. 逐行解析标头，`Host` 标头决定服务器名称与端口。
    /// 4. 若给出了 `Content-Length`，请求体按该长度截断。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 请求 ID，用于在多线程环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, body) = match find_subsequence(buffer, b"\r\n\r\n") {
            Some(pos) => (&buffer[..pos], &buffer[pos + 4..]),
            None => (buffer, &[][..]),
        };

        let head = match std::str::from_utf8(head) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut lines = head.split(CRLF);
        let request_line = lines.next().unwrap_or("");
        let parts: Vec<&str> = request_line.split(' ').collect();
        if parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequest);
        }

        let method = match HttpRequestMethod::parse(parts[0]) {
            Some(m) => m,
            None => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, parts[0]);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version_str = parts[parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 路径中出现空格虽然不规范，但通过 join 尝试恢复
        let target = parts[1..parts.len() - 1].join(" ");

        let mut request = Self::new(method, &target);
        request.version = version;

        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                request = request.with_header(name.trim(), value.trim());
            }
        }

        if let Some(host) = request.header(HOST).map(str::to_string) {
            match host.rsplit_once(':') {
                // IPv6 字面量（如 [::1]）中的冒号不是端口分隔符
                Some((name, port)) if !port.contains(']') => {
                    request.server_name = name.to_string();
                    request.server_port = Some(port.to_string());
                }
                _ => request.server_name = host,
            }
        }

        let declared = request
            .header(CONTENT_LENGTH)
            .and_then(|l| l.parse::<usize>().ok());
        let body = match declared {
            Some(len) if len < body.len() => &body[..len],
            _ => body,
        };
        request.body = Bytes::copy_from_slice(body);

        Ok(request)
    }

    /// 追加一个标头。同名标头重复出现时，查询返回第一个。
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// 设置协议，`"https"` 以外的值都视为 http。
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_lowercase();
        self
    }

    pub fn with_server(mut self, name: &str, port: impl ToString) -> Self {
        self.server_name = name.to_string();
        self.server_port = Some(port.to_string());
        self
    }

    pub fn with_server_port(mut self, port: impl ToString) -> Self {
        self.server_port = Some(port.to_string());
        self
    }

    pub fn with_route_params(mut self, params: HashMap<String, String>) -> Self {
        self.route_params = params;
        self
    }

    pub fn with_route_param(mut self, name: &str, value: &str) -> Self {
        self.route_params
            .insert(name.to_string(), value.to_string());
        self
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// 大小写不敏感地查询标头
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    pub fn accept(&self) -> Option<&str> {
        self.header(ACCEPT)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// 服务器端口的原始文本，未显式给出时按 scheme 返回 80 或 443
    pub fn server_port(&self) -> String {
        match &self.server_port {
            Some(port) => port.clone(),
            None if self.is_https() => DEFAULT_HTTPS_PORT.to_string(),
            None => DEFAULT_HTTP_PORT.to_string(),
        }
    }

    pub fn route_params(&self) -> &HashMap<String, String> {
        &self.route_params
    }
}

/// 将请求目标切分为路径与查询字符串
fn split_target(target: &str) -> (String, String) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target.to_string(), String::new()),
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// 解析 `application/x-www-form-urlencoded` 格式的键值对。
///
/// `+` 解码为空格，`%XX` 按字节解码；没有 `=` 的键对应空字符串，空键被忽略。
pub fn parse_urlencoded(input: &str) -> Result<Vec<(String, String)>, Exception> {
    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(input)
        .map_err(|e| Exception::MalformedBody(e.to_string()))?;
    Ok(pairs.into_iter().filter(|(key, _)| !key.is_empty()).collect())
}
