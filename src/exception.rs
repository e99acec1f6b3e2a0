// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了一次 Action 调用生命周期中可能出现的各类错误。
//!
//! ## 设计意图
//! - **错误分类**：涵盖请求报文解析错误、请求体解析错误、URL 构建配置错误以及用户代码抛出的错误。
//! - **不做转换**：本库不会把错误自动翻译成 HTTP 状态码，错误原样传递给 `call` 的调用者。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志中。

use std::fmt;

/// Action 处理请求过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求头无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行缺失或格式不正确。
    MalformedRequest,
    /// 客户端使用了无法识别的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 请求声明了 JSON 的 Content-Type，但请求体无法解析为 JSON 对象。
    MalformedBody(String),
    /// 构建绝对 URL 时端口无法转换为整数。
    InvalidPort(String),
    /// JSON 序列化失败。
    Serialize(String),
    /// 配置文件读取或解析失败。
    ConfigFile(String),
    /// before/after filter 或 `respond` 中由用户代码抛出的错误。
    Handler(String),
}

use Exception::*;

impl Exception {
    /// 构造一个用户代码错误，便于在 filter 中使用 `?` 以外的方式提前返回。
    pub fn handler(message: impl Into<String>) -> Self {
        Handler(message.into())
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequest => write!(f, "Malformed request line"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            MalformedBody(e) => write!(f, "Malformed JSON body: {}", e),
            InvalidPort(p) => write!(f, "Invalid port: {:?}", p),
            Serialize(e) => write!(f, "JSON serialization failed: {}", e),
            ConfigFile(e) => write!(f, "Config error: {}", e),
            Handler(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Exception {}
