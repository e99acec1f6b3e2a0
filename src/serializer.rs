// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # JSON 序列化器
//!
//! Action 通过 `JsonSerializer` 编码响应数据、解码 JSON 请求体。
//! 默认实现 `StandardJson` 基于 `serde_json`，可在 `ActionConfig` 中替换。

use crate::exception::Exception;
use serde_json::Value;

#[cfg_attr(test, mockall::automock)]
pub trait JsonSerializer: Send + Sync {
    fn dump(&self, value: &Value) -> Result<String, Exception>;
    fn load(&self, input: &str) -> Result<Value, Exception>;
}

/// 紧凑输出的标准 JSON 编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardJson;

impl JsonSerializer for StandardJson {
    fn dump(&self, value: &Value) -> Result<String, Exception> {
        serde_json::to_string(value).map_err(|e| Exception::Serialize(e.to_string()))
    }

    fn load(&self, input: &str) -> Result<Value, Exception> {
        serde_json::from_str(input).map_err(|e| Exception::MalformedBody(e.to_string()))
    }
}

/// 以两个空格缩进输出
pub fn dump_pretty(value: &Value) -> Result<String, Exception> {
    serde_json::to_string_pretty(value).map_err(|e| Exception::Serialize(e.to_string()))
}
