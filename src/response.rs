// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use crate::param::*;

use bytes::Bytes;
use chrono::prelude::*;
use log::warn;

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    // 是否显式设置过状态码，参与“是否已响应”的判断
    status_set: bool,
    headers: Vec<(String, String)>,
    body: Vec<Bytes>,
    date: DateTime<Utc>,
    server_name: String,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            status_set: false,
            headers: vec![],
            body: vec![],
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
        }
    }

    pub fn set_status(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.status_set = true;
        self
    }

    /// 写入标头。同名（大小写不敏感）标头以最后一次写入为准。
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self
    }

    /// 追加一个响应体片段，空字符串同样算作一次写入
    pub fn write(&mut self, chunk: impl Into<Bytes>) -> &mut Self {
        self.body.push(chunk.into());
        self
    }

    /// 尚未写入任何响应体且未显式设置状态码
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && !self.status_set
    }

    /// 结束响应：计算 `Content-Length`。
    ///
    /// 204 与 304 不允许携带响应体，此时移除 `Content-Type`、`Content-Length` 和全部片段。
    pub fn finish(mut self) -> Self {
        if self.status_code == 204 || self.status_code == 304 {
            self.remove_header(CONTENT_TYPE);
            self.remove_header(CONTENT_LENGTH);
            self.body.clear();
        } else {
            let length = self.content_length();
            self.set_header(CONTENT_LENGTH, &length.to_string());
        }
        self.date = Utc::now();
        self
    }

    /// 序列化为 HTTP/1.1 响应报文
    pub fn as_bytes(&self) -> Vec<u8> {
        let version = self.version.to_string();
        let status_code = self.status_code.to_string();
        let information = match STATUS_CODES.get(&self.status_code) {
            Some(info) => *info,
            None => {
                warn!("未知的状态码：{}", self.status_code);
                "Unknown"
            }
        };
        let date = format_date(&self.date);

        let mut header = [
            version.as_str(),
            " ",
            &status_code,
            " ",
            information,
            CRLF,
        ]
        .concat();
        for (name, value) in &self.headers {
            header.push_str(&[name.as_str(), ": ", value, CRLF].concat());
        }
        header.push_str(&["Date: ", &date, CRLF].concat());
        header.push_str(&["Server: ", &self.server_name, CRLF].concat());
        header.push_str(CRLF);

        let mut bytes = header.into_bytes();
        for chunk in &self.body {
            bytes.extend_from_slice(chunk);
        }
        bytes
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[Bytes] {
        &self.body
    }

    /// 响应体全部片段的字节总长度
    pub fn content_length(&self) -> usize {
        self.body.iter().map(Bytes::len).sum()
    }

    /// 将全部片段按 UTF-8 拼接，便于测试与日志
    pub fn body_string(&self) -> String {
        let joined: Vec<u8> = self.body.iter().flat_map(|c| c.iter().copied()).collect();
        String::from_utf8_lossy(&joined).into_owned()
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
