// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Action 模块
//!
//! 一个 Action 只负责一个端点上的一次请求/响应。`ActionConfig::call` 的执行顺序：
//! 1. 解析参数与格式，输出调用日志；
//! 2. 设置默认标头 `Content-Type: text/html`；
//! 3. 按注册顺序运行 before filter，任何一个写入了响应就立即停止，且不再调用 `respond`；
//! 4. 响应仍为空时调用 `Action::respond`，并把返回值写入响应；
//! 5. 按注册顺序运行全部 after filter；
//! 6. 结束响应并返回。
//!
//! 任何阶段返回的错误都原样传递给调用者，后续阶段不再运行。

use crate::{
    exception::Exception,
    filters::FilterList,
    param::*,
    params::{ParamPrecedence, Params},
    request::Request,
    response::Response,
    serializer::{dump_pretty, JsonSerializer, StandardJson},
    url::{absolute_url, UrlOptions},
};

use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

/// `respond` 的返回值
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 作为唯一的响应体片段写入
    Text(String),
    /// 按顺序写入多个片段
    Chunks(Vec<String>),
    /// 以 JSON 序列化后写入，并把 Content-Type 设为 application/json
    Value(Value),
}

impl Reply {
    pub fn json<T: Serialize + ?Sized>(data: &T) -> Result<Self, Exception> {
        serde_json::to_value(data)
            .map(Reply::Value)
            .map_err(|e| Exception::Serialize(e.to_string()))
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<Vec<String>> for Reply {
    fn from(chunks: Vec<String>) -> Self {
        Reply::Chunks(chunks)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Value(value)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Value(Value::Null)
    }
}

/// 端点的处理逻辑。每次调用都会通过 `Default` 新建一个实例。
pub trait Action: Default + 'static {
    /// 生成响应的主要钩子。可以直接写入 `cx` 中的响应，也可以返回一个 `Reply`；
    /// 返回值只在响应仍为空时才会被写入。
    fn respond(&mut self, _cx: &mut ActionContext<'_>) -> Result<Reply, Exception> {
        Ok(Reply::from(DEFAULT_RESPONSE))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JsonOptions {
    status: Option<u16>,
}

impl JsonOptions {
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// 单次调用期间的实例状态：借用的请求、正在构建的响应和已解析的参数
pub struct ActionContext<'r> {
    request: &'r Request,
    response: Response,
    params: Params,
    format: String,
    serializer: Arc<dyn JsonSerializer>,
}

impl<'r> ActionContext<'r> {
    pub(crate) fn new(
        request: &'r Request,
        params: Params,
        serializer: Arc<dyn JsonSerializer>,
    ) -> Self {
        let format = resolve_format(&params, request);
        Self {
            request,
            response: Response::new(),
            params,
            format,
            serializer,
        }
    }

    pub fn request(&self) -> &'r Request {
        self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// `format` 参数、`Accept: application/json` 或默认的 "html"
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn write(&mut self, chunk: impl Into<bytes::Bytes>) {
        self.response.write(chunk);
    }

    /// 设置 JSON 的 Content-Type 并写入序列化后的数据，不会结束响应
    pub fn json<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<(), Exception> {
        self.json_with(data, &JsonOptions::default())
    }

    pub fn json_with<T: Serialize + ?Sized>(
        &mut self,
        data: &T,
        options: &JsonOptions,
    ) -> Result<(), Exception> {
        let value = to_value(data)?;
        let body = self.serializer.dump(&value)?;
        self.write_json(body, options);
        Ok(())
    }

    /// 与 `json` 相同，但以两个空格缩进输出
    pub fn pretty_json<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<(), Exception> {
        let body = dump_pretty(&to_value(data)?)?;
        self.write_json(body, &JsonOptions::default());
        Ok(())
    }

    fn write_json(&mut self, body: String, options: &JsonOptions) {
        self.response.set_header(CONTENT_TYPE, APPLICATION_JSON);
        if let Some(status) = options.status {
            self.response.set_status(status);
        }
        self.response.write(body);
    }

    /// 302 重定向到 `url` 的绝对形式，并返回该绝对 URL
    pub fn redirect_to(&mut self, url: &str, options: &UrlOptions) -> Result<String, Exception> {
        let full_url = self.absolute_url(url, options)?;
        self.response.set_header(LOCATION, &full_url);
        self.respond_with(302);
        Ok(full_url)
    }

    pub fn not_found(&mut self) {
        self.respond_with(404);
    }

    pub fn forbidden(&mut self) {
        self.respond_with(403);
    }

    /// 设置状态码并写入空响应体，使请求被视为已响应
    pub fn respond_with(&mut self, status_code: u16) {
        self.response.set_status(status_code).write("");
    }

    pub fn absolute_url(&self, url: &str, options: &UrlOptions) -> Result<String, Exception> {
        absolute_url(self.request, url, options)
    }
}

fn to_value<T: Serialize + ?Sized>(data: &T) -> Result<Value, Exception> {
    serde_json::to_value(data).map_err(|e| Exception::Serialize(e.to_string()))
}

/// `format` 参数为 `null` 或 `false` 时视同未提供，继续按 Accept 判断
fn resolve_format(params: &Params, request: &Request) -> String {
    match params.get("format") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            if request.accept() == Some(APPLICATION_JSON) {
                "json".to_string()
            } else {
                "html".to_string()
            }
        }
        Some(Value::String(format)) => format.clone(),
        Some(other) => other.to_string(),
    }
}

/// 一种 Action 的类级配置：filter 列表、日志目标、JSON 序列化器和参数合并顺序。
///
/// 在启动时构建一次，之后只读，可以在多个并发请求之间共享。
pub struct ActionConfig<A> {
    name: String,
    before_filters: FilterList<A>,
    after_filters: FilterList<A>,
    logger: Option<String>,
    serializer: Arc<dyn JsonSerializer>,
    precedence: ParamPrecedence,
}

impl<A: 'static> ActionConfig<A> {
    pub fn new() -> Self {
        Self {
            name: short_type_name::<A>(),
            before_filters: FilterList::new(),
            after_filters: FilterList::new(),
            logger: None,
            serializer: Arc::new(StandardJson),
            precedence: ParamPrecedence::default(),
        }
    }

    /// 派生一份同类型的配置，filter 列表按值复制
    pub fn inherit(&self) -> Self {
        self.clone()
    }

    /// 从嵌入类型 `P` 的配置派生 `A` 的配置。
    ///
    /// 父配置的 filter 保持原有顺序排在前面，日志目标、序列化器和参数合并顺序一并继承。
    pub fn extend<P: 'static>(parent: &ActionConfig<P>) -> Self
    where
        A: AsMut<P>,
    {
        Self {
            name: short_type_name::<A>(),
            before_filters: parent.before_filters.lift(),
            after_filters: parent.after_filters.lift(),
            logger: parent.logger.clone(),
            serializer: Arc::clone(&parent.serializer),
            precedence: parent.precedence,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn before_filter<F>(mut self, name: &str, filter: F) -> Self
    where
        F: Fn(&mut A, &mut ActionContext<'_>) -> Result<(), Exception> + Send + Sync + 'static,
    {
        self.before_filters.add(name, filter);
        self
    }

    pub fn after_filter<F>(mut self, name: &str, filter: F) -> Self
    where
        F: Fn(&mut A, &mut ActionContext<'_>) -> Result<(), Exception> + Send + Sync + 'static,
    {
        self.after_filters.add(name, filter);
        self
    }

    pub fn skip_before_filter(mut self, name: &str) -> Self {
        self.before_filters.skip(name);
        self
    }

    pub fn skip_after_filter(mut self, name: &str) -> Self {
        self.after_filters.skip(name);
        self
    }

    /// 设置 `log` 的目标名称。未设置时调用日志全部跳过。
    pub fn logger(mut self, target: &str) -> Self {
        self.logger = Some(target.to_string());
        self
    }

    pub fn json_serializer(mut self, serializer: impl JsonSerializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    pub fn param_precedence(mut self, precedence: ParamPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn before_filters(&self) -> &FilterList<A> {
        &self.before_filters
    }

    pub fn after_filters(&self) -> &FilterList<A> {
        &self.after_filters
    }

    pub fn before_filters_mut(&mut self) -> &mut FilterList<A> {
        &mut self.before_filters
    }

    pub fn after_filters_mut(&mut self) -> &mut FilterList<A> {
        &mut self.after_filters
    }

    pub fn logger_target(&self) -> Option<&str> {
        self.logger.as_deref()
    }

    pub fn action_name(&self) -> &str {
        &self.name
    }
}

impl<A: Action> ActionConfig<A> {
    /// 处理一次请求并返回已结束的响应
    pub fn call(&self, request: &Request) -> Result<Response, Exception> {
        let params = Params::resolve(request, self.serializer.as_ref(), self.precedence)?;
        let mut cx = ActionContext::new(request, params, Arc::clone(&self.serializer));
        let mut action = A::default();

        self.log_call(&cx);
        cx.response.set_header(CONTENT_TYPE, TEXT_HTML);
        self.run_before_filters(&mut action, &mut cx)?;
        self.run_respond(&mut action, &mut cx)?;
        self.run_after_filters(&mut action, &mut cx)?;
        Ok(cx.response.finish())
    }

    fn log_call(&self, cx: &ActionContext<'_>) {
        if let Some(target) = self.logger.as_deref() {
            debug!(
                target: target,
                "{} {} format: {:?}, params: {}",
                self.name,
                cx.request.method(),
                cx.format,
                cx.params
            );
        }
    }

    fn run_before_filters(
        &self,
        action: &mut A,
        cx: &mut ActionContext<'_>,
    ) -> Result<(), Exception> {
        for filter in self.before_filters.iter() {
            if let Some(target) = self.logger.as_deref() {
                debug!(target: target, "Running {} before filter", filter.name());
            }
            filter.run(action, cx)?;
            if !cx.response.is_empty() {
                if let Some(target) = self.logger.as_deref() {
                    debug!(target: target, "{} responded, halting filter chain", filter.name());
                }
                break;
            }
        }
        Ok(())
    }

    fn run_respond(&self, action: &mut A, cx: &mut ActionContext<'_>) -> Result<(), Exception> {
        if !cx.response.is_empty() {
            return Ok(());
        }

        let reply = action.respond(cx)?;

        // respond 自己写入了响应时丢弃返回值
        if cx.response.is_empty() {
            match reply {
                Reply::Text(text) => cx.write(text),
                Reply::Chunks(chunks) => {
                    for chunk in chunks {
                        cx.write(chunk);
                    }
                }
                Reply::Value(value) => cx.json(&value)?,
            }
        }
        Ok(())
    }

    fn run_after_filters(
        &self,
        action: &mut A,
        cx: &mut ActionContext<'_>,
    ) -> Result<(), Exception> {
        for filter in self.after_filters.iter() {
            if let Some(target) = self.logger.as_deref() {
                debug!(target: target, "Running {} after filter", filter.name());
            }
            filter.run(action, cx)?;
        }
        Ok(())
    }
}

impl<A: 'static> Default for ActionConfig<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for ActionConfig<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            before_filters: self.before_filters.clone(),
            after_filters: self.after_filters.clone(),
            logger: self.logger.clone(),
            serializer: Arc::clone(&self.serializer),
            precedence: self.precedence,
        }
    }
}

impl<A> fmt::Debug for ActionConfig<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionConfig")
            .field("name", &self.name)
            .field("before_filters", &self.before_filters)
            .field("after_filters", &self.after_filters)
            .field("logger", &self.logger)
            .field("precedence", &self.precedence)
            .finish()
    }
}

/// 不同类型 Action 的统一调用入口，便于外部服务器把它们放进同一张表
pub trait Endpoint: Send + Sync {
    fn call(&self, request: &Request) -> Result<Response, Exception>;
}

impl<A: Action> Endpoint for ActionConfig<A> {
    fn call(&self, request: &Request) -> Result<Response, Exception> {
        ActionConfig::call(self, request)
    }
}

fn short_type_name<A>() -> String {
    let full = type_name::<A>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
