// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 示例服务器
//!
//! 基于 Tokio 的最小 HTTP/1.1 适配层，用来演示如何把 `ActionConfig` 挂到真实连接上：
//! - 读取并解析请求报文
//! - 按路径精确匹配到 Action（路由本身不属于 Action 层）
//! - 把 Action 返回的错误转换为 500 响应
//! - 序列化并发送响应

use webaction::{
    param::{CONTENT_LENGTH, HOST}, Action, ActionConfig, ActionContext, Config, Endpoint, Exception,
    Reply, Request, Response, UrlOptions,
};

use log::{debug, error, info};
use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    runtime::Builder,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
    time::Instant,
};

const MAX_REQUEST_SIZE: usize = 1024 * 1024;

type RouteTable = Vec<(&'static str, Box<dyn Endpoint>)>;

#[derive(Default)]
struct Home;

impl Action for Home {}

#[derive(Default)]
struct Greeting;

impl Action for Greeting {
    fn respond(&mut self, cx: &mut ActionContext<'_>) -> Result<Reply, Exception> {
        let name = cx.params().get_str("name").unwrap_or_else(|| "world".to_string());
        if cx.format() == "json" {
            return Ok(json!({ "hello": name }).into());
        }
        Ok(format!("<h1>Hello, {}!</h1>", name).into())
    }
}

#[derive(Default)]
struct Admin {
    user: Option<String>,
}

impl Admin {
    fn login_required(&mut self, cx: &mut ActionContext<'_>) -> Result<(), Exception> {
        self.user = cx.params().get_str("user");
        if self.user.is_none() {
            cx.redirect_to("/login", &UrlOptions::new())?;
        }
        Ok(())
    }

    fn no_cache(&mut self, cx: &mut ActionContext<'_>) -> Result<(), Exception> {
        cx.response_mut().set_header("Cache-Control", "no-store");
        Ok(())
    }
}

impl Action for Admin {
    fn respond(&mut self, cx: &mut ActionContext<'_>) -> Result<Reply, Exception> {
        let body = json!({ "user": self.user, "path": cx.request().path() });
        cx.pretty_json(&body)?;
        Ok(().into())
    }
}

fn routes() -> RouteTable {
    let admin = ActionConfig::<Admin>::new()
        .logger("webaction::admin")
        .before_filter("login_required", Admin::login_required)
        .after_filter("no_cache", Admin::no_cache);
    vec![
        ("/", Box::new(ActionConfig::<Home>::new().logger("webaction")) as Box<dyn Endpoint>),
        ("/hello", Box::new(ActionConfig::<Greeting>::new().logger("webaction"))),
        ("/admin", Box::new(admin)),
    ]
}

fn main() {
    // 1. 环境配置加载：从 TOML 文件读取运行参数
    let config = match Config::from_toml("config/development.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}，使用默认配置", e);
            Config::new()
        }
    };

    // 2. 初始化日志系统：log4rs 通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file(config.log_config(), Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }
    info!("配置文件已载入");

    // 3. 异步运行时：根据配置文件分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            return;
        }
    };

    runtime.block_on(serve(Arc::new(config), Arc::new(routes())));
}

async fn serve(config: Arc<Config>, routes: Arc<RouteTable>) {
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let socket = SocketAddrV4::new(address, config.port());

    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", config.port(), e);
            return;
        }
    };
    info!("服务端在{}上监听Socket连接", socket);

    let mut id: u128 = 0;
    loop {
        let (mut stream, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("接受连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]新的连接：{}", id, addr);

        let config = Arc::clone(&config);
        let routes = Arc::clone(&routes);
        tokio::spawn(async move {
            handle_connection(&mut stream, id, &config, &routes).await;
        });
        id += 1;
    }
}

/// # 连接处理器
///
/// 读取完整的请求报文，调用匹配的 Action，并发送响应。
async fn handle_connection(stream: &mut TcpStream, id: u128, config: &Config, routes: &RouteTable) {
    let buffer = match read_request(stream, id).await {
        Some(buffer) => buffer,
        None => return,
    };
    let start_time = Instant::now();

    let request = match Request::try_from(&buffer, id) {
        Ok(req) if req.header(HOST).is_none() => req
            .with_scheme(config.scheme())
            .with_server(config.server_name(), config.port()),
        Ok(req) => req.with_scheme(config.scheme()),
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {}", id, e);
            let _ = stream.write_all(&status_response(400).as_bytes()).await;
            return;
        }
    };

    let response = match routes.iter().find(|(path, _)| *path == request.path()) {
        Some((_, endpoint)) => match endpoint.call(&request) {
            Ok(response) => response,
            Err(e) => {
                error!("[ID{}]处理请求时发生异常: {}", id, e);
                status_response(500)
            }
        },
        None => status_response(404),
    };

    info!(
        "[ID{}] {}, {}, {}, {}, {}ms",
        id,
        request.version(),
        request.method(),
        request.path(),
        response.status_code(),
        start_time.elapsed().as_millis()
    );

    let _ = stream.write_all(&response.as_bytes()).await;
    let _ = stream.flush().await;
}

/// 读到报文头结束，再按 `Content-Length` 读完请求体
async fn read_request(stream: &mut TcpStream, id: u128) -> Option<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunk = vec![0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) => return None,
            Ok(n) => n,
            Err(e) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return None;
            }
        };
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.len() > MAX_REQUEST_SIZE {
            error!("[ID{}]请求报文过大", id);
            return None;
        }
        if let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buffer[..end]);
            let length = head
                .split("\r\n")
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case(CONTENT_LENGTH))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buffer.len() >= end + 4 + length {
                return Some(buffer);
            }
        }
    }
}

fn status_response(code: u16) -> Response {
    let mut response = Response::new();
    response.set_status(code).write("");
    response.finish()
}
