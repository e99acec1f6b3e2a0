// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::exception::Exception;
use log::warn;
use std::fs;

/// 示例服务器的运行配置
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_server_name")]
    server_name: String,
    port: u16,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_local")]
    local: bool,
    /// 服务器位于 TLS 终止代理之后时设为 true，用于生成 https 绝对 URL
    #[serde(default)]
    https: bool,
    #[serde(default = "default_log_config")]
    log_config: String,
}

fn default_server_name() -> String {
    "localhost".to_string()
}

fn default_local() -> bool {
    true
}

fn default_log_config() -> String {
    "config/log4rs.yaml".to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_name: default_server_name(),
            port: 7878,
            worker_threads: num_cpus::get(),
            local: default_local(),
            https: false,
            log_config: default_log_config(),
        }
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let str_val = fs::read_to_string(filename)
            .map_err(|e| Exception::ConfigFile(format!("{}: {}", filename, e)))?;
        Self::parse(&str_val)
    }

    pub fn parse(str_val: &str) -> Result<Self, Exception> {
        let mut raw_config: Config =
            toml::from_str(str_val).map_err(|e| Exception::ConfigFile(e.to_string()))?;
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.port == 0 {
            warn!("port被设置为0，将由操作系统分配随机端口");
        }
        Ok(raw_config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn https(&self) -> bool {
        self.https
    }

    pub fn scheme(&self) -> &str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }

    pub fn log_config(&self) -> &str {
        &self.log_config
    }
}
