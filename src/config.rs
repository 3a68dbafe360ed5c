// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default)]
    worker_threads: usize,
    /// 以该查询参数作为路由路径，未设置时使用请求路径
    #[serde(default)]
    route_var: Option<String>,
}

fn default_port() -> u16 {
    7878
}

fn default_local() -> bool {
    true
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: default_port(),
            local: default_local(),
            worker_threads: num_cpus::get(),
            route_var: None,
        }
    }

    /// 读取 TOML 配置文件，文件缺失或格式错误时使用默认配置
    pub fn from_toml(filename: &str) -> Self {
        match fs::read_to_string(filename) {
            Ok(s) => Self::from_toml_str(&s),
            Err(e) => {
                error!("无法读取配置文件{}：{}，使用默认配置", filename, e);
                Config::new()
            }
        }
    }

    pub fn from_toml_str(s: &str) -> Self {
        let mut raw_config: Config = match toml::from_str(s) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象：{}，使用默认配置", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.route_var.as_deref() == Some("") {
            warn!("route_var被设置为空字符串，将改为使用请求路径进行路由。");
            raw_config.route_var = None;
        }
        raw_config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn route_var(&self) -> Option<&str> {
        self.route_var.as_deref()
    }
}
