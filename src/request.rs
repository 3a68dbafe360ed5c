// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求模块
//!
//! 路由器所消费的请求抽象。它只暴露分发所需的最少信息：
//! 1. 请求方法与路径（不含查询字符串）。
//! 2. 查询字符串中的命名参数，可作为备用的路由来源。
//! 3. 由中间件读写的请求属性。
//!
//! 同时保留从原始字节解析请求行与常用标头的能力，供演示服务器使用。

use std::collections::HashMap;

use crate::{exception::Exception, param::*};
use log::error;

/// 表示一次分发所需的 HTTP 请求元数据。
#[derive(Debug, Clone)]
pub struct Request {
    /// 全局请求 ID，用于日志追踪
    id: u128,
    /// HTTP 请求方法
    method: HttpRequestMethod,
    /// 请求的资源路径（不含查询字符串）
    path: String,
    /// 查询字符串中的参数，保持出现顺序
    query: Vec<(String, String)>,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 客户端标识字符串
    user_agent: String,
    /// 客户端接受的内容类型（MIME）
    accept: Option<String>,
    /// 中间件与分发器写入的附加属性
    attributes: HashMap<String, String>,
}

impl Request {
    /// 以方法和 URI 直接构造请求，URI 可以携带查询字符串。
    pub fn new(method: HttpRequestMethod, uri: &str) -> Self {
        let (path, query) = split_uri(uri);
        Self {
            id: 0,
            method,
            path,
            query,
            version: HttpVersion::V1_1,
            user_agent: String::new(),
            accept: None,
            attributes: HashMap::new(),
        }
    }

    /// 设置请求 ID
    pub fn with_id(mut self, id: u128) -> Self {
        self.id = id;
        self
    }

    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 验证编码：确保请求数据是合法的 UTF-8 字符串。
    /// 2. 解析请求行：提取方法、路径和协议版本。
    /// 3. 迭代解析标头：识别 `User-Agent` 与 `Accept`。
    ///
    /// # 错误处理
    /// 如果请求格式不符合 HTTP 规范或使用了不支持的方法/版本，将返回相应的 `Exception`。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string.trim_end_matches('\0'),
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let request_lines: Vec<&str> = request_string.split(CRLF).collect();

        // 请求行，例如 "GET /index.html HTTP/1.1"
        let first_line_parts: Vec<&str> = request_lines[0].split(' ').collect();

        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::UnSupportedRequestMethod);
        }

        let method: HttpRequestMethod = match first_line_parts[0].parse() {
            Ok(m) => m,
            Err(e) => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, first_line_parts[0]);
                return Err(e);
            }
        };

        let version_str = first_line_parts[first_line_parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 路径中可能包含空格（不规范），通过 join 尝试恢复
        let uri = first_line_parts[1..first_line_parts.len() - 1].join(" ");

        let mut request = Self::new(method, &uri).with_id(id);
        request.version = version;

        for line in &request_lines[1..] {
            if line.is_empty() {
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_lowercase().as_str() {
                "user-agent" => request.user_agent = value.to_string(),
                "accept" => request.accept = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(request)
    }
}

/// 将 URI 拆分为路径与查询参数，不做百分号解码。
fn split_uri(uri: &str) -> (String, Vec<(String, String)>) {
    let (path, query_string) = match uri.split_once('?') {
        Some((p, q)) => (p, q),
        None => (uri, ""),
    };
    let query = query_string
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect();
    (path.to_string(), query)
}

impl Request {
    /// 获取请求 ID
    pub fn id(&self) -> u128 {
        self.id
    }

    /// 获取 HTTP 协议版本
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// 获取请求路径（不含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取用户代理字符串
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// 获取客户端接受的 MIME 类型
    pub fn accept(&self) -> Option<&String> {
        self.accept.as_ref()
    }

    /// 按名称查找查询参数，同名参数取第一个
    pub fn get(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 读取请求属性
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// 写入请求属性，已存在时覆盖
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}
