// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由协议参数与常量模块
//!
//! 该模块定义了路由器遵循的 HTTP 协议相关常量和数据结构，包括：
//! - 路由模式的分隔符、参数标记与通配方法。
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - HTTP 方法与版本的强类型枚举。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;

use crate::exception::Exception;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "trie-router";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 路由模式中的段分隔符
pub const SEPARATOR: char = '/';

/// 路由模式中被视为额外分隔符的字符
pub const DOT: char = '.';

/// 捕获段的前缀标记，例如 `/users/:id`
pub const PARAMETER: char = ':';

/// `"Class@method"` 形式控制器回调的分隔符
pub const AT: char = '@';

/// 匹配任意请求方法的通配方法名
pub const ANY: &str = "ANY";

/// JSON 响应使用的内容类型
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";

/// 纯文本（原始值）响应使用的内容类型
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=UTF-8";

lazy_static! {
    /// 提供便捷注册函数的标准 HTTP 方法列表。
    pub static ref STANDARD_METHODS: Vec<HttpRequestMethod> = {
        vec![
            HttpRequestMethod::Get,
            HttpRequestMethod::Post,
            HttpRequestMethod::Put,
            HttpRequestMethod::Patch,
            HttpRequestMethod::Delete,
            HttpRequestMethod::Trace,
            HttpRequestMethod::Connect,
            HttpRequestMethod::Head,
            HttpRequestMethod::Options,
        ]
    };
}

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 2xx: 成功响应 (Successful)
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(204, "No Content");

        // 3xx: 重定向 (Redirection)
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(307, "Temporary Redirect");
        map.insert(308, "Permanent Redirect");

        // 4xx: 客户端错误 (Client Error)
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(406, "Not Acceptable");
        map.insert(408, "Request Timeout");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(413, "Content Too Large");
        map.insert(415, "Unsupported Media Type");
        map.insert(418, "I'm a teapot");
        map.insert(422, "Unprocessable Content");
        map.insert(429, "Too Many Requests");

        // 5xx: 服务端错误 (Server Error)
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpVersion {
    /// HTTP/1.0 版本
    V1_0,
    /// HTTP/1.1 版本
    V1_1,
}

/// 标准 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpRequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Trace,
    Connect,
    Head,
    Options,
}

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "1.0"),
            HttpVersion::V1_1 => write!(f, "1.1"),
        }
    }
}

impl HttpRequestMethod {
    /// HTTP 标准大写方法名
    pub fn as_str(&self) -> &'static str {
        match *self {
            HttpRequestMethod::Get => "GET",
            HttpRequestMethod::Post => "POST",
            HttpRequestMethod::Put => "PUT",
            HttpRequestMethod::Patch => "PATCH",
            HttpRequestMethod::Delete => "DELETE",
            HttpRequestMethod::Trace => "TRACE",
            HttpRequestMethod::Connect => "CONNECT",
            HttpRequestMethod::Head => "HEAD",
            HttpRequestMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpRequestMethod {
    type Err = Exception;

    /// 方法名大小写不敏感
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        STANDARD_METHODS
            .iter()
            .copied()
            .find(|m| m.as_str() == upper)
            .ok_or(Exception::UnSupportedRequestMethod)
    }
}
