// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了路由器在注册与分发生命周期中可能抛出的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了请求报文解析错误、路由匹配错误、回调解析错误以及中间件查找错误。
//! - **语义映射**：通过 [`Exception::status_code`] 将变体映射为 HTTP 状态码，由嵌入方构建响应。
//! - **不做吞并**：处理器与中间件返回的错误原样向上传递，本模块只负责描述。

use std::fmt;

/// 路由器处理请求过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 客户端使用了无法识别的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 路由树中不存在与请求路径匹配的路由。对应 `404 Not Found`。
    ResourceNotFound,
    /// 路径匹配成功，但该节点未注册当前请求方法。携带允许的方法集合，对应 `405`。
    MethodNotAllowed(Vec<String>),
    /// `"Class@method"` 形式的回调字符串格式不正确。
    InvalidCallback(String),
    /// 容器无法构造指定的控制器类型。
    ControllerNotFound(String),
    /// 控制器实例上不存在指定的方法：(类型, 方法)。
    ControllerMethodNotFound(String, String),
    /// 容器中未注册该标识对应的中间件。
    MiddlewareNotFound(String),
    /// 路由树导出或导入时的编码错误。
    TreeEncoding(String),
    /// 处理器或中间件自身报告的失败。
    HandlerFailed(String),
}

use Exception::*;

impl Exception {
    /// 嵌入方构建错误响应时使用的 HTTP 状态码。
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8 | UnSupportedRequestMethod | UnsupportedHttpVersion => 400,
            ResourceNotFound => 404,
            MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }

    /// 若为 405 异常，返回允许的方法集合。
    pub fn allowed_methods(&self) -> Option<&[String]> {
        match self {
            MethodNotAllowed(allowed) => Some(allowed),
            _ => None,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            ResourceNotFound => write!(f, "Resource not found (404)"),
            MethodNotAllowed(allowed) => {
                write!(f, "Method not allowed (405), allowed: {}", allowed.join(", "))
            }
            InvalidCallback(callback) => {
                write!(f, "Invalid callback '{}', expected 'Class@method'", callback)
            }
            ControllerNotFound(class) => write!(f, "Controller '{}' can't be made", class),
            ControllerMethodNotFound(class, method) => {
                write!(f, "Call to undefined method {}::{}()", class, method)
            }
            MiddlewareNotFound(name) => write!(f, "Middleware '{}' is not registered", name),
            TreeEncoding(reason) => write!(f, "Route tree encoding failed: {}", reason),
            HandlerFailed(reason) => write!(f, "Handler failed: {}", reason),
        }
    }
}

impl std::error::Error for Exception {}
