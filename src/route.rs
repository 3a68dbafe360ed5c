// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由记录模块
//!
//! 定义注册到路由树终端节点上的处理器记录：
//! - [`Callback`]：直接可调用的闭包，或在注册时解析好的 `"Class@method"` 控制器引用。
//! - [`Param`]：处理器声明的参数描述（名称、可选类型、可选默认值），供参数绑定使用。
//! - [`Route`]：注册后不可变的记录，包含回调、合并后的中间件列表、方法集合与原始模式。
//! - [`Reply`]：处理器与中间件的返回值，由分发器统一转换为响应。

use std::fmt;
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    binder::Arguments, exception::Exception, param::AT, request::Request, response::Response,
};

/// 处理器闭包的统一签名
pub type HandlerFn = dyn Fn(&Request, Arguments) -> Result<Reply, Exception> + Send + Sync;

/// 处理器回调
#[derive(Clone, Serialize, Deserialize)]
pub enum Callback {
    /// 直接可调用的闭包，无法导出
    #[serde(skip)]
    Closure(Arc<HandlerFn>),
    /// 通过容器构造 `class` 后调用其 `method`
    Controller { class: String, method: String },
}

impl Callback {
    /// 解析 `"Class@method"` 形式的控制器回调
    pub fn parse(callback: &str) -> Result<Self, Exception> {
        match callback.split_once(AT) {
            Some((class, method)) if !class.is_empty() && !method.is_empty() => {
                Ok(Callback::Controller {
                    class: class.to_string(),
                    method: method.to_string(),
                })
            }
            _ => Err(Exception::InvalidCallback(callback.to_string())),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Closure(_) => write!(f, "Closure"),
            Callback::Controller { class, method } => write!(f, "{}{}{}", class, AT, method),
        }
    }
}

/// 处理器声明的单个参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
}

impl Param {
    /// 仅按名称绑定的参数
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: None,
            default: None,
        }
    }

    /// 声明了类型的参数，可由容器提供实例
    pub fn typed(name: &str, type_name: &str) -> Self {
        Self {
            type_name: Some(type_name.to_string()),
            ..Self::named(name)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// 回调与其参数描述
///
/// 控制器回调的参数描述由控制器自身提供，这里的 `params` 只对闭包生效。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handler {
    callback: Callback,
    #[serde(default)]
    params: Vec<Param>,
}

impl Handler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Request, Arguments) -> Result<Reply, Exception> + Send + Sync + 'static,
    {
        Self {
            callback: Callback::Closure(Arc::new(callback)),
            params: Vec::new(),
        }
    }

    /// 从 `"Class@method"` 字符串创建控制器处理器
    pub fn controller(callback: &str) -> Result<Self, Exception> {
        Ok(Self {
            callback: Callback::parse(callback)?,
            params: Vec::new(),
        })
    }

    /// 追加一个参数声明，顺序即调用时的参数顺序
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

/// 注册后不可变的处理器记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    handler: Handler,
    middleware: Vec<String>,
    methods: Vec<String>,
    pattern: String,
}

impl Route {
    pub fn new(handler: Handler, middleware: Vec<String>, methods: Vec<String>, pattern: &str) -> Self {
        Self {
            handler,
            middleware,
            methods,
            pattern: pattern.to_string(),
        }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// 处理器或中间件的返回值
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 已经构建好的响应，原样返回
    Response(Response),
    /// 结构化值
    Json(Value),
    /// 原始值，作为响应体
    Raw(String),
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

impl From<String> for Reply {
    fn from(raw: String) -> Self {
        Reply::Raw(raw)
    }
}

impl From<&str> for Reply {
    fn from(raw: &str) -> Self {
        Reply::Raw(raw.to_string())
    }
}
