// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 参数绑定模块
//!
//! 按处理器声明的参数顺序逐个取值，优先级为：
//! 1. 与捕获段同名的路径参数；
//! 2. 声明了类型且容器能提供的实例；
//! 3. 声明的默认值；
//! 4. 以上都没有时停止绑定，只返回已经得到的参数。
//!
//! 参数不足不会报错，由处理器自行处理缺失的尾部参数。

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use log::trace;
use serde_json::Value;

use crate::{container::Container, route::Param, tree::Captures};

/// 绑定得到的单个实参
#[derive(Clone)]
pub enum Argument {
    /// 路径中捕获的值
    Captured(String),
    /// 容器按类型提供的实例
    Service(Arc<dyn Any + Send + Sync>),
    /// 参数声明中的默认值
    Default(Value),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Captured(v) => write!(f, "Captured({:?})", v),
            Argument::Service(_) => write!(f, "Service"),
            Argument::Default(v) => write!(f, "Default({})", v),
        }
    }
}

/// 按声明顺序排列的实参列表，可能短于参数声明
#[derive(Debug, Clone, Default)]
pub struct Arguments(Vec<Argument>);

impl Arguments {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.0.iter()
    }

    /// 以字符串读取第 `index` 个实参：捕获值，或字符串类型的默认值
    pub fn str(&self, index: usize) -> Option<&str> {
        match self.0.get(index)? {
            Argument::Captured(v) => Some(v),
            Argument::Default(Value::String(v)) => Some(v),
            _ => None,
        }
    }

    /// 以 JSON 值读取第 `index` 个实参，容器实例没有值表示
    pub fn value(&self, index: usize) -> Option<Value> {
        match self.0.get(index)? {
            Argument::Captured(v) => Some(Value::String(v.clone())),
            Argument::Default(v) => Some(v.clone()),
            Argument::Service(_) => None,
        }
    }

    /// 取出第 `index` 个实参中类型为 `T` 的容器实例
    pub fn service<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
        match self.0.get(index)? {
            Argument::Service(s) => Arc::clone(s).downcast::<T>().ok(),
            _ => None,
        }
    }
}

/// 为参数声明 `params` 生成实参列表
pub fn bind(params: &[Param], captures: &Captures, container: &dyn Container) -> Arguments {
    let mut arguments = Vec::with_capacity(params.len());
    for param in params {
        if let Some(value) = captures.get(param.name()) {
            arguments.push(Argument::Captured(value.to_string()));
        } else if let Some(service) = param.type_name().and_then(|t| container.resolve(t)) {
            arguments.push(Argument::Service(service));
        } else if let Some(default) = param.default_value() {
            arguments.push(Argument::Default(default.clone()));
        } else {
            trace!("参数{}无法绑定，截断为{}个实参", param.name(), arguments.len());
            break;
        }
    }
    Arguments(arguments)
}
