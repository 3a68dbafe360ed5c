// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由组
//!
//! 注册阶段的作用域属性栈。`Router::group` 调用期间压入一层属性，
//! 在其中注册的每条路由都会合并栈上所有层的中间件。

/// 一层路由组属性
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupAttributes {
    middleware: Vec<String>,
}

impl GroupAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以中间件列表构造
    pub fn middleware<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            middleware: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn middleware_list(&self) -> &[String] {
        &self.middleware
    }
}

/// 当前生效的路由组栈，外层在前
#[derive(Debug, Default)]
pub struct GroupStack {
    frames: Vec<GroupAttributes>,
}

impl GroupStack {
    pub fn push(&mut self, attributes: GroupAttributes) {
        self.frames.push(attributes);
    }

    pub fn pop(&mut self) -> Option<GroupAttributes> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// 计算一条路由最终的中间件列表
    ///
    /// 组中间件（由外到内）在前，路由自身的中间件在后；去重时保留首次出现的位置，
    /// 最后移除 `clear` 中列出的项。
    pub fn merge(&self, route_middleware: &[&str], clear: &[&str]) -> Vec<String> {
        let mut merged: Vec<String> = Vec::new();
        let candidates = self
            .frames
            .iter()
            .flat_map(|frame| frame.middleware.iter().map(String::as_str))
            .chain(route_middleware.iter().copied());
        for name in candidates {
            if !merged.iter().any(|m| m == name) {
                merged.push(name.to_string());
            }
        }
        merged.retain(|m| !clear.contains(&m.as_str()));
        merged
    }
}
