// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由树
//!
//! 以路径段为键的前缀树。每个节点包含：
//! - 字面量子节点表，精确且区分大小写地匹配一个段；
//! - 参数分支，按注册顺序保存捕获名到子节点的映射，同一深度允许多个不同的捕获名；
//! - 终端节点上按请求方法保存的处理器记录。
//!
//! 解析时优先尝试字面量子节点；字面量命中后不再回退到参数分支。
//! 参数分支按注册顺序深度优先尝试，第一个成功的分支胜出。
//! 多个同深度捕获名互相重叠时，匹配结果只由注册顺序决定，调用方不应依赖这种优先级。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::debug;
use serde_derive::{Deserialize, Serialize};

use crate::{
    exception::Exception,
    param::{ANY, PARAMETER},
    route::Route,
    util::tokenize,
};

/// 解析过程中捕获的参数，按下降顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(Vec<(String, String)>);

impl Captures {
    /// 写入捕获值；同名捕获保留原位置并覆盖值
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 一次成功匹配
#[derive(Debug, Clone)]
pub struct RouteMatch {
    route: Arc<Route>,
    captures: Captures,
}

impl RouteMatch {
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn captures(&self) -> &Captures {
        &self.captures
    }
}

/// 解析结果
#[derive(Debug, Clone)]
pub enum Resolution {
    Matched(RouteMatch),
    /// 路径存在，但没有为该方法注册处理器；携带该节点允许的方法
    MethodNotAllowed(Vec<String>),
    NotFound,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Node {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    literals: HashMap<String, Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    params: Vec<(String, Node)>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    handlers: BTreeMap<String, Arc<Route>>,
}

impl Node {
    fn child(&mut self, token: &str) -> &mut Node {
        match token.strip_prefix(PARAMETER) {
            Some(name) => {
                let index = match self.params.iter().position(|(n, _)| n == name) {
                    Some(index) => index,
                    None => {
                        self.params.push((name.to_string(), Node::default()));
                        self.params.len() - 1
                    }
                };
                &mut self.params[index].1
            }
            None => self.literals.entry(token.to_string()).or_default(),
        }
    }

    fn descend(
        &self,
        tokens: &[String],
        method: &str,
        captures: Captures,
        allowed: &mut Option<Vec<String>>,
    ) -> Option<RouteMatch> {
        let Some((token, rest)) = tokens.split_first() else {
            return self.find_handler(method, captures, allowed);
        };

        if let Some(child) = self.literals.get(token) {
            return child.descend(rest, method, captures, allowed);
        }

        for (name, child) in &self.params {
            let mut branch = captures.clone();
            branch.insert(name, token);
            if let Some(found) = child.descend(rest, method, branch, allowed) {
                return Some(found);
            }
        }
        None
    }

    fn find_handler(
        &self,
        method: &str,
        captures: Captures,
        allowed: &mut Option<Vec<String>>,
    ) -> Option<RouteMatch> {
        if self.handlers.is_empty() {
            return None;
        }
        match self.handlers.get(method).or_else(|| self.handlers.get(ANY)) {
            Some(route) => Some(RouteMatch {
                route: Arc::clone(route),
                captures,
            }),
            None => {
                if allowed.is_none() {
                    *allowed = Some(self.handlers.keys().cloned().collect());
                }
                None
            }
        }
    }

    fn count(&self) -> usize {
        self.handlers.len()
            + self.literals.values().map(Node::count).sum::<usize>()
            + self.params.iter().map(|(_, n)| n.count()).sum::<usize>()
    }
}

/// 路由树
///
/// 注册阶段通过 `&mut` 独占构建，之后只读，可在多个线程间共享。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteTree {
    root: Node,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在 `route.pattern()` 对应的终端节点上为 `route.methods()` 中每个方法保存记录，
    /// 同一方法重复注册时后者覆盖前者
    pub fn insert(&mut self, route: Route) {
        let route = Arc::new(route);
        let mut node = &mut self.root;
        for token in tokenize(route.pattern()) {
            node = node.child(&token);
        }
        for method in route.methods() {
            node.handlers.insert(method.to_uppercase(), Arc::clone(&route));
        }
    }

    /// 解析路径与方法，方法大小写不敏感
    pub fn resolve(&self, path: &str, method: &str) -> Resolution {
        let tokens = tokenize(path);
        let method = method.to_uppercase();
        let mut allowed = None;
        match self
            .root
            .descend(&tokens, &method, Captures::default(), &mut allowed)
        {
            Some(found) => Resolution::Matched(found),
            None => match allowed {
                Some(allowed) => Resolution::MethodNotAllowed(allowed),
                None => Resolution::NotFound,
            },
        }
    }

    /// 已注册的（方法, 记录）条目数
    pub fn len(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 导出为 JSON，闭包回调无法导出
    pub fn export(&self) -> Result<String, Exception> {
        let blob = serde_json::to_string(self).map_err(|e| Exception::TreeEncoding(e.to_string()))?;
        debug!("路由树已导出，{}字节", blob.len());
        Ok(blob)
    }

    pub fn import(blob: &str) -> Result<Self, Exception> {
        serde_json::from_str(blob).map_err(|e| Exception::TreeEncoding(e.to_string()))
    }
}
