// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 容器模块
//!
//! 路由器通过 [`Container`] 获取三类协作者：
//! - 以类型名构造的控制器实例（用于 `"Class@method"` 回调）；
//! - 以类型名解析的服务实例（用于带类型的参数绑定）；
//! - 以标识符查找的中间件。
//!
//! [`ServiceContainer`] 是基于哈希表的简单实现，嵌入方也可以接入自己的容器。

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    binder::Arguments,
    exception::Exception,
    pipeline::{Middleware, Next},
    request::Request,
    route::{Param, Reply},
};

/// 可被 `"Class@method"` 回调调用的控制器
pub trait Controller: Send + Sync {
    /// 方法的参数声明，方法不存在时返回 `None`
    fn signature(&self, method: &str) -> Option<Vec<Param>>;

    /// 以绑定好的实参调用方法
    fn call(&self, method: &str, request: &Request, args: Arguments) -> Result<Reply, Exception>;
}

pub trait Container: Send + Sync {
    /// 构造控制器实例
    fn make(&self, class: &str) -> Result<Arc<dyn Controller>, Exception>;

    /// 按类型名解析服务实例
    fn resolve(&self, type_name: &str) -> Option<Arc<dyn Any + Send + Sync>>;

    fn has(&self, type_name: &str) -> bool {
        self.resolve(type_name).is_some()
    }

    /// 按标识符查找中间件
    fn middleware(&self, name: &str) -> Option<Arc<dyn Middleware>>;
}

type Factory = Arc<dyn Fn(&ServiceContainer) -> Arc<dyn Controller> + Send + Sync>;

#[derive(Default)]
pub struct ServiceContainer {
    controllers: HashMap<String, Factory>,
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
    middleware: HashMap<String, Arc<dyn Middleware>>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册控制器工厂，每次 `make` 都会构造新实例
    pub fn bind_controller<F, C>(&mut self, class: &str, factory: F) -> &mut Self
    where
        F: Fn(&ServiceContainer) -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        let make: Factory = Arc::new(move |container: &ServiceContainer| -> Arc<dyn Controller> {
            Arc::new(factory(container))
        });
        self.controllers.insert(class.to_string(), make);
        self
    }

    /// 注册共享的服务实例
    pub fn bind_instance<T: Any + Send + Sync>(&mut self, type_name: &str, instance: T) -> &mut Self {
        self.services.insert(type_name.to_string(), Arc::new(instance));
        self
    }

    pub fn bind_middleware<M: Middleware + 'static>(&mut self, name: &str, middleware: M) -> &mut Self {
        self.middleware.insert(name.to_string(), Arc::new(middleware));
        self
    }

    /// 以闭包注册中间件
    pub fn bind_middleware_fn<F>(&mut self, name: &str, middleware: F) -> &mut Self
    where
        F: Fn(Request, Next<'_>) -> Result<Reply, Exception> + Send + Sync + 'static,
    {
        self.middleware.insert(name.to_string(), Arc::new(middleware));
        self
    }
}

impl Container for ServiceContainer {
    fn make(&self, class: &str) -> Result<Arc<dyn Controller>, Exception> {
        match self.controllers.get(class) {
            Some(factory) => Ok(factory(self)),
            None => Err(Exception::ControllerNotFound(class.to_string())),
        }
    }

    fn resolve(&self, type_name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.services.get(type_name).cloned()
    }

    fn middleware(&self, name: &str) -> Option<Arc<dyn Middleware>> {
        self.middleware.get(name).cloned()
    }
}
