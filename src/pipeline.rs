// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 中间件管道
//!
//! 洋葱模型：列表中的第一个中间件位于最外层，终端处理器位于最内层。
//! 每个中间件拿到请求和 [`Next`]，可以在调用 `next` 之前改写请求、
//! 在其返回之后处理结果，或者干脆不调用 `next` 直接返回（短路）。
//!
//! `Next::run` 按值消费自身，因此同一层不会被进入两次；
//! 进入顺序与列表顺序一致，返回顺序严格相反。错误原样向外传递。

use std::sync::Arc;

use log::debug;

use crate::{container::Container, exception::Exception, request::Request, route::Reply};

/// 中间件接口
pub trait Middleware: Send + Sync {
    fn handle(&self, request: Request, next: Next<'_>) -> Result<Reply, Exception>;
}

impl<F> Middleware for F
where
    F: Fn(Request, Next<'_>) -> Result<Reply, Exception> + Send + Sync,
{
    fn handle(&self, request: Request, next: Next<'_>) -> Result<Reply, Exception> {
        self(request, next)
    }
}

/// 剩余的中间件与终端处理器
pub struct Next<'a> {
    stack: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Fn(Request) -> Result<Reply, Exception>,
}

impl Next<'_> {
    /// 调用下一层
    pub fn run(self, request: Request) -> Result<Reply, Exception> {
        match self.stack.split_first() {
            Some((middleware, rest)) => middleware.handle(
                request,
                Next {
                    stack: rest,
                    terminal: self.terminal,
                },
            ),
            None => (self.terminal)(request),
        }
    }
}

/// 将闭包包装为中间件对象
pub fn from_fn<F>(middleware: F) -> Arc<dyn Middleware>
where
    F: Fn(Request, Next<'_>) -> Result<Reply, Exception> + Send + Sync + 'static,
{
    Arc::new(middleware)
}

#[derive(Default)]
pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 通过容器按标识符解析整条中间件列表，任何一个缺失都会失败
    pub fn through(names: &[String], container: &dyn Container) -> Result<Self, Exception> {
        let mut pipeline = Self::new();
        for name in names {
            match container.middleware(name) {
                Some(middleware) => {
                    pipeline.pipe(middleware);
                }
                None => return Err(Exception::MiddlewareNotFound(name.clone())),
            }
        }
        debug!("中间件管道已构建：[{}]", names.join(", "));
        Ok(pipeline)
    }

    /// 在最内层追加一个中间件
    pub fn pipe(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// 以 `request` 为初始值执行整条管道，`terminal` 位于最内层
    pub fn then<F>(&self, request: Request, terminal: F) -> Result<Reply, Exception>
    where
        F: Fn(Request) -> Result<Reply, Exception>,
    {
        Next {
            stack: &self.middleware,
            terminal: &terminal,
        }
        .run(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceContainer;
    use crate::param::HttpRequestMethod;
    use std::sync::Mutex;

    /// 记录进入与返回顺序的中间件
    struct Trace {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Trace {
        fn handle(&self, request: Request, next: Next<'_>) -> Result<Reply, Exception> {
            self.log.lock().unwrap().push(format!("{}:in", self.name));
            let result = next.run(request);
            self.log.lock().unwrap().push(format!("{}:out", self.name));
            result
        }
    }

    fn request() -> Request {
        Request::new(HttpRequestMethod::Get, "/")
    }

    fn traced(names: &[&'static str], log: &Arc<Mutex<Vec<String>>>) -> Pipeline {
        let mut pipeline = Pipeline::new();
        for &name in names {
            pipeline.pipe(Arc::new(Trace {
                name,
                log: Arc::clone(log),
            }));
        }
        pipeline
    }

    #[test]
    fn test_empty_pipeline_calls_terminal() {
        let pipeline = Pipeline::new();
        let reply = pipeline.then(request(), |_| Ok(Reply::from("done"))).unwrap();
        assert_eq!(reply, Reply::from("done"));
        assert!(pipeline.is_empty());
    }

    /// 第一个中间件最外层，返回顺序严格相反
    #[test]
    fn test_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = traced(&["a", "b", "c"], &log);

        let terminal_log = Arc::clone(&log);
        pipeline
            .then(request(), move |_| {
                terminal_log.lock().unwrap().push("handler".to_string());
                Ok(Reply::from("ok"))
            })
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:in", "b:in", "c:in", "handler", "c:out", "b:out", "a:out"]
        );
    }

    #[test]
    fn test_short_circuit_skips_inner_layers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = traced(&["outer"], &log);
        pipeline.pipe(from_fn(|_, _| Ok(Reply::from("blocked"))));
        pipeline.pipe(Arc::new(Trace {
            name: "inner",
            log: Arc::clone(&log),
        }));

        let reply = pipeline
            .then(request(), |_| panic!("terminal must not run"))
            .unwrap();

        assert_eq!(reply, Reply::from("blocked"));
        assert_eq!(*log.lock().unwrap(), vec!["outer:in", "outer:out"]);
    }

    /// 中间件改写请求，终端处理器看到改写后的值；返回后再改写结果
    #[test]
    fn test_transform_before_and_after() {
        let mut pipeline = Pipeline::new();
        pipeline.pipe(from_fn(|mut request, next| {
            request.set_attribute("user", "alice");
            match next.run(request)? {
                Reply::Raw(body) => Ok(Reply::Raw(format!("[{}]", body))),
                other => Ok(other),
            }
        }));

        let reply = pipeline
            .then(request(), |request| {
                Ok(Reply::from(request.attribute("user").unwrap_or("anonymous")))
            })
            .unwrap();

        assert_eq!(reply, Reply::from("[alice]"));
    }

    #[test]
    fn test_errors_propagate_through_stack() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = traced(&["a", "b"], &log);

        let result = pipeline.then(request(), |_| {
            Err(Exception::HandlerFailed("boom".to_string()))
        });

        assert_eq!(result, Err(Exception::HandlerFailed("boom".to_string())));
        assert_eq!(*log.lock().unwrap(), vec!["a:in", "b:in", "b:out", "a:out"]);
    }

    #[test]
    fn test_through_resolves_names_in_order() {
        let mut container = ServiceContainer::new();
        container.bind_middleware_fn("first", |request, next| {
            let reply = next.run(request)?;
            Ok(Reply::Raw(format!("first({:?})", reply)))
        });
        container.bind_middleware_fn("second", |_, _| Ok(Reply::from("second")));

        let names = vec!["first".to_string(), "second".to_string()];
        let pipeline = Pipeline::through(&names, &container).unwrap();
        assert_eq!(pipeline.len(), 2);

        let reply = pipeline.then(request(), |_| Ok(Reply::from("handler"))).unwrap();
        assert_eq!(reply, Reply::Raw("first(Raw(\"second\"))".to_string()));
    }

    #[test]
    fn test_through_unknown_middleware() {
        let container = ServiceContainer::new();
        let names = vec!["auth".to_string()];
        assert_eq!(
            Pipeline::through(&names, &container).err().map(|e| e.to_string()),
            Some(Exception::MiddlewareNotFound("auth".to_string()).to_string())
        );
    }
}
