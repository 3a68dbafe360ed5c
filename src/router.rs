// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由器
//!
//! 注册阶段通过 `&mut Router` 独占构建路由树，服务阶段将其放入 `Arc` 后只读共享。
//!
//! 一次分发的流程：
//! 1. 从请求路径或指定的查询参数取得路由路径，交给路由树解析；
//! 2. 未匹配返回 `ResourceNotFound`，方法不匹配返回携带允许方法的 `MethodNotAllowed`；
//! 3. 控制器回调通过容器构造实例；
//! 4. 以请求为初值执行中间件管道，最内层为参数绑定与处理器调用；
//! 5. 将返回值统一转换为 [`Response`]。

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;

use crate::{
    binder::{bind, Arguments},
    config::Config,
    container::{Container, Controller},
    exception::Exception,
    group::{GroupAttributes, GroupStack},
    param::ANY,
    pipeline::Pipeline,
    request::Request,
    response::Response,
    route::{Callback, Handler, HandlerFn, Param, Reply, Route},
    tree::{Resolution, RouteTree},
};

/// 请求属性：匹配到的路由模式
pub const ATTRIBUTE_PATTERN: &str = "route.pattern";
/// 请求属性前缀：捕获的路径参数
pub const ATTRIBUTE_PARAM_PREFIX: &str = "route.param.";

/// 路由路径的来源
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RouteSource {
    /// 请求路径
    #[default]
    PathInfo,
    /// 指定名称的查询参数，缺失时视为 `/`
    Parameter(String),
}

pub struct Router {
    tree: RouteTree,
    groups: GroupStack,
    source: RouteSource,
    container: Arc<dyn Container>,
}

/// `group` 期间的作用域，离开时弹出栈顶属性，处理器注册块 panic 时同样生效
struct GroupScope<'a> {
    router: &'a mut Router,
}

impl Drop for GroupScope<'_> {
    fn drop(&mut self) {
        self.router.groups.pop();
    }
}

/// 已解析好的调用目标
enum Target {
    Closure {
        callback: Arc<HandlerFn>,
        params: Vec<Param>,
    },
    Controller {
        instance: Arc<dyn Controller>,
        method: String,
        params: Vec<Param>,
    },
}

impl Target {
    fn for_route(route: &Route, container: &dyn Container) -> Result<Self, Exception> {
        let handler = route.handler();
        match handler.callback() {
            Callback::Closure(callback) => Ok(Target::Closure {
                callback: Arc::clone(callback),
                params: handler.params().to_vec(),
            }),
            Callback::Controller { class, method } => {
                let instance = container.make(class)?;
                let params = instance.signature(method).ok_or_else(|| {
                    Exception::ControllerMethodNotFound(class.clone(), method.clone())
                })?;
                Ok(Target::Controller {
                    instance,
                    method: method.clone(),
                    params,
                })
            }
        }
    }

    fn params(&self) -> &[Param] {
        match self {
            Target::Closure { params, .. } | Target::Controller { params, .. } => params,
        }
    }

    fn invoke(&self, request: &Request, args: Arguments) -> Result<Reply, Exception> {
        match self {
            Target::Closure { callback, .. } => callback(request, args),
            Target::Controller {
                instance, method, ..
            } => instance.call(method, request, args),
        }
    }
}

impl Router {
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self {
            tree: RouteTree::new(),
            groups: GroupStack::default(),
            source: RouteSource::default(),
            container,
        }
    }

    /// 按配置构造，`route_var` 决定路由路径来源
    pub fn from_config(config: &Config, container: Arc<dyn Container>) -> Self {
        let mut router = Self::new(container);
        if let Some(name) = config.route_var() {
            info!("路由路径将从查询参数{}中读取", name);
            router.source = RouteSource::Parameter(name.to_string());
        }
        router
    }

    pub fn with_source(mut self, source: RouteSource) -> Self {
        self.source = source;
        self
    }

    pub fn source(&self) -> &RouteSource {
        &self.source
    }

    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }

    /// 注册一条路由
    ///
    /// `middleware` 合并在当前路由组的中间件之后，`clear` 中列出的项会从合并结果中移除。
    /// 同一方法与模式重复注册时，后注册的覆盖先注册的。
    pub fn add(
        &mut self,
        methods: &[&str],
        pattern: &str,
        handler: Handler,
        middleware: &[&str],
        clear: &[&str],
    ) -> &mut Self {
        let methods: Vec<String> = methods.iter().map(|m| m.to_uppercase()).collect();
        let middleware = self.groups.merge(middleware, clear);
        debug!(
            "注册路由：[{}] {}，中间件：[{}]",
            methods.join(", "),
            pattern,
            middleware.join(", ")
        );
        self.tree
            .insert(Route::new(handler, middleware, methods, pattern));
        self
    }

    fn verb(&mut self, method: &str, pattern: &str, handler: Handler) -> &mut Self {
        self.add(&[method], pattern, handler, &[], &[])
    }

    pub fn get(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("GET", pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("POST", pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("PUT", pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("PATCH", pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("DELETE", pattern, handler)
    }

    pub fn trace(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("TRACE", pattern, handler)
    }

    pub fn connect(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("CONNECT", pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("HEAD", pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb("OPTIONS", pattern, handler)
    }

    /// 匹配任意方法
    pub fn any(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.verb(ANY, pattern, handler)
    }

    /// 在 `attributes` 作用域内执行 `routes`
    pub fn group<F>(&mut self, attributes: GroupAttributes, routes: F) -> &mut Self
    where
        F: FnOnce(&mut Router),
    {
        self.groups.push(attributes);
        {
            let mut scope = GroupScope { router: &mut *self };
            routes(&mut *scope.router);
        }
        self
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// 替换整棵路由树，通常配合 `RouteTree::import` 使用
    pub fn set_tree(&mut self, tree: RouteTree) -> &mut Self {
        self.tree = tree;
        self
    }

    fn route_path(&self, request: &Request) -> String {
        match &self.source {
            RouteSource::PathInfo => request.path().to_string(),
            RouteSource::Parameter(name) => request.get(name).unwrap_or("/").to_string(),
        }
    }

    /// 分发请求
    ///
    /// 处理器与中间件返回的错误原样向上传递。
    pub fn dispatch(&self, mut request: Request) -> Result<Response, Exception> {
        let id = request.id();
        let path = self.route_path(&request);
        let method = request.method();

        let found = match self.tree.resolve(&path, method.as_str()) {
            Resolution::Matched(found) => found,
            Resolution::MethodNotAllowed(allowed) => {
                warn!(
                    "[ID{}]路径{}不接受{}方法，允许的方法：{}",
                    id,
                    path,
                    method,
                    allowed.join(", ")
                );
                return Err(Exception::MethodNotAllowed(allowed));
            }
            Resolution::NotFound => {
                warn!("[ID{}]没有与{} {}匹配的路由", id, method, path);
                return Err(Exception::ResourceNotFound);
            }
        };

        let route = found.route();
        debug!(
            "[ID{}]{} {}匹配到路由{:?} {}",
            id,
            method,
            path,
            route.handler().callback(),
            route.pattern()
        );

        let container = self.container.as_ref();
        let target = Target::for_route(route, container)?;
        let pipeline = Pipeline::through(route.middleware(), container)?;

        request.set_attribute(ATTRIBUTE_PATTERN, route.pattern());
        for (name, value) in found.captures().iter() {
            request.set_attribute(&format!("{}{}", ATTRIBUTE_PARAM_PREFIX, name), value);
        }

        let reply = pipeline.then(request, |request| {
            let args = bind(target.params(), found.captures(), container);
            target.invoke(&request, args)
        })?;
        Ok(normalize(reply))
    }
}

/// 将处理器返回值转换为响应
///
/// 对象与数组编码为 JSON；字符串、数字、布尔值作为纯文本响应体；`null` 为空响应体。
pub fn normalize(reply: Reply) -> Response {
    match reply {
        Reply::Response(response) => response,
        Reply::Json(value @ (Value::Object(_) | Value::Array(_))) => Response::json(&value),
        Reply::Json(Value::String(text)) => Response::text(text),
        Reply::Json(Value::Null) => Response::text(""),
        Reply::Json(scalar) => Response::text(scalar.to_string()),
        Reply::Raw(text) => Response::text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceContainer;
    use crate::param::{HttpRequestMethod, CONTENT_TYPE_HTML, CONTENT_TYPE_JSON};
    use serde_json::json;
    use std::panic::{self, AssertUnwindSafe};

    struct Blog;

    impl Controller for Blog {
        fn signature(&self, method: &str) -> Option<Vec<Param>> {
            match method {
                "show" => Some(vec![Param::named("id"), Param::named("format").with_default("html")]),
                _ => None,
            }
        }

        fn call(&self, _method: &str, _request: &Request, args: Arguments) -> Result<Reply, Exception> {
            Ok(Reply::from(json!({
                "id": args.str(0),
                "format": args.str(1),
            })))
        }
    }

    fn router() -> Router {
        let mut container = ServiceContainer::new();
        container.bind_controller("Blog", |_| Blog);
        Router::new(Arc::new(container))
    }

    fn get(uri: &str) -> Request {
        Request::new(HttpRequestMethod::Get, uri)
    }

    #[test]
    fn test_dispatch_closure_with_capture() {
        let mut router = router();
        router.get(
            "/users/:id",
            Handler::new(|_, args| Ok(Reply::from(format!("user {}", args.str(0).unwrap_or("?")))))
                .param(Param::named("id")),
        );

        let response = router.dispatch(get("/users/42")).unwrap();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body(), "user 42");
    }

    #[test]
    fn test_dispatch_controller() {
        let mut router = router();
        router.get("/blog/:id", Handler::controller("Blog@show").unwrap());

        let response = router.dispatch(get("/blog/9")).unwrap();
        assert_eq!(response.content_type(), Some(CONTENT_TYPE_JSON));
        let body: Value = serde_json::from_str(&response.body()).unwrap();
        assert_eq!(body, json!({"id": "9", "format": "html"}));
    }

    #[test]
    fn test_dispatch_unknown_controller() {
        let mut router = router();
        router.get("/", Handler::controller("Missing@index").unwrap());
        assert_eq!(
            router.dispatch(get("/")).unwrap_err(),
            Exception::ControllerNotFound("Missing".to_string())
        );
    }

    #[test]
    fn test_dispatch_unknown_controller_method() {
        let mut router = router();
        router.get("/", Handler::controller("Blog@destroy").unwrap());
        assert_eq!(
            router.dispatch(get("/")).unwrap_err(),
            Exception::ControllerMethodNotFound("Blog".to_string(), "destroy".to_string())
        );
    }

    #[test]
    fn test_dispatch_unknown_middleware() {
        let mut router = router();
        router.add(&["GET"], "/", Handler::new(|_, _| Ok(Reply::from("ok"))), &["auth"], &[]);
        assert_eq!(
            router.dispatch(get("/")).unwrap_err(),
            Exception::MiddlewareNotFound("auth".to_string())
        );
    }

    /// 中间件可以读到匹配的路由模式与捕获参数
    #[test]
    fn test_route_attributes_visible_to_handler() {
        let mut router = router();
        router.get(
            "/posts/:slug",
            Handler::new(|request, _| {
                Ok(Reply::from(format!(
                    "{} {}",
                    request.attribute(ATTRIBUTE_PATTERN).unwrap_or(""),
                    request.attribute("route.param.slug").unwrap_or("")
                )))
            }),
        );

        let response = router.dispatch(get("/posts/hello")).unwrap();
        assert_eq!(response.body(), "/posts/:slug hello");
    }

    #[test]
    fn test_route_source_parameter() {
        let mut router = router().with_source(RouteSource::Parameter("r".to_string()));
        router.get("/", Handler::new(|_, _| Ok(Reply::from("home"))));
        router.get("/about", Handler::new(|_, _| Ok(Reply::from("about"))));

        assert_eq!(router.dispatch(get("/index?r=/about")).unwrap().body(), "about");
        assert_eq!(router.dispatch(get("/index")).unwrap().body(), "home");
    }

    #[test]
    fn test_from_config_reads_route_var() {
        let config = Config::from_toml_str("route_var = \"r\"");
        let router = Router::from_config(&config, Arc::new(ServiceContainer::new()));
        assert_eq!(router.source(), &RouteSource::Parameter("r".to_string()));

        let router = Router::from_config(&Config::new(), Arc::new(ServiceContainer::new()));
        assert_eq!(router.source(), &RouteSource::PathInfo);
    }

    #[test]
    fn test_group_stack_popped_after_panic() {
        let mut router = router();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            router.group(GroupAttributes::middleware(["auth"]), |_| {
                panic!("registration failed");
            });
        }));

        assert!(result.is_err());
        assert_eq!(router.groups.depth(), 0);
    }

    #[test]
    fn test_nested_groups_pop_in_order() {
        let mut router = router();
        router.group(GroupAttributes::middleware(["a"]), |router| {
            router.group(GroupAttributes::middleware(["b"]), |router| {
                assert_eq!(router.groups.depth(), 2);
            });
            assert_eq!(router.groups.depth(), 1);
        });
        assert_eq!(router.groups.depth(), 0);
    }

    #[test]
    fn test_normalize() {
        let response = normalize(Reply::from(json!([1, 2])));
        assert_eq!(response.content_type(), Some(CONTENT_TYPE_JSON));
        assert_eq!(response.body(), "[1,2]");

        let response = normalize(Reply::from(json!("plain")));
        assert_eq!(response.content_type(), Some(CONTENT_TYPE_HTML));
        assert_eq!(response.body(), "plain");

        assert_eq!(normalize(Reply::from(json!(3))).body(), "3");
        assert_eq!(normalize(Reply::from(json!(true))).body(), "true");
        assert_eq!(normalize(Reply::from(Value::Null)).body(), "");
        assert_eq!(normalize(Reply::from("raw")).body(), "raw");

        let mut created = Response::new();
        created.set_code(201);
        assert_eq!(normalize(Reply::from(created)).status_code(), 201);
    }
}
