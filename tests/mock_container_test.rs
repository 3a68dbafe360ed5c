use std::any::Any;
use std::sync::Arc;

use mockall::mock;

use trie_router::{
    from_fn, Arguments, Container, Controller, Exception, Handler, HttpRequestMethod, Middleware,
    Param, Reply, Request, Router,
};

mock! {
    pub Registry {}

    impl Container for Registry {
        fn make(&self, class: &str) -> Result<Arc<dyn Controller>, Exception>;
        fn resolve(&self, type_name: &str) -> Option<Arc<dyn Any + Send + Sync>>;
        fn middleware(&self, name: &str) -> Option<Arc<dyn Middleware>>;
    }
}

struct Echo;

impl Controller for Echo {
    fn signature(&self, method: &str) -> Option<Vec<Param>> {
        match method {
            "show" => Some(vec![Param::typed("clock", "Clock"), Param::named("id")]),
            _ => None,
        }
    }

    fn call(&self, _method: &str, _request: &Request, args: Arguments) -> Result<Reply, Exception> {
        let clock = args.service::<u64>(0).map(|c| *c).unwrap_or(0);
        Ok(Reply::from(format!("{}@{}", args.str(1).unwrap_or("?"), clock)))
    }
}

fn get(uri: &str) -> Request {
    Request::new(HttpRequestMethod::Get, uri)
}

#[test]
fn test_controller_built_through_container() {
    let mut registry = MockRegistry::new();
    registry
        .expect_make()
        .withf(|class| class == "Echo")
        .times(1)
        .returning(|_| Ok(Arc::new(Echo) as Arc<dyn Controller>));
    registry
        .expect_resolve()
        .withf(|type_name| type_name == "Clock")
        .times(1)
        .returning(|_| Some(Arc::new(1700u64) as Arc<dyn Any + Send + Sync>));
    registry.expect_middleware().never();

    let mut router = Router::new(Arc::new(registry));
    router.get("/echo/:id", Handler::controller("Echo@show").unwrap());

    assert_eq!(router.dispatch(get("/echo/3")).unwrap().body(), "3@1700");
}

/// 路由未匹配时不会访问容器
#[test]
fn test_container_untouched_on_not_found() {
    let mut registry = MockRegistry::new();
    registry.expect_make().never();
    registry.expect_resolve().never();
    registry.expect_middleware().never();

    let mut router = Router::new(Arc::new(registry));
    router.get("/echo/:id", Handler::controller("Echo@show").unwrap());

    assert_eq!(router.dispatch(get("/other")).unwrap_err(), Exception::ResourceNotFound);
}

#[test]
fn test_middleware_resolved_by_name() {
    let mut registry = MockRegistry::new();
    registry
        .expect_middleware()
        .withf(|name| name == "wrap")
        .times(1)
        .returning(|_| {
            Some(from_fn(|request, next| match next.run(request)? {
                Reply::Raw(body) => Ok(Reply::Raw(format!("<{}>", body))),
                other => Ok(other),
            }))
        });
    registry
        .expect_middleware()
        .withf(|name| name == "missing")
        .returning(|_| None);

    let mut router = Router::new(Arc::new(registry));
    router.add(&["GET"], "/", Handler::new(|_, _| Ok(Reply::from("body"))), &["wrap"], &[]);
    router.add(&["GET"], "/broken", Handler::new(|_, _| Ok(Reply::from("body"))), &["missing"], &[]);

    assert_eq!(router.dispatch(get("/")).unwrap().body(), "<body>");
    assert_eq!(
        router.dispatch(get("/broken")).unwrap_err(),
        Exception::MiddlewareNotFound("missing".to_string())
    );
}

/// `has` 默认委托给 `resolve`
#[test]
fn test_has_delegates_to_resolve() {
    let mut registry = MockRegistry::new();
    registry
        .expect_resolve()
        .withf(|type_name| type_name == "Clock")
        .returning(|_| Some(Arc::new(0u64) as Arc<dyn Any + Send + Sync>));
    registry
        .expect_resolve()
        .withf(|type_name| type_name != "Clock")
        .returning(|_| None);

    assert!(registry.has("Clock"));
    assert!(!registry.has("Mailer"));
}
