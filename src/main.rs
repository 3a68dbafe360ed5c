// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 演示服务器
//!
//! 基于 Tokio 运行时的最小 HTTP 服务，用于演示路由器的注册与分发：
//! - 从 `config/development.toml` 读取端口、线程数与路由来源；
//! - 在容器中登记控制器、服务与中间件；
//! - 每个连接读取一次请求，交给 `Router::dispatch`，并把 `Exception` 转换为错误响应。

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
    time::Instant,
};

use log::{debug, error, info, warn};
use serde_json::json;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    runtime::Builder,
};

use trie_router::{
    Arguments, Config, Container, Controller, Exception, GroupAttributes, Handler, Param, Reply,
    Request, Response, Router, ServiceContainer,
};

/// 示例控制器
struct BlogController {
    site: Arc<String>,
}

impl Controller for BlogController {
    fn signature(&self, method: &str) -> Option<Vec<Param>> {
        match method {
            "index" => Some(Vec::new()),
            "show" => Some(vec![
                Param::named("id"),
                Param::named("format").with_default("html"),
            ]),
            _ => None,
        }
    }

    fn call(&self, method: &str, _request: &Request, args: Arguments) -> Result<Reply, Exception> {
        match method {
            "index" => Ok(Reply::from(json!({ "site": self.site.as_str(), "posts": [1, 2, 3] }))),
            "show" => {
                let id = args
                    .str(0)
                    .ok_or_else(|| Exception::HandlerFailed("缺少文章ID".to_string()))?;
                Ok(Reply::from(json!({
                    "site": self.site.as_str(),
                    "id": id,
                    "format": args.str(1),
                })))
            }
            _ => Err(Exception::ControllerMethodNotFound(
                "BlogController".to_string(),
                method.to_string(),
            )),
        }
    }
}

fn build_container() -> ServiceContainer {
    let mut container = ServiceContainer::new();
    container.bind_instance("SiteName", String::from("trie-router demo"));
    container.bind_controller("BlogController", |c| BlogController {
        site: c
            .resolve("SiteName")
            .and_then(|s| s.downcast::<String>().ok())
            .unwrap_or_default(),
    });
    container.bind_middleware_fn("timer", |request, next| {
        let id = request.id();
        let start_time = Instant::now();
        let result = next.run(request);
        debug!("[ID{}]处理器用时{}us", id, start_time.elapsed().as_micros());
        result
    });
    container.bind_middleware_fn("auth", |request, next| {
        if request.get("token").is_some() {
            next.run(request)
        } else {
            warn!("[ID{}]请求缺少token，已拒绝", request.id());
            Ok(Reply::from(Response::from_status_code(401)))
        }
    });
    container
}

fn build_router(config: &Config) -> Result<Router, Exception> {
    let mut router = Router::from_config(config, Arc::new(build_container()));

    router.get("/", Handler::new(|_, _| Ok(Reply::from("Hello from trie-router"))));
    router.get(
        "/users/:id",
        Handler::new(|_, args| Ok(Reply::from(json!({ "id": args.str(0) }))))
            .param(Param::named("id")),
    );
    router.get("/blog", Handler::controller("BlogController@index")?);
    router.add(
        &["GET", "HEAD"],
        "/blog/:id",
        Handler::controller("BlogController@show")?,
        &["timer"],
        &[],
    );
    router.group(GroupAttributes::middleware(["timer", "auth"]), |router| {
        router.get(
            "/admin/stats",
            Handler::new(|request, _| {
                Ok(Reply::from(json!({ "pattern": request.attribute("route.pattern") })))
            }),
        );
        router.add(
            &["ANY"],
            "/admin/ping",
            Handler::new(|_, _| Ok(Reply::from("pong"))),
            &[],
            &["auth"],
        );
    });

    info!("路由注册完成，共{}条", router.tree().len());
    Ok(router)
}

fn main() {
    // log4rs 配置缺失时只输出到标准错误，服务照常运行
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");

    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建Tokio运行时：{}", e);
            return;
        }
    };

    let router = match build_router(&config) {
        Ok(router) => Arc::new(router),
        Err(e) => {
            error!("注册路由失败：{}", e);
            return;
        }
    };
    runtime.block_on(serve(config, router));
}

async fn serve(config: Config, router: Arc<Router>) {
    let port = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);

    let listener = match TcpListener::bind(SocketAddrV4::new(address, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("端口{}绑定完成", port);

    let mut id: u128 = 0;
    loop {
        let (mut stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("接受连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]TCP连接已建立：{}", id, addr);

        let router = Arc::clone(&router);
        tokio::spawn(async move {
            handle_connection(&mut stream, id, &router).await;
        });
        id += 1;
    }
}

async fn handle_connection(stream: &mut TcpStream, id: u128, router: &Router) {
    let mut buffer = vec![0; 1024];

    if let Err(e) = stream.readable().await {
        error!("[ID{}]等待TCPStream可读时遇到错误：{}", id, e);
        return;
    }
    match stream.try_read(&mut buffer) {
        Ok(0) => return,
        Ok(n) => buffer.truncate(n),
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误：{}", id, e);
            return;
        }
    }
    debug!("[ID{}]HTTP请求接收完毕", id);

    let start_time = Instant::now();

    let request = match Request::try_from(&buffer, id) {
        Ok(request) => request,
        Err(e) => {
            let response = Response::from_status_code(e.status_code());
            let _ = stream.write_all(&response.as_bytes()).await;
            return;
        }
    };

    let method = request.method();
    let path = request.path().to_string();
    let user_agent = request.user_agent().to_string();

    let response = match router.dispatch(request) {
        Ok(response) => response,
        Err(Exception::MethodNotAllowed(allowed)) => Response::method_not_allowed(&allowed),
        Err(e) => {
            if e.status_code() >= 500 {
                error!("[ID{}]处理请求时发生异常：{}", id, e);
            }
            Response::from_status_code(e.status_code())
        }
    };

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );
    info!(
        "[ID{}] {}, {}, {}, {}, {}",
        id,
        path,
        method,
        response.status_code(),
        response.information(),
        user_agent,
    );

    if let Err(e) = stream.write_all(&response.as_bytes()).await {
        error!("[ID{}]发送响应失败：{}", id, e);
        return;
    }
    let _ = stream.flush().await;
}
