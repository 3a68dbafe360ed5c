// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 基于前缀树的请求路由引擎：路由树、路由组、中间件管道、参数绑定与分发。

pub mod binder;
pub mod config;
pub mod container;
pub mod exception;
pub mod group;
pub mod param;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod tree;
pub mod util;

pub use binder::{Argument, Arguments};
pub use config::Config;
pub use container::{Container, Controller, ServiceContainer};
pub use exception::Exception;
pub use group::GroupAttributes;
pub use param::{HttpRequestMethod, HttpVersion};
pub use pipeline::{from_fn, Middleware, Next, Pipeline};
pub use request::Request;
pub use response::Response;
pub use route::{Callback, Handler, Param, Reply, Route};
pub use router::{RouteSource, Router};
pub use tree::{Captures, Resolution, RouteMatch, RouteTree};
pub use util::HtmlBuilder;
