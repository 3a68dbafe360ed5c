// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use crate::{param::*, util::HtmlBuilder};

use bytes::Bytes;
use chrono::prelude::*;
use log::error;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    server_name: String,
    allow: Option<Vec<String>>,
    content: Option<Bytes>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            allow: None,
            content: None,
        }
    }

    /// 以原始值作为响应体
    pub fn text(body: impl Into<String>) -> Self {
        let mut response = Self::new();
        response.set_content(Bytes::from(body.into()), CONTENT_TYPE_HTML);
        response
    }

    /// 将结构化值编码为 JSON 响应体
    pub fn json(value: &Value) -> Self {
        let mut response = Self::new();
        response.set_content(Bytes::from(value.to_string()), CONTENT_TYPE_JSON);
        response
    }

    /// 带 HTML 说明页的错误响应
    pub fn from_status_code(code: u16) -> Self {
        let html = HtmlBuilder::from_status_code(code, None).build();
        let mut response = Self::new();
        response.set_code(code);
        response.set_content(Bytes::from(html), CONTENT_TYPE_HTML);
        response
    }

    /// 405 响应，`Allow` 头列出允许的方法
    pub fn method_not_allowed(allowed: &[String]) -> Self {
        let mut response = Self::from_status_code(405);
        response.allow = Some(allowed.to_vec());
        response
    }

    pub fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&info) => info.to_string(),
            None => {
                error!("非法的状态码：{}。这条错误说明代码编写出现了错误。", code);
                "Unknown".to_string()
            }
        };
        self
    }

    pub fn set_content(&mut self, content: Bytes, content_type: &str) -> &mut Self {
        self.content_length = content.len() as u64;
        self.content = Some(content);
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let version: &str = match self.version {
            HttpVersion::V1_0 => "HTTP/1.0",
            HttpVersion::V1_1 => "HTTP/1.1",
        };
        let status_code: &str = &self.status_code.to_string();
        let content_length: &str = &self.content_length.to_string();
        let date: &str = &format_date(&self.date);

        let header = [
            version,
            " ",
            status_code,
            " ",
            &self.information,
            CRLF,
            match &self.content_type {
                Some(t) => ["Content-Type: ", t, CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            "Content-Length: ",
            content_length,
            CRLF,
            "Date: ",
            date,
            CRLF,
            "Server: ",
            &self.server_name,
            CRLF,
            match &self.allow {
                Some(a) => ["Allow: ", &a.join(", "), CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            CRLF,
        ]
        .concat();
        [
            header.as_bytes(),
            match &self.content {
                Some(c) => c,
                None => b"",
            },
        ]
        .concat()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    /// 响应体按 UTF-8 解释，无响应体时为空串
    pub fn body(&self) -> String {
        match &self.content {
            Some(c) => String::from_utf8_lossy(c).into_owned(),
            None => String::new(),
        }
    }

    pub fn allow(&self) -> Option<&[String]> {
        self.allow.as_deref()
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}
