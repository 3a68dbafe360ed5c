// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use crate::param::{DOT, SEPARATOR, STATUS_CODES};

/// 将路由模式或请求路径切分为段。
///
/// `.` 被视为额外的分隔符，首尾的 `/` 被去除。空路径（包括 `/`）得到单个空段，
/// 因此注册与解析使用同一套规则时，根路由就是一个普通的字面量路由。
pub fn tokenize(path: &str) -> Vec<String> {
    path.replace(DOT, "/")
        .trim_matches(SEPARATOR)
        .split(SEPARATOR)
        .map(str::to_string)
        .collect()
}

pub struct HtmlBuilder {
    title: String,
    css: String,
    body: String,
}

impl HtmlBuilder {
    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let title = format!("{}", code);
        let css = r"
            body {
                width: 35em;
                margin: 0 auto;
                font-family: Tahoma, Verdana, Arial, sans-serif;
            }
            "
        .to_string();
        let description = match note {
            Some(n) => n,
            None => STATUS_CODES.get(&code).copied().unwrap_or("Unknown"),
        };
        let body = format!(
            r"
            <h1>{}</h1>
            <p>{}</p>
            ",
            code, description
        );
        Self { title, css, body }
    }

    pub fn build(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
            <html>
                <head>
                    <meta charset="utf-8">
                    <title>{}</title>
                    <style>{}</style>
                </head>
                <body>
                {}
                </body>
            </html>"##,
            self.title, self.css, self.body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_trims_separators() {
        assert_eq!(tokenize("/users/:id/"), vec!["users", ":id"]);
        assert_eq!(tokenize("users"), vec!["users"]);
    }

    #[test]
    fn test_tokenize_dot_is_separator() {
        assert_eq!(tokenize("/feed.json"), vec!["feed", "json"]);
        assert_eq!(tokenize("/files/:name.:ext"), vec!["files", ":name", ":ext"]);
    }

    /// 根路径与空路径都得到单个空段
    #[test]
    fn test_tokenize_root() {
        assert_eq!(tokenize("/"), vec![""]);
        assert_eq!(tokenize(""), vec![""]);
        assert_eq!(tokenize("//"), vec![""]);
    }

    #[test]
    fn test_tokenize_keeps_inner_empty_segments() {
        assert_eq!(tokenize("/a//b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_html_builder_from_status_code() {
        let html = HtmlBuilder::from_status_code(404, Some("测试404")).build();
        assert!(html.contains("404"));
        assert!(html.contains("测试404"));
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn test_html_builder_from_status_code_no_note() {
        let html = HtmlBuilder::from_status_code(405, None).build();
        assert!(html.contains("Method Not Allowed"));

        let html = HtmlBuilder::from_status_code(999, None).build();
        assert!(html.contains("Unknown"));
    }
}
