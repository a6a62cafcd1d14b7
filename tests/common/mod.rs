//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use snippetbox::config::AppConfig;
use snippetbox::lifecycle::Shutdown;
use snippetbox::models::{MemorySnippetStore, MemoryUserStore, SnippetStore, UserStore};
use snippetbox::session::MemoryStore;
use snippetbox::{build_router, AppState, HttpServer};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const PASSWORD: &str = "pa55word-long";

/// A fully buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }

    /// The masked token embedded in the page's hidden form field.
    pub fn csrf_token(&self) -> Option<String> {
        extract_csrf_token(&self.body)
    }
}

pub fn extract_csrf_token(html: &str) -> Option<String> {
    const MARKER: &str = r#"name="csrf_token" value=""#;
    let start = html.find(MARKER)? + MARKER.len();
    let end = html[start..].find('"')? + start;
    let token = &html[start..end];
    (!token.is_empty()).then(|| token.to_string())
}

/// Full `Set-Cookie` line for cookie `name`, if the response sets it.
pub fn set_cookie_line(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|line| line.starts_with(&format!("{name}=")))
        .map(str::to_owned)
}

/// Value part of a `Set-Cookie` line.
pub fn cookie_value(line: &str) -> &str {
    line.split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map_or("", |(_, value)| value)
}

/// Drives the full router in-process, keeping cookies between requests
/// the way a browser would.
pub struct TestClient {
    router: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_stores(Arc::new(MemorySnippetStore::new()), Arc::new(MemoryUserStore::new()))
    }

    pub fn with_stores(snippets: Arc<dyn SnippetStore>, users: Arc<dyn UserStore>) -> Self {
        Self::with_config(AppConfig::default(), snippets, users)
    }

    pub fn with_config(config: AppConfig, snippets: Arc<dyn SnippetStore>, users: Arc<dyn UserStore>) -> Self {
        let state = AppState::new(config, snippets, users, Arc::new(MemoryStore::new()))
            .expect("templates compile");
        Self {
            router: build_router(state),
            cookies: HashMap::new(),
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn forget_cookie(&mut self, name: &str) {
        self.cookies.remove(name);
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if !self.cookies.is_empty() {
            let jar = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(header::COOKIE, jar.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();

        for set_cookie in headers.get_all(header::SET_COOKIE) {
            self.store_cookie(set_cookie.to_str().unwrap());
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let mut attributes = set_cookie.split(';').map(str::trim);
        let Some((name, value)) = attributes.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        if attributes.any(|attr| attr == "Max-Age=0") || value.is_empty() {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Load a page that carries a form and return its masked token.
    pub async fn csrf_token(&mut self) -> String {
        let page = self.get("/user/login").await;
        assert_eq!(page.status, StatusCode::OK);
        page.csrf_token().expect("login page embeds a csrf token")
    }

    /// POST a form with a valid token attached.
    pub async fn submit(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let token = self.csrf_token().await;
        let mut form: Vec<(&str, &str)> = fields.iter().copied().collect();
        form.push(("csrf_token", &token));
        self.post_form(path, &form).await
    }

    pub async fn signup(&mut self, name: &str, email: &str) -> TestResponse {
        self.submit(
            "/user/signup",
            &[("name", name), ("email", email), ("password", PASSWORD)],
        )
        .await
    }

    pub async fn login(&mut self, email: &str) -> TestResponse {
        self.submit("/user/login", &[("email", email), ("password", PASSWORD)])
            .await
    }

    pub async fn signup_and_login(&mut self, email: &str) {
        let signup = self.signup("Alice", email).await;
        assert_eq!(signup.status, StatusCode::SEE_OTHER, "{}", signup.body);
        let login = self.login(email).await;
        assert_eq!(login.status, StatusCode::SEE_OTHER, "{}", login.body);
    }
}

/// Start the real server on an ephemeral port.
pub async fn spawn_server(mut config: AppConfig) -> (SocketAddr, Shutdown) {
    config.listener.bind_address = "127.0.0.1:0".into();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
