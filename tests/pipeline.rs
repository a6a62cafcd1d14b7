//! End-to-end tests through the full middleware chain.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use snippetbox::config::AppConfig;
use snippetbox::models::{MemorySnippetStore, MemoryUserStore, ModelError, Snippet, SnippetStore, UserStore};
use snippetbox::security::headers::{CONTENT_SECURITY_POLICY, REFERRER_POLICY};

mod common;
use common::{TestClient, PASSWORD};

fn assert_security_headers(response: &common::TestResponse) {
    assert_eq!(response.header("content-security-policy"), Some(CONTENT_SECURITY_POLICY));
    assert_eq!(response.header("referrer-policy"), Some(REFERRER_POLICY));
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(response.header("x-frame-options"), Some("deny"));
    assert_eq!(response.header("x-xss-protection"), Some("0"));
}

#[tokio::test]
async fn test_ping_bypasses_dynamic_chain() {
    let mut client = TestClient::new();
    let response = client.get("/ping").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "OK");
    assert!(response.headers.get(header::SET_COOKIE).is_none());
    assert_security_headers(&response);

    let request_id = response.header("x-request-id").expect("request id echoed");
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn test_client_request_id_is_preserved() {
    let mut client = TestClient::new();
    let request = Request::builder()
        .uri("/ping")
        .header("x-request-id", "trace-me-123")
        .body(Body::empty())
        .unwrap();

    let response = client.send(request).await;
    assert_eq!(response.header("x-request-id"), Some("trace-me-123"));
}

#[tokio::test]
async fn test_security_headers_on_not_found() {
    let mut client = TestClient::new();
    let response = client.get("/no/such/page").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_security_headers(&response);
}

#[tokio::test]
async fn test_first_page_issues_csrf_cookie() {
    let mut client = TestClient::new();
    let response = client.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(client.cookie("csrf_token").is_some());
    assert!(response.body.contains("There's nothing to see here... yet!"));
    assert_security_headers(&response);
}

#[tokio::test]
async fn test_anonymous_create_redirects_to_login() {
    let mut client = TestClient::new();

    for method in [Method::GET, Method::POST] {
        let token = client.csrf_token().await;
        let body = serde_urlencoded::to_string([("csrf_token", token.as_str()), ("title", "x")]).unwrap();
        let request = Request::builder()
            .method(method)
            .uri("/snippet/create")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();

        let response = client.send(request).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/user/login"));
    }
}

#[tokio::test]
async fn test_post_without_token_is_forbidden() {
    let users = Arc::new(MemoryUserStore::new());
    let mut client = TestClient::with_stores(Arc::new(MemorySnippetStore::new()), users.clone());
    client.get("/user/signup").await;

    let response = client
        .post_form(
            "/user/signup",
            &[("name", "Mallory"), ("email", "mallory@example.com"), ("password", PASSWORD)],
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, "Forbidden");
    assert!(matches!(
        users.authenticate("mallory@example.com", PASSWORD).await,
        Err(ModelError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_foreign_token_is_forbidden() {
    let mut victim = TestClient::new();
    let mut attacker = TestClient::new();
    let stolen = attacker.csrf_token().await;
    victim.get("/").await;

    let response = victim
        .post_form("/user/login", &[("email", "a@example.com"), ("password", "x"), ("csrf_token", &stolen)])
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_in_header_is_accepted() {
    let mut client = TestClient::new();
    let token = client.csrf_token().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/user/login")
        .header("x-csrf-token", token)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=&password="))
        .unwrap();

    let response = client.send(request).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_snippet_round_trip() {
    let mut client = TestClient::new();
    client.signup_and_login("alice@example.com").await;

    let form = client.get("/snippet/create").await;
    assert_eq!(form.status, StatusCode::OK);
    assert_eq!(form.header("cache-control"), Some("no-store"));

    let created = client
        .submit(
            "/snippet/create",
            &[("title", "O snail"), ("content", "Climb Mount Fuji"), ("expires", "7")],
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    assert_eq!(created.location(), Some("/snippet/view/1"));

    let view = client.get("/snippet/view/1").await;
    assert_eq!(view.status, StatusCode::OK);
    assert!(view.body.contains("O snail"));
    assert!(view.body.contains("Climb Mount Fuji"));
    assert!(view.body.contains("Snippet successfully created!"));

    let again = client.get("/snippet/view/1").await;
    assert!(!again.body.contains("Snippet successfully created!"));

    let home = client.get("/").await;
    assert!(home.body.contains(r#"href="/snippet/view/1""#));
}

#[tokio::test]
async fn test_blank_title_rerenders_form() {
    let snippets = Arc::new(MemorySnippetStore::new());
    let mut client = TestClient::with_stores(snippets.clone(), Arc::new(MemoryUserStore::new()));
    client.signup_and_login("alice@example.com").await;

    let response = client
        .submit("/snippet/create", &[("title", "   "), ("content", "kept body"), ("expires", "365")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.location().is_none());
    assert!(response.body.contains(r#"data-field="title""#));
    assert!(response.body.contains("This field cannot be blank"));
    assert!(response.body.contains("kept body"));
    assert!(snippets.is_empty());
}

#[tokio::test]
async fn test_invalid_expires_rerenders_form() {
    let mut client = TestClient::new();
    client.signup_and_login("alice@example.com").await;

    let response = client
        .submit("/snippet/create", &[("title", "t"), ("content", "c"), ("expires", "30")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains(r#"data-field="expires""#));
}

#[tokio::test]
async fn test_non_integer_expires_is_bad_request() {
    let mut client = TestClient::new();
    client.signup_and_login("alice@example.com").await;

    let response = client
        .submit("/snippet/create", &[("title", "t"), ("content", "c"), ("expires", "soon")])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, "Bad Request");
}

#[tokio::test]
async fn test_snippet_view_not_found() {
    let mut client = TestClient::new();

    for path in ["/snippet/view/0", "/snippet/view/-3", "/snippet/view/abc", "/snippet/view/99"] {
        let response = client.get(path).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(response.body, "Not Found");
    }
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let mut client = TestClient::new();
    let response = client
        .submit("/user/signup", &[("name", ""), ("email", "nope"), ("password", "short")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains(r#"data-field="name""#));
    assert!(response.body.contains("This field must be a valid email address"));
    assert!(response.body.contains("This field must be at least 8 characters long"));
    assert!(!response.body.contains("short"));
}

#[tokio::test]
async fn test_duplicate_email_is_field_error() {
    let mut client = TestClient::new();
    assert_eq!(client.signup("Alice", "alice@example.com").await.status, StatusCode::SEE_OTHER);

    let response = client.signup("Alice Again", "alice@example.com").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Email address is already in use"));
}

#[tokio::test]
async fn test_wrong_password_is_non_field_error() {
    let mut client = TestClient::new();
    client.signup("Alice", "alice@example.com").await;

    let response = client
        .submit("/user/login", &[("email", "alice@example.com"), ("password", "wrong-password")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Email or password is incorrect"));
}

#[tokio::test]
async fn test_login_renews_session_token() {
    let mut client = TestClient::new();
    client.signup("Alice", "alice@example.com").await;
    let before = client.cookie("session").map(str::to_owned);
    assert!(before.is_some());

    let response = client.login("alice@example.com").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/snippet/create"));

    let after = client.cookie("session").map(str::to_owned);
    assert!(after.is_some());
    assert_ne!(before, after);
}

#[tokio::test]
async fn test_logout_ends_authentication() {
    let mut client = TestClient::new();
    client.signup_and_login("alice@example.com").await;
    assert_eq!(client.get("/snippet/create").await.status, StatusCode::OK);

    let response = client.submit("/user/logout", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let home = client.get("/").await;
    // The flash is auto-escaped like any other template value.
    assert!(home.body.contains("You&#x27;ve been logged out successfully!"));
    assert_eq!(client.get("/snippet/create").await.location(), Some("/user/login"));
}

#[tokio::test]
async fn test_deleted_user_is_treated_as_anonymous() {
    let users = Arc::new(MemoryUserStore::new());
    let mut client = TestClient::with_stores(Arc::new(MemorySnippetStore::new()), users.clone());
    client.signup_and_login("alice@example.com").await;

    users.remove(1).expect("first user has id 1");

    let response = client.get("/snippet/create").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));
}

#[tokio::test]
async fn test_dropping_session_cookie_ends_authentication() {
    let mut client = TestClient::new();
    client.signup_and_login("alice@example.com").await;
    client.forget_cookie("session");

    let response = client.get("/snippet/create").await;
    assert_eq!(response.location(), Some("/user/login"));
}

/// Snippet store whose listing panics.
struct PanickingSnippets;

#[async_trait]
impl SnippetStore for PanickingSnippets {
    async fn latest(&self) -> Result<Vec<Snippet>, ModelError> {
        panic!("listing exploded")
    }

    async fn get(&self, _id: i64) -> Result<Snippet, ModelError> {
        Err(ModelError::NoRecord)
    }

    async fn insert(&self, _title: &str, _content: &str, _expires: i64) -> Result<i64, ModelError> {
        Err(ModelError::Backend("read only".into()))
    }
}

#[tokio::test]
async fn test_panic_is_recovered_and_server_keeps_serving() {
    let mut client = TestClient::with_stores(Arc::new(PanickingSnippets), Arc::new(MemoryUserStore::new()));

    let response = client.get("/").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, "Internal Server Error");
    assert_eq!(response.header("connection"), Some("close"));
    assert!(!response.body.contains("listing exploded"));
    assert_security_headers(&response);

    assert_eq!(client.get("/ping").await.status, StatusCode::OK);
    assert_eq!(client.get("/snippet/view/1").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_failure_is_opaque_server_error() {
    let mut client = TestClient::with_stores(Arc::new(PanickingSnippets), Arc::new(MemoryUserStore::new()));
    client.signup_and_login("alice@example.com").await;

    let response = client
        .submit("/snippet/create", &[("title", "t"), ("content", "c"), ("expires", "1")])
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, "Internal Server Error");
}

/// Snippet store that never answers.
struct StalledSnippets;

#[async_trait]
impl SnippetStore for StalledSnippets {
    async fn latest(&self) -> Result<Vec<Snippet>, ModelError> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    async fn get(&self, _id: i64) -> Result<Snippet, ModelError> {
        Err(ModelError::NoRecord)
    }

    async fn insert(&self, _title: &str, _content: &str, _expires: i64) -> Result<i64, ModelError> {
        Err(ModelError::Backend("read only".into()))
    }
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let mut config = AppConfig::default();
    config.timeouts.request_secs = 1;
    let mut client = TestClient::with_config(config, Arc::new(StalledSnippets), Arc::new(MemoryUserStore::new()));

    let response = client.get("/").await;
    assert_eq!(response.status, StatusCode::REQUEST_TIMEOUT);
    assert_security_headers(&response);

    assert_eq!(client.get("/ping").await.status, StatusCode::OK);
}
