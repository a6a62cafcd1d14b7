//! HTML rendering.
//!
//! Templates are compiled into the binary and rendered with auto-escaping.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Datelike, Utc};
use minijinja::Environment;
use serde::Serialize;

use crate::auth::AuthContext;
use crate::http::response::AppError;
use crate::models::Snippet;
use crate::security::csrf::CsrfToken;
use crate::session::Session;
use crate::validator::{Validatable, Validator};

/// Session key for one-shot status messages.
pub const FLASH_KEY: &str = "flash";

const BASE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{% block title %}{% endblock %} - Snippetbox</title>
<link rel="stylesheet" href="/static/css/main.css">
</head>
<body>
<header><h1><a href="/">Snippetbox</a></h1></header>
<nav>
<div>
<a href="/">Home</a>
{% if is_authenticated %}<a href="/snippet/create">Create snippet</a>{% endif %}
</div>
<div>
{% if is_authenticated %}
<form action="/user/logout" method="POST">
<input type="hidden" name="csrf_token" value="{{ csrf_token }}">
<button>Logout</button>
</form>
{% else %}
<a href="/user/signup">Signup</a>
<a href="/user/login">Login</a>
{% endif %}
</div>
</nav>
<main>
{% if flash %}<div class="flash">{{ flash }}</div>{% endif %}
{% block main %}{% endblock %}
</main>
<footer>Powered by Rust in {{ current_year }}</footer>
</body>
</html>
"#;

const HOME: &str = r#"{% extends "base.html" %}
{% block title %}Home{% endblock %}
{% block main %}
<h2>Latest Snippets</h2>
{% if snippets %}
<table>
<tr><th>Title</th><th>Created</th><th>ID</th></tr>
{% for snippet in snippets %}
<tr>
<td><a href="/snippet/view/{{ snippet.id }}">{{ snippet.title }}</a></td>
<td>{{ snippet.created | human_date }}</td>
<td>#{{ snippet.id }}</td>
</tr>
{% endfor %}
</table>
{% else %}
<p>There's nothing to see here... yet!</p>
{% endif %}
{% endblock %}
"#;

const VIEW: &str = r#"{% extends "base.html" %}
{% block title %}Snippet #{{ snippet.id }}{% endblock %}
{% block main %}
<div class="snippet" data-id="{{ snippet.id }}">
<div class="metadata"><strong>{{ snippet.title }}</strong><span>#{{ snippet.id }}</span></div>
<pre><code>{{ snippet.content }}</code></pre>
<div class="metadata">
<time>Created: {{ snippet.created | human_date }}</time>
<time>Expires: {{ snippet.expires | human_date }}</time>
</div>
</div>
{% endblock %}
"#;

const CREATE: &str = r#"{% extends "base.html" %}
{% block title %}Create a New Snippet{% endblock %}
{% block main %}
<form action="/snippet/create" method="POST">
<input type="hidden" name="csrf_token" value="{{ csrf_token }}">
<div>
<label>Title:</label>
{% if errors.field_errors.title %}<label class="error" data-field="title">{{ errors.field_errors.title }}</label>{% endif %}
<input type="text" name="title" value="{{ form.title }}">
</div>
<div>
<label>Content:</label>
{% if errors.field_errors.content %}<label class="error" data-field="content">{{ errors.field_errors.content }}</label>{% endif %}
<textarea name="content">{{ form.content }}</textarea>
</div>
<div>
<label>Delete in:</label>
{% if errors.field_errors.expires %}<label class="error" data-field="expires">{{ errors.field_errors.expires }}</label>{% endif %}
{% for days, label in [(365, "One Year"), (7, "One Week"), (1, "One Day")] %}
<input type="radio" name="expires" value="{{ days }}"{% if form.expires == days %} checked{% endif %}> {{ label }}
{% endfor %}
</div>
<div><input type="submit" value="Publish snippet"></div>
</form>
{% endblock %}
"#;

const SIGNUP: &str = r#"{% extends "base.html" %}
{% block title %}Signup{% endblock %}
{% block main %}
<form action="/user/signup" method="POST" novalidate>
<input type="hidden" name="csrf_token" value="{{ csrf_token }}">
{% for field, label, kind in [("name", "Name", "text"), ("email", "Email", "email"), ("password", "Password", "password")] %}
<div>
<label>{{ label }}:</label>
{% if errors.field_errors[field] %}<label class="error" data-field="{{ field }}">{{ errors.field_errors[field] }}</label>{% endif %}
<input type="{{ kind }}" name="{{ field }}" value="{{ form[field] or "" }}">
</div>
{% endfor %}
<div><input type="submit" value="Signup"></div>
</form>
{% endblock %}
"#;

const LOGIN: &str = r#"{% extends "base.html" %}
{% block title %}Login{% endblock %}
{% block main %}
<form action="/user/login" method="POST" novalidate>
<input type="hidden" name="csrf_token" value="{{ csrf_token }}">
{% for error in errors.non_field_errors %}<div class="error">{{ error }}</div>{% endfor %}
<div>
<label>Email:</label>
{% if errors.field_errors.email %}<label class="error" data-field="email">{{ errors.field_errors.email }}</label>{% endif %}
<input type="email" name="email" value="{{ form.email }}">
</div>
<div>
<label>Password:</label>
{% if errors.field_errors.password %}<label class="error" data-field="password">{{ errors.field_errors.password }}</label>{% endif %}
<input type="password" name="password">
</div>
<div><input type="submit" value="Login"></div>
</form>
{% endblock %}
"#;

fn human_date(value: String) -> String {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc).format("%d %b %Y at %H:%M").to_string())
        .unwrap_or_default()
}

/// Build the template environment. Fails only if a template does not compile.
pub fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_filter("human_date", human_date);
    env.add_template("base.html", BASE)?;
    env.add_template("home.html", HOME)?;
    env.add_template("view.html", VIEW)?;
    env.add_template("create.html", CREATE)?;
    env.add_template("signup.html", SIGNUP)?;
    env.add_template("login.html", LOGIN)?;
    Ok(env)
}

/// Values available to every template.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    pub form: Option<minijinja::Value>,
    pub errors: Validator,
}

impl TemplateData {
    /// Attach a form's values and its validation errors.
    pub fn with_form<T: Serialize + Validatable>(mut self, form: &T) -> Self {
        self.form = Some(minijinja::Value::from_serialize(form));
        self.errors = form.validator().clone();
        self
    }
}

/// Per-request inputs to [`TemplateData`], gathered from the middleware extensions.
#[derive(Clone, Debug)]
pub struct PageContext {
    pub session: Session,
    pub auth: AuthContext,
    csrf: Option<CsrfToken>,
}

impl PageContext {
    /// Fresh template data; consumes any pending flash message.
    pub fn template_data(&self) -> TemplateData {
        TemplateData {
            current_year: Utc::now().year(),
            flash: self.session.pop::<String>(FLASH_KEY),
            is_authenticated: self.auth.is_authenticated(),
            csrf_token: self.csrf.map(|t| t.masked()).unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PageContext {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self {
            session,
            auth: parts.extensions.get::<AuthContext>().copied().unwrap_or_default(),
            csrf: parts.extensions.get::<CsrfToken>().copied(),
        })
    }
}

/// Render `name` with `data` into an HTML response.
pub fn render(env: &Environment<'_>, status: StatusCode, name: &str, data: &TemplateData) -> Result<Response, AppError> {
    let body = env.get_template(name)?.render(data)?;
    Ok((status, Html(body)).into_response())
}
