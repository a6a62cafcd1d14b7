//! Route handlers.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::auth::AUTHENTICATED_USER_ID;
use crate::http::forms::{SnippetCreateForm, SnippetCreateInput, UserLoginForm, UserSignupForm};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::http::templates::{render, PageContext, FLASH_KEY};
use crate::models::ModelError;
use crate::validator::Validatable;

type HandlerResult = Result<Response, AppError>;

/// Liveness probe.
pub async fn ping() -> &'static str {
    "OK"
}

pub async fn home(State(app): State<AppState>, page: PageContext) -> HandlerResult {
    let snippets = app.snippets.latest().await?;

    let mut data = page.template_data();
    data.snippets = snippets;
    render(&app.templates, StatusCode::OK, "home.html", &data)
}

pub async fn snippet_view(State(app): State<AppState>, page: PageContext, Path(id): Path<String>) -> HandlerResult {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::NotFound),
    };

    let snippet = app.snippets.get(id).await?;

    let mut data = page.template_data();
    data.snippet = Some(snippet);
    render(&app.templates, StatusCode::OK, "view.html", &data)
}

pub async fn snippet_create(State(app): State<AppState>, page: PageContext) -> HandlerResult {
    let data = page.template_data().with_form(&SnippetCreateForm::default());
    render(&app.templates, StatusCode::OK, "create.html", &data)
}

pub async fn snippet_create_post(
    State(app): State<AppState>,
    page: PageContext,
    input: Result<Form<SnippetCreateInput>, FormRejection>,
) -> HandlerResult {
    let Form(input) = input.map_err(|_| AppError::ClientInput)?;
    let mut form = SnippetCreateForm::try_from(input)?;

    form.validate();
    if !form.valid() {
        let data = page.template_data().with_form(&form);
        return render(&app.templates, StatusCode::UNPROCESSABLE_ENTITY, "create.html", &data);
    }

    let id = app.snippets.insert(&form.title, &form.content, form.expires).await?;
    page.session.insert(FLASH_KEY, "Snippet successfully created!")?;

    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

pub async fn user_signup(State(app): State<AppState>, page: PageContext) -> HandlerResult {
    let data = page.template_data().with_form(&UserSignupForm::default());
    render(&app.templates, StatusCode::OK, "signup.html", &data)
}

pub async fn user_signup_post(
    State(app): State<AppState>,
    page: PageContext,
    form: Result<Form<UserSignupForm>, FormRejection>,
) -> HandlerResult {
    let Form(mut form) = form.map_err(|_| AppError::ClientInput)?;

    form.validate();
    if form.valid() {
        match app.users.insert(&form.name, &form.email, &form.password).await {
            Ok(_) => {
                page.session
                    .insert(FLASH_KEY, "Your signup was successful. Please log in.")?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(ModelError::DuplicateEmail) => {
                form.check_field(false, "email", "Email address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = page.template_data().with_form(&form);
    render(&app.templates, StatusCode::UNPROCESSABLE_ENTITY, "signup.html", &data)
}

pub async fn user_login(State(app): State<AppState>, page: PageContext) -> HandlerResult {
    let data = page.template_data().with_form(&UserLoginForm::default());
    render(&app.templates, StatusCode::OK, "login.html", &data)
}

pub async fn user_login_post(
    State(app): State<AppState>,
    page: PageContext,
    form: Result<Form<UserLoginForm>, FormRejection>,
) -> HandlerResult {
    let Form(mut form) = form.map_err(|_| AppError::ClientInput)?;

    form.validate();
    if form.valid() {
        match app.users.authenticate(&form.email, &form.password).await {
            Ok(id) => {
                page.session.renew();
                page.session.insert(AUTHENTICATED_USER_ID, id)?;
                tracing::info!(user_id = id, "User logged in");
                return Ok(Redirect::to("/snippet/create").into_response());
            }
            Err(ModelError::InvalidCredentials) => {
                form.add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = page.template_data().with_form(&form);
    render(&app.templates, StatusCode::UNPROCESSABLE_ENTITY, "login.html", &data)
}

pub async fn user_logout_post(page: PageContext) -> HandlerResult {
    page.session.renew();
    page.session.remove(AUTHENTICATED_USER_ID);
    page.session.insert(FLASH_KEY, "You've been logged out successfully!")?;

    Ok(Redirect::to("/").into_response())
}
