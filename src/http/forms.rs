//! Form shapes and their validation rules.

use serde::{Deserialize, Serialize};

use crate::http::response::AppError;
use crate::validator::{self, Validatable, Validator, EMAIL_RX};

/// Lifetimes a snippet may be created with, in days.
pub const PERMITTED_EXPIRES: [i64; 3] = [1, 7, 365];

/// Raw snippet submission, before `expires` is parsed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnippetCreateInput {
    pub title: String,
    pub content: String,
    pub expires: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i64,
    #[serde(skip)]
    pub validator: Validator,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: 365,
            validator: Validator::default(),
        }
    }
}

impl TryFrom<SnippetCreateInput> for SnippetCreateForm {
    type Error = AppError;

    /// A non-integer `expires` is a malformed request, not a validation failure.
    fn try_from(input: SnippetCreateInput) -> Result<Self, Self::Error> {
        let expires = input.expires.trim().parse::<i64>().map_err(|_| AppError::ClientInput)?;
        Ok(Self {
            title: input.title,
            content: input.content,
            expires,
            validator: Validator::default(),
        })
    }
}

impl SnippetCreateForm {
    pub fn validate(&mut self) {
        let ok = validator::not_blank(&self.title);
        self.check_field(ok, "title", "This field cannot be blank");
        let ok = validator::max_chars(&self.title, 100);
        self.check_field(ok, "title", "This field cannot be more than 100 characters long");
        let ok = validator::not_blank(&self.content);
        self.check_field(ok, "content", "This field cannot be blank");
        let ok = validator::permitted_int(self.expires, &PERMITTED_EXPIRES);
        self.check_field(ok, "expires", "This field must equal 1, 7 or 365");
    }
}

impl Validatable for SnippetCreateForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) {
        let ok = validator::not_blank(&self.name);
        self.check_field(ok, "name", "This field cannot be blank");
        let ok = validator::not_blank(&self.email);
        self.check_field(ok, "email", "This field cannot be blank");
        let ok = validator::matches(&self.email, &EMAIL_RX);
        self.check_field(ok, "email", "This field must be a valid email address");
        let ok = validator::not_blank(&self.password);
        self.check_field(ok, "password", "This field cannot be blank");
        let ok = validator::min_chars(&self.password, 8);
        self.check_field(ok, "password", "This field must be at least 8 characters long");
    }
}

impl Validatable for UserSignupForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserLoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) {
        let ok = validator::not_blank(&self.email);
        self.check_field(ok, "email", "This field cannot be blank");
        let ok = validator::matches(&self.email, &EMAIL_RX);
        self.check_field(ok, "email", "This field must be a valid email address");
        let ok = validator::not_blank(&self.password);
        self.check_field(ok, "password", "This field cannot be blank");
    }
}

impl Validatable for UserLoginForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }
}
