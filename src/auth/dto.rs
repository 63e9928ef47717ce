use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::UserRecord;

pub const REGISTERED: &str = "User registered!";
pub const FAILED_TO_REGISTER: &str = "Failed to register";
pub const FAILED_TO_AUTHENTICATE: &str = "Failed to authenticate user";
pub const WRONG_PASSWORD: &str = "Wrong password";
pub const FAILED_TO_FIND_USER: &str = "Failed to find user";

/// Request body for `/authenticate/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthenticateRequest {
    pub password: Option<String>,
}

/// `{success, message}` envelope shared by every route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageResponse<T = &'static str> {
    pub success: bool,
    pub message: T,
}

impl<T> MessageResponse<T> {
    pub fn ok(message: T) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

impl MessageResponse {
    pub fn fail(message: &'static str) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Public part of the user returned next to a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

impl From<&UserRecord> for PublicUser {
    fn from(u: &UserRecord) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuthenticateResponse {
    Authenticated(TokenResponse),
    Failed(MessageResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserResponse {
    Found(MessageResponse<UserRecord>),
    Failed(MessageResponse),
}
