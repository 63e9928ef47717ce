use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthenticateResponse, MessageResponse, PublicUser, TokenResponse, UserResponse,
            FAILED_TO_AUTHENTICATE, FAILED_TO_FIND_USER, FAILED_TO_REGISTER, REGISTERED,
            WRONG_PASSWORD,
        },
        jwt::TokenSigner,
        password::{CredentialHasher, PasswordError},
    },
    users::{
        repo::{StoreError, UserStore},
        repo_types::{NewUser, UserRecord},
    },
};

/// Everything that can go wrong below the service boundary. Never returned
/// to clients; logged and collapsed into a fixed response.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        signer: TokenSigner,
    ) -> Self {
        Self {
            store,
            hasher,
            signer,
        }
    }

    #[instrument(skip_all)]
    pub async fn register(&self, candidate: NewUser) -> MessageResponse {
        match self.create_user(candidate).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "user registered");
                MessageResponse::ok(REGISTERED)
            }
            Err(e) => {
                warn!(error = %e, "register failed");
                MessageResponse::fail(FAILED_TO_REGISTER)
            }
        }
    }

    #[instrument(skip(self, supplied_password))]
    pub async fn authenticate(&self, id: &str, supplied_password: &str) -> AuthenticateResponse {
        let user = match self.store.get_by_id(id).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!("authenticate unknown user");
                return AuthenticateResponse::Failed(MessageResponse::fail(FAILED_TO_AUTHENTICATE));
            }
            Err(e) => {
                error!(error = %e, "get_by_id failed");
                return AuthenticateResponse::Failed(MessageResponse::fail(FAILED_TO_AUTHENTICATE));
            }
        };

        let matched = match self.compare(supplied_password, &user.password).await {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, user_id = %user.id, "compare failed");
                return AuthenticateResponse::Failed(MessageResponse::fail(FAILED_TO_AUTHENTICATE));
            }
        };

        if !matched {
            warn!(user_id = %user.id, "authenticate wrong password");
            return AuthenticateResponse::Failed(MessageResponse::fail(WRONG_PASSWORD));
        }

        let token = match self.issue_token(&user) {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, user_id = %user.id, "issue token failed");
                return AuthenticateResponse::Failed(MessageResponse::fail(FAILED_TO_AUTHENTICATE));
            }
        };

        info!(user_id = %user.id, "user authenticated");
        AuthenticateResponse::Authenticated(TokenResponse {
            success: true,
            token,
            user: PublicUser::from(&user),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> UserResponse {
        match self.store.get_by_id(id).await {
            Ok(Some(user)) => UserResponse::Found(MessageResponse::ok(user)),
            Ok(None) => UserResponse::Failed(MessageResponse::fail(FAILED_TO_FIND_USER)),
            Err(e) => {
                error!(error = %e, "get_by_id failed");
                UserResponse::Failed(MessageResponse::fail(FAILED_TO_FIND_USER))
            }
        }
    }

    async fn create_user(&self, mut candidate: NewUser) -> Result<UserRecord, ServiceError> {
        if let Some(field) = candidate.missing_field() {
            return Err(StoreError::MissingField(field).into());
        }
        let plain = candidate.password.take().unwrap_or_default();
        candidate.password = Some(self.hash(plain).await?);
        Ok(self.store.create(candidate).await?)
    }

    fn issue_token(&self, user: &UserRecord) -> Result<String, ServiceError> {
        Ok(format!("Bearer {}", self.signer.sign(user)?))
    }

    async fn hash(&self, plain: String) -> Result<String, PasswordError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
    }

    async fn compare(&self, plain: &str, hashed: &str) -> Result<bool, PasswordError> {
        let hasher = Arc::clone(&self.hasher);
        let (plain, hashed) = (plain.to_owned(), hashed.to_owned());
        tokio::task::spawn_blocking(move || hasher.compare(&plain, &hashed))
            .await
            .map_err(|e| PasswordError::Comparison(e.to_string()))?
    }
}
