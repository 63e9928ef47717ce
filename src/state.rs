use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::{
    auth::{
        jwt::TokenSigner,
        password::{CredentialHasher, PasswordHasher},
        services::AuthService,
    },
    config::AppConfig,
    users::repo::{MemoryUserStore, PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn UserStore>,
    pub auth: AuthService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database {
            Some(db) => Arc::new(PgUserStore::connect(db).await?) as Arc<dyn UserStore>,
            None => {
                warn!("DATABASE_URL not set; users are kept in memory only");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        let hasher = Arc::new(PasswordHasher::new(
            config.password.scheme,
            config.password.bcrypt_cost,
        ));
        info!(scheme = ?hasher.scheme(), "password hasher ready");

        Ok(Self::from_parts(config, store, hasher))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        let auth = AuthService::new(store.clone(), hasher, TokenSigner::new(&config.jwt));
        Self {
            config,
            store,
            auth,
        }
    }

    /// Release backend resources. Call once the server has stopped.
    pub async fn shutdown(&self) {
        self.store.close().await;
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{JwtConfig, PasswordConfig, DEFAULT_TOKEN_TTL_SECONDS};

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database: None,
            jwt: JwtConfig {
                secret: "test".into(),
                ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            },
            password: PasswordConfig::default(),
        });
        Self::from_parts(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(PasswordHasher::bcrypt(4)),
        )
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
