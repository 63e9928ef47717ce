use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User record as persisted. `password` always holds a salted hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// A user about to be stored. Required fields stay optional here so that
/// their absence surfaces as a store error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl NewUser {
    /// Name of the first required field that is absent or blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        fn blank(v: &Option<String>) -> bool {
            v.as_deref().map_or(true, |s| s.trim().is_empty())
        }
        if blank(&self.email) {
            Some("email")
        } else if blank(&self.password) {
            Some("password")
        } else {
            None
        }
    }
}
