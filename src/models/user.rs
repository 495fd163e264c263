//! User entity and the payload accepted when creating or updating one.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// Request body for POST and PUT on `/api/v1/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub name: String,
}

impl UserInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("Name is required".to_string()));
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(ApiError::Validation(format!(
                "Name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(())
    }

    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            name: self.name,
        }
    }
}
