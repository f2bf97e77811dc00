use serde::{Deserialize, Serialize};

use crate::web::{WebResult, validate};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SignupBody {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupBody {
    pub fn validate(&self) -> WebResult<()> {
        validate::username(&self.username)?;
        validate::email(&self.email)?;
        validate::password(&self.password)
    }
}

/// `username` may also hold the email address.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SigninBody {
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AccountUpdateBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl AccountUpdateBody {
    pub fn validate(&self) -> WebResult<()> {
        if let Some(username) = &self.username {
            validate::username(username)?;
        }
        if let Some(email) = &self.email {
            validate::email(email)?;
        }
        if let Some(password) = &self.password {
            validate::password(password)?;
        }
        Ok(())
    }
}
