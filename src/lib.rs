use serde::{Deserialize, Serialize};

pub mod db;
pub mod handlers;
pub mod hash;
pub mod model;
pub mod routes;

/// Body of `POST /api/create`. Every field is required; absent, null and empty all count as missing.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CreateRequest {
    pub code: Option<String>,
    pub url: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/update`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UpdateRequest {
    pub code: Option<String>,
    pub password: Option<String>,
    pub new_url: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

impl CreateRequest {
    /// Hashes the password and builds a fresh record, or `None` when a field is missing.
    pub fn into_record(self) -> Option<model::Record> {
        let code = present(&self.code)?;
        let url = present(&self.url)?;
        let password = present(&self.password)?;
        Some(model::Record::new(code, url, hash::hash_password(password)))
    }
}

impl UpdateRequest {
    /// `(code, password, new_url)` when all three are present.
    pub fn fields(&self) -> Option<(&str, &str, &str)> {
        Some((present(&self.code)?, present(&self.password)?, present(&self.new_url)?))
    }
}

/// Structured reply of the JSON endpoints.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_link: Option<String>,
}

impl ApiResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            fixed_link: None,
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            fixed_link: None,
        }
    }

    pub fn with_fixed_link(mut self, fixed_link: String) -> Self {
        self.fixed_link = Some(fixed_link);
        self
    }
}
