use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::{AppError, AppResult};

/// Header carrying the caller's role, set by the authenticating gateway.
pub const ROLE_HEADER: &str = "x-user-role";

/// Role assigned to a caller by the authentication service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    None,
    User,
    Manager,
    Superuser,
}

impl Role {
    /// Unknown role names are treated as no role at all.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "superuser" => Self::Superuser,
            "manager" => Self::Manager,
            "user" => Self::User,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessLevel {
    None,
    Read,
    ReadWrite,
    Admin,
}

#[must_use]
pub fn access_level(role: Role) -> AccessLevel {
    match role {
        Role::None => AccessLevel::None,
        Role::User => AccessLevel::Read,
        Role::Manager => AccessLevel::ReadWrite,
        Role::Superuser => AccessLevel::Admin,
    }
}

impl AccessLevel {
    /// Fails with `Forbidden` unless this level covers `required`.
    pub fn require(self, required: AccessLevel, action: &str) -> AppResult<()> {
        if self >= required {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{action} requires {required:?} access, caller has {self:?}"
            )))
        }
    }
}

/// Extracts the caller's role from [`ROLE_HEADER`]; absent means [`Role::None`].
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Role);

impl Caller {
    #[must_use]
    pub fn access_level(self) -> AccessLevel {
        access_level(self.0)
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role = parts
            .headers
            .get(ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map_or(Role::None, Role::from_name);
        Ok(Self(role))
    }
}
