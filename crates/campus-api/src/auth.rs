//! Caller identity.
//!
//! Authentication happens in the upstream gateway, which forwards the user id
//! and role as headers. Mutating handlers take [`CurrentActor`]; reads do not.

use crate::constants::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use campus_core::models::{Actor, Role};
use campus_core::AppError;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?
            .parse::<Uuid>()
            .map_err(|_| AppError::Unauthorized("X-User-Id must be a UUID".to_string()))?;

        let role = match header(parts, USER_ROLE_HEADER) {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| AppError::Unauthorized(e.to_string()))?,
            None => Role::default(),
        };

        Ok(CurrentActor(Actor::new(user_id, role)))
    }
}
