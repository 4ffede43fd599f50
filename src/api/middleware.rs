//! Request-scoped identity.
//!
//! The identity provider in front of the service forwards the authenticated
//! staff member as `X-Staff-Id` and `X-Staff-Role` headers.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::auth::{CurrentUser, Role};
use crate::error::WardError;

pub const STAFF_ID_HEADER: &str = "X-Staff-Id";
pub const STAFF_ROLE_HEADER: &str = "X-Staff-Role";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, WardError> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WardError::Forbidden(format!("missing {} header", name)))
}

fn current_user(req: &HttpRequest) -> Result<CurrentUser, WardError> {
    let staff_id = header(req, STAFF_ID_HEADER)?
        .trim()
        .parse::<i64>()
        .map_err(|_| WardError::Forbidden(format!("invalid {} header", STAFF_ID_HEADER)))?;
    let role = header(req, STAFF_ROLE_HEADER)?.parse::<Role>()?;

    Ok(CurrentUser::new(staff_id, role))
}

impl FromRequest for CurrentUser {
    type Error = WardError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(current_user(req))
    }
}
