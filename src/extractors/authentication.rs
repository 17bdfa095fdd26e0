use actix_web::{dev, http, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::errors::ApiError;
use crate::sessions::{config_jwt, tokens};
use crate::settings::err;

pub const BEARER: &str = "Bearer ";

/// The identity recovered from the session token.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub user_id: i64,
}

/// Extractor gating a handler on a live session.
///
/// The token is taken from the "token" cookie, or from a bearer Authorization
/// header as a fallback. A missing or undecodable token short-circuits the
/// request with the not-logged-in envelope before the handler runs.
pub struct Authenticated(SessionUser);

impl FromRequest for Authenticated {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut dev::Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl std::ops::Deref for Authenticated {
    type Target = SessionUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn authenticate(req: &HttpRequest) -> Result<Authenticated, ApiError> {
    let token = token_from_request(req).ok_or_else(|| {
        log::error!("{}: {}", err::CD_NOT_LOGGED_IN, err::MSG_TOKEN_MISSING);
        ApiError::not_logged_in()
    })?;

    let config_jwt = req.app_data::<web::Data<config_jwt::ConfigJwt>>().ok_or_else(|| {
        log::error!("{}: ConfigJwt is not registered.", err::CD_NOT_LOGGED_IN);
        ApiError::not_logged_in()
    })?;
    let jwt_secret: &[u8] = config_jwt.jwt_secret.as_bytes();

    let user_id = tokens::decode_token(&token, jwt_secret).map_err(|e| {
        log::error!("{}: {}: {}", err::CD_NOT_LOGGED_IN, err::MSG_INVALID_OR_EXPIRED_TOKEN, &e);
        ApiError::not_logged_in()
    })?;

    Ok(Authenticated(SessionUser { user_id }))
}

fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie("token") {
        return Some(cookie.value().to_string());
    }
    let header = req.headers().get(http::header::AUTHORIZATION)?.to_str().ok()?;
    if !header.starts_with(BEARER) {
        return None;
    }
    Some(header.trim_start_matches(BEARER).to_string())
}
