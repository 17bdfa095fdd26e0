use actix_web::{get, post, web, HttpResponse};

use crate::errors::{ApiError, ApiErrorKind, ApiResponse};
use crate::extractors::authentication::Authenticated;
use crate::sessions::hash_tools;
use crate::settings::err;
#[cfg(not(feature = "mockdata"))]
use crate::users::user_orm::impls::UserOrmApp;
#[cfg(feature = "mockdata")]
use crate::users::user_orm::tests::UserOrmApp;
use crate::users::{
    user_models::{SearchUsersQuery, UpdateUserDto},
    user_orm::UserOrm,
};

pub const MSG_UPDATE_FIELDS_REQUIRED: &str = "password, phone and display_name must not be empty";
pub const MSG_KEYWORD_REQUIRED: &str = "search keyword must not be empty";

pub fn configure() -> impl FnOnce(&mut web::ServiceConfig) {
    |config: &mut web::ServiceConfig| {
        config
            // GET /api/user/info
            .service(get_user_info)
            // POST /api/user/update
            .service(update_user_info)
            // GET /api/search/users
            .service(search_users);
    }
}

fn blocking_error(e: actix_web::error::BlockingError) -> ApiError {
    log::error!("{}: {}; {}", err::CD_BLOCKING, err::MSG_BLOCKING, e.to_string());
    ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string())
}

/// get_user_info
///
/// Profile of the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X GET http://localhost:8080/api/user/info
/// ```
///
#[get("/api/user/info")]
pub async fn get_user_info(
    authenticated: Authenticated,
    user_orm: web::Data<UserOrmApp>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;

    let opt_user = web::block(move || user_orm.get_user_info(user_id))
        .await
        .map_err(blocking_error)??;

    let user = opt_user.ok_or_else(|| ApiError::kind(ApiErrorKind::UserNotExists))?;
    Ok(ApiResponse::success(Some(user)).to_http())
}

/// update_user_info
///
/// Replace the password, phone and display name of the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/user/update \
/// -d '{"password": "secret", "phone": "12025550117", "display_name": "Alice"}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/user/update")]
pub async fn update_user_info(
    authenticated: Authenticated,
    user_orm: web::Data<UserOrmApp>,
    json_body: web::Json<UpdateUserDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;
    let update_user_dto = json_body.into_inner();
    let password = update_user_dto.password.unwrap_or_default();
    let phone = update_user_dto.phone.unwrap_or_default();
    let display_name = update_user_dto.display_name.unwrap_or_default();

    if password.is_empty() || phone.is_empty() || display_name.is_empty() {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_UPDATE_FIELDS_REQUIRED);
        return Err(ApiError::null_element(MSG_UPDATE_FIELDS_REQUIRED));
    }

    let password_hash = hash_tools::encode_hash(&password).map_err(|e| {
        log::error!("{}: {}", err::CD_HASHING_PASSWD, e.to_string());
        ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string())
    })?;

    web::block(move || user_orm.update_user_info(user_id, &password_hash, &phone, &display_name))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// search_users
///
/// Look up users by username or display name, for adding friends. Open to
/// unauthenticated callers.
///
/// One could call with following curl.
/// ```text
/// curl -i -X GET http://localhost:8080/api/search/users?keyword=ali
/// ```
///
#[get("/api/search/users")]
pub async fn search_users(
    user_orm: web::Data<UserOrmApp>,
    query: web::Query<SearchUsersQuery>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let keyword = query.into_inner().keyword.unwrap_or_default();

    if keyword.is_empty() {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_KEYWORD_REQUIRED);
        return Err(ApiError::null_element(MSG_KEYWORD_REQUIRED));
    }

    let users = web::block(move || user_orm.search_users(&keyword))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(Some(serde_json::Value::Array(users))).to_http())
}
