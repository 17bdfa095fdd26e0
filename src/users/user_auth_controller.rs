use actix_web::{cookie::time::Duration as ActixWebDuration, cookie::Cookie, post, web, HttpResponse};
use serde_json::json;

use crate::errors::{ApiError, ApiErrorKind, ApiResponse};
use crate::sessions::{config_jwt, hash_tools, tokens};
use crate::settings::err;
#[cfg(not(feature = "mockdata"))]
use crate::users::user_orm::impls::UserOrmApp;
#[cfg(feature = "mockdata")]
use crate::users::user_orm::tests::UserOrmApp;
use crate::users::{
    user_models::{LoginUserDto, RegisterUserDto},
    user_orm::UserOrm,
};

pub const MSG_USERNAME_PASSWORD_REQUIRED: &str = "username and password must not be empty";
pub const MSG_LOGGED_OUT: &str = "Logout successful";

pub fn configure() -> impl FnOnce(&mut web::ServiceConfig) {
    |config: &mut web::ServiceConfig| {
        config
            // POST /api/register
            .service(register)
            // POST /api/login
            .service(login)
            // POST /api/logout
            .service(logout);
    }
}

fn blocking_error(e: actix_web::error::BlockingError) -> ApiError {
    log::error!("{}: {}; {}", err::CD_BLOCKING, err::MSG_BLOCKING, e.to_string());
    ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string())
}

/// Open a session for the given user: encode a token and wrap it in the
/// http-only session cookie.
fn session_cookie(
    config_jwt: &config_jwt::ConfigJwt,
    user_id: i64,
) -> Result<Cookie<'static>, ApiError> {
    let token = tokens::encode_token(user_id, config_jwt.jwt_secret.as_bytes(), config_jwt.jwt_maxage)
        .map_err(|e| {
            log::error!("{}: {}: {}", err::CD_SESSION_TOKEN, err::MSG_SESSION_TOKEN_ENCODE, e);
            ApiError::with_message(ApiErrorKind::UnknownError, err::MSG_SESSION_TOKEN_ENCODE)
        })?;

    Ok(Cookie::build("token", token)
        .path("/")
        .max_age(ActixWebDuration::new(config_jwt.jwt_maxage, 0))
        .http_only(true)
        .finish())
}

/// register
///
/// Register a new user account and open a session for it.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/register \
/// -d '{"username": "alice", "password": "secret"}' \
/// -H 'Content-Type: application/json'
/// ```
///
/// Returns the envelope with `{"user_id", "username"}` and sets the session
/// cookie. A taken username yields the user-exists error code.
///
#[post("/api/register")]
pub async fn register(
    config_jwt: web::Data<config_jwt::ConfigJwt>,
    user_orm: web::Data<UserOrmApp>,
    json_body: web::Json<RegisterUserDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let register_user_dto = json_body.into_inner();
    let username = register_user_dto.username.unwrap_or_default();
    let password = register_user_dto.password.unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_USERNAME_PASSWORD_REQUIRED);
        return Err(ApiError::null_element(MSG_USERNAME_PASSWORD_REQUIRED));
    }

    let password_hash = hash_tools::encode_hash(&password).map_err(|e| {
        log::error!("{}: {}", err::CD_HASHING_PASSWD, e.to_string());
        ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string())
    })?;

    let username2 = username.clone();
    let user_id = web::block(move || user_orm.register_user(&username2, &password_hash))
        .await
        .map_err(blocking_error)??;

    // The account exists now; log the new user in right away.
    let cookie = session_cookie(&config_jwt, user_id)?;
    let data = json!({ "user_id": user_id, "username": username });
    Ok(HttpResponse::Ok().cookie(cookie).json(ApiResponse::success(Some(data))))
}

/// login
///
/// Open a session for an existing user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/login \
/// -d '{"username": "alice", "password": "secret"}' \
/// -H 'Content-Type: application/json'
/// ```
///
/// An unknown username and a wrong password are deliberately reported with
/// the same invalid-credentials error code.
///
#[post("/api/login")]
pub async fn login(
    config_jwt: web::Data<config_jwt::ConfigJwt>,
    user_orm: web::Data<UserOrmApp>,
    json_body: web::Json<LoginUserDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let login_user_dto = json_body.into_inner();
    let username = login_user_dto.username.unwrap_or_default();
    let password = login_user_dto.password.unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_USERNAME_PASSWORD_REQUIRED);
        return Err(ApiError::null_element(MSG_USERNAME_PASSWORD_REQUIRED));
    }

    let username2 = username.clone();
    let opt_user = web::block(move || user_orm.find_login_user(&username2))
        .await
        .map_err(blocking_error)??;

    let user = opt_user.ok_or_else(|| {
        log::error!("{}: no active user: {}", err::CD_VALIDATION, &username);
        ApiError::kind(ApiErrorKind::InvalidCredentials)
    })?;

    let password_matches = hash_tools::verify_hash(&password, &user.password_hash).map_err(|e| {
        log::error!("{}: {}", err::CD_HASHING_PASSWD, e.to_string());
        ApiError::kind(ApiErrorKind::InvalidCredentials)
    })?;
    if !password_matches {
        return Err(ApiError::kind(ApiErrorKind::InvalidCredentials));
    }

    let cookie = session_cookie(&config_jwt, user.id)?;
    let data = serde_json::to_value(&user)
        .map_err(|e| ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string()))?;
    Ok(HttpResponse::Ok().cookie(cookie).json(ApiResponse::success(Some(data))))
}

/// logout
///
/// Close the current session.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/logout
/// ```
///
#[post("/api/logout")]
pub async fn logout() -> actix_web::Result<HttpResponse, ApiError> {
    // An expired cookie makes the browser delete the existing one.
    let cookie = Cookie::build("token", "")
        .path("/")
        .max_age(ActixWebDuration::new(-1, 0))
        .http_only(true)
        .finish();

    let data = json!({ "message": MSG_LOGGED_OUT });
    Ok(HttpResponse::Ok().cookie(cookie).json(ApiResponse::success(Some(data))))
}

#[cfg(all(test, feature = "mockdata"))]
mod tests {
    use actix_web::{dev, http, test, web, App};
    use serde_json::json;

    use crate::errors::{ApiErrorKind, ApiResponse};
    use crate::sessions::hash_tools;
    use crate::users::user_orm::tests::{MockUser, UserOrmApp, USER_ID_START};

    use super::*;

    const MSG_FAILED_DESER: &str = "Failed to deserialize response from JSON.";

    fn create_user(username: &str, password: &str) -> MockUser {
        let password_hash = hash_tools::encode_hash(password).unwrap();
        UserOrmApp::new_user(USER_ID_START, username, &password_hash)
    }

    fn configure_user_auth(
        config_jwt: config_jwt::ConfigJwt,
        user_vec: Vec<MockUser>,
    ) -> impl FnOnce(&mut web::ServiceConfig) {
        move |config: &mut web::ServiceConfig| {
            let data_config_jwt = web::Data::new(config_jwt);
            let data_user_orm = web::Data::new(UserOrmApp::create(&user_vec));

            config
                .app_data(web::Data::clone(&data_config_jwt))
                .app_data(web::Data::clone(&data_user_orm));
        }
    }

    fn token_cookie(resp: &dev::ServiceResponse) -> Option<String> {
        resp.response()
            .cookies()
            .find(|cookie| cookie.name() == "token")
            .map(|cookie| cookie.value().to_string())
    }

    #[test]
    async fn test_register_success_opens_session() {
        let config_jwt = config_jwt::get_test_config();
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(register).configure(configure_user_auth(config_jwt, vec![]))).await;
        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({ "username": "alice", "password": "secret" }))
            .to_request();

        let resp: dev::ServiceResponse = test::call_service(&app, req).await;
        assert_eq!(resp.status(), http::StatusCode::OK);

        let cookie = token_cookie(&resp);
        assert!(cookie.is_some());
        assert!(!cookie.unwrap().is_empty());

        let body = test::read_body(resp).await;
        let body: ApiResponse = serde_json::from_slice(&body).expect(MSG_FAILED_DESER);
        assert!(body.success);
        assert_eq!(body.error_code, ApiErrorKind::Success.code());
        assert_eq!(
            body.data,
            Some(json!({ "user_id": USER_ID_START, "username": "alice" }))
        );
    }

    #[test]
    async fn test_register_missing_fields_is_null_element() {
        let config_jwt = config_jwt::get_test_config();
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(register).configure(configure_user_auth(config_jwt, vec![]))).await;
        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({ "username": "alice" }))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.error_code, ApiErrorKind::NullElement.code());
        assert_eq!(body.error_msg, MSG_USERNAME_PASSWORD_REQUIRED);
    }

    #[test]
    async fn test_register_existing_username_is_user_exists() {
        let config_jwt = config_jwt::get_test_config();
        let user1 = create_user("alice", "secret");
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(register).configure(configure_user_auth(config_jwt, vec![user1]))).await;
        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({ "username": "alice", "password": "other" }))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.data, None);
        assert_eq!(body.error_code, ApiErrorKind::UserExists.code());
    }

    #[test]
    async fn test_login_success_returns_profile_without_hash() {
        let config_jwt = config_jwt::get_test_config();
        let user1 = create_user("alice", "secret");
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(login).configure(configure_user_auth(config_jwt, vec![user1]))).await;
        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "username": "alice", "password": "secret" }))
            .to_request();

        let resp: dev::ServiceResponse = test::call_service(&app, req).await;
        assert!(token_cookie(&resp).is_some());

        let body = test::read_body(resp).await;
        let body: ApiResponse = serde_json::from_slice(&body).expect(MSG_FAILED_DESER);
        assert!(body.success);

        let data = body.data.expect("data is missing");
        assert_eq!(data["id"], json!(USER_ID_START));
        assert_eq!(data["username"], json!("alice"));
        assert!(data.get("password_hash").is_none());
    }

    #[test]
    async fn test_login_wrong_password_is_invalid_credentials() {
        let config_jwt = config_jwt::get_test_config();
        let user1 = create_user("alice", "secret");
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(login).configure(configure_user_auth(config_jwt, vec![user1]))).await;
        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "username": "alice", "password": "wrong" }))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.error_code, ApiErrorKind::InvalidCredentials.code());
    }

    #[test]
    async fn test_login_unknown_user_is_invalid_credentials() {
        let config_jwt = config_jwt::get_test_config();
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(login).configure(configure_user_auth(config_jwt, vec![]))).await;
        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "username": "ghost", "password": "secret" }))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.error_code, ApiErrorKind::InvalidCredentials.code());
    }

    #[test]
    async fn test_logout_clears_session_cookie() {
        let config_jwt = config_jwt::get_test_config();
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(logout).configure(configure_user_auth(config_jwt, vec![]))).await;
        let req = test::TestRequest::post().uri("/api/logout").to_request();

        let resp: dev::ServiceResponse = test::call_service(&app, req).await;

        let cookie = resp
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "token")
            .expect("token cookie is missing");
        assert_eq!(cookie.value(), "");

        let body = test::read_body(resp).await;
        let body: ApiResponse = serde_json::from_slice(&body).expect(MSG_FAILED_DESER);
        assert!(body.success);
        assert_eq!(body.data, Some(json!({ "message": MSG_LOGGED_OUT })));
    }
}
