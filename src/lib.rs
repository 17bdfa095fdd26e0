use std::env;

use actix_cors::Cors;
use actix_web::{http, web};

use chats::chat_controller;
use chats::chat_orm::cfg::get_chat_orm_app;
use friends::friend_controller;
use friends::friend_orm::cfg::get_friend_orm_app;
use groups::group_controller;
use groups::group_orm::cfg::get_group_orm_app;
use sessions::config_jwt;
use users::{user_auth_controller, user_controller, user_orm::cfg::get_user_orm_app};

pub(crate) mod chats;
pub(crate) mod dbase;
pub(crate) mod errors;
pub(crate) mod extractors;
pub(crate) mod friends;
pub(crate) mod groups;
pub(crate) mod sessions;
pub mod settings;
pub(crate) mod users;

pub fn configure_server() -> Box<dyn Fn(&mut web::ServiceConfig)> {
    Box::new(move |cfg: &mut web::ServiceConfig| {
        let db_url = env::var("DATABASE_URL").expect("DATABASE_URL not found.");

        let pool: dbase::DbPool = dbase::init_db_pool(&db_url);

        let data_config_app = web::Data::new(settings::config_app::ConfigApp::init_by_env());
        let data_config_jwt = web::Data::new(config_jwt::ConfigJwt::init_by_env());
        let data_user_orm = web::Data::new(get_user_orm_app(pool.clone()));
        let data_friend_orm = web::Data::new(get_friend_orm_app(pool.clone()));
        let data_chat_orm = web::Data::new(get_chat_orm_app(pool.clone()));
        let data_group_orm = web::Data::new(get_group_orm_app(pool.clone()));

        // A malformed JSON body or query string is answered with the
        // unknown-error envelope instead of a bare 400.
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            log::error!("{}: {}", settings::err::CD_PARSE_BODY, err.to_string());
            errors::ApiError::with_message(
                errors::ApiErrorKind::UnknownError,
                &format!("error processing request: {}", err),
            )
            .into()
        });
        let query_config = web::QueryConfig::default().error_handler(|err, _req| {
            log::error!("{}: {}", settings::err::CD_PARSE_BODY, err.to_string());
            errors::ApiError::with_message(
                errors::ApiErrorKind::UnknownError,
                &format!("error processing request: {}", err),
            )
            .into()
        });

        cfg.app_data(json_config)
            .app_data(query_config)
            .app_data(web::Data::clone(&data_config_app))
            .app_data(web::Data::clone(&data_config_jwt))
            .app_data(web::Data::clone(&data_user_orm))
            .app_data(web::Data::clone(&data_friend_orm))
            .app_data(web::Data::clone(&data_chat_orm))
            .app_data(web::Data::clone(&data_group_orm))
            .configure(user_auth_controller::configure())
            .configure(user_controller::configure())
            .configure(friend_controller::configure())
            .configure(chat_controller::configure())
            .configure(group_controller::configure());
    })
}

pub fn create_cors(config_app: settings::config_app::ConfigApp) -> Cors {
    let app_domain = config_app.app_domain;
    // Maximum number of seconds the results can be cached.
    let app_max_age = config_app.app_max_age;

    let mut cors = Cors::default()
        .allowed_origin(&app_domain.to_string())
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
        .allowed_header(http::header::CONTENT_TYPE)
        // The session rides an http-only cookie.
        .supports_credentials()
        .max_age(app_max_age);

    let cors_allowed_origin: Vec<&str> = config_app.app_allowed_origin.split(',').collect();
    for allowed_origin in cors_allowed_origin.into_iter() {
        let allowed_origin = allowed_origin.trim();
        if !allowed_origin.is_empty() {
            cors = cors.allowed_origin(allowed_origin);
        }
    }
    cors
}
