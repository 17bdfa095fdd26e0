use actix_web::{get, post, web, HttpResponse};

use crate::chats::{
    chat_models::{MessagesQuery, SendMessageDto},
    chat_orm::ChatOrm,
};
#[cfg(not(feature = "mockdata"))]
use crate::chats::chat_orm::impls::ChatOrmApp;
#[cfg(feature = "mockdata")]
use crate::chats::chat_orm::tests::ChatOrmApp;
use crate::errors::{ApiError, ApiErrorKind, ApiResponse};
use crate::extractors::authentication::Authenticated;
use crate::settings::err;

pub const MSG_SEND_FIELDS_REQUIRED: &str = "conversation_id and message must not be empty";
pub const MSG_CONVERSATION_ID_REQUIRED: &str = "conversation_id must not be empty";

pub fn configure() -> impl FnOnce(&mut web::ServiceConfig) {
    |config: &mut web::ServiceConfig| {
        config
            // POST /api/message/send
            .service(send_message)
            // GET /api/message/list
            .service(get_messages)
            // GET /api/conversation/list
            .service(get_conversation_list);
    }
}

fn blocking_error(e: actix_web::error::BlockingError) -> ApiError {
    log::error!("{}: {}; {}", err::CD_BLOCKING, err::MSG_BLOCKING, e.to_string());
    ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string())
}

/// send_message
///
/// Post a message into a conversation on behalf of the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/message/send \
/// -d '{"conversation_id": 7, "message": "hello"}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/message/send")]
pub async fn send_message(
    authenticated: Authenticated,
    chat_orm: web::Data<ChatOrmApp>,
    json_body: web::Json<SendMessageDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;
    let send_message_dto = json_body.into_inner();
    let conversation_id = send_message_dto.conversation_id;
    let message = send_message_dto.message.unwrap_or_default();

    let conversation_id = match conversation_id {
        Some(conversation_id) if !message.is_empty() => conversation_id,
        _ => {
            log::error!("{}: {}", err::CD_VALIDATION, MSG_SEND_FIELDS_REQUIRED);
            return Err(ApiError::null_element(MSG_SEND_FIELDS_REQUIRED));
        }
    };

    web::block(move || chat_orm.send_message(user_id, conversation_id, &message))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// get_messages
///
/// Messages of one conversation, oldest first.
///
/// One could call with following curl.
/// ```text
/// curl -i -X GET http://localhost:8080/api/message/list?conversation_id=7
/// ```
///
#[get("/api/message/list")]
pub async fn get_messages(
    authenticated: Authenticated,
    chat_orm: web::Data<ChatOrmApp>,
    query: web::Query<MessagesQuery>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let _user_id = authenticated.user_id;

    let conversation_id = query.into_inner().conversation_id.ok_or_else(|| {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_CONVERSATION_ID_REQUIRED);
        ApiError::null_element(MSG_CONVERSATION_ID_REQUIRED)
    })?;

    let messages = web::block(move || chat_orm.get_messages(conversation_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(Some(serde_json::Value::Array(messages))).to_http())
}

/// get_conversation_list
///
/// Active conversations of the session user, private and group ones apart.
///
/// One could call with following curl.
/// ```text
/// curl -i -X GET http://localhost:8080/api/conversation/list
/// ```
///
#[get("/api/conversation/list")]
pub async fn get_conversation_list(
    authenticated: Authenticated,
    chat_orm: web::Data<ChatOrmApp>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;

    let conversations = web::block(move || chat_orm.get_conversation_list(user_id))
        .await
        .map_err(blocking_error)??;

    let data = serde_json::to_value(&conversations)
        .map_err(|e| ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string()))?;
    Ok(ApiResponse::success(Some(data)).to_http())
}

#[cfg(all(test, feature = "mockdata"))]
mod tests {
    use actix_web::{cookie::Cookie, test, web, App};
    use serde_json::json;

    use crate::chats::chat_orm::tests::MockMessage;
    use crate::sessions::{config_jwt, tokens::encode_token};

    use super::*;

    const USER_ID: i64 = 1201;
    const OTHER_ID: i64 = 1202;
    const CONVERSATION_ID: i64 = 9001;

    fn configure_chat(
        config_jwt: config_jwt::ConfigJwt,
        chat_orm: ChatOrmApp,
    ) -> impl FnOnce(&mut web::ServiceConfig) {
        move |config: &mut web::ServiceConfig| {
            let data_config_jwt = web::Data::new(config_jwt);
            let data_chat_orm = web::Data::new(chat_orm);

            config
                .app_data(web::Data::clone(&data_config_jwt))
                .app_data(web::Data::clone(&data_chat_orm));
        }
    }

    fn session_token(config_jwt: &config_jwt::ConfigJwt, user_id: i64) -> String {
        encode_token(user_id, config_jwt.jwt_secret.as_bytes(), config_jwt.jwt_maxage).unwrap()
    }

    #[test]
    async fn test_send_message_success() {
        let config_jwt = config_jwt::get_test_config();
        let token = session_token(&config_jwt, USER_ID);
        let conversation = ChatOrmApp::new_conversation(CONVERSATION_ID, &[USER_ID, OTHER_ID]);
        let chat_orm = ChatOrmApp::create(&[conversation]);
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(send_message).configure(configure_chat(config_jwt, chat_orm))).await;
        let req = test::TestRequest::post()
            .uri("/api/message/send")
            .cookie(Cookie::new("token", token))
            .set_json(json!({ "conversation_id": CONVERSATION_ID, "message": "hello" }))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(body.success);
    }

    #[test]
    async fn test_send_message_missing_fields_is_null_element() {
        let config_jwt = config_jwt::get_test_config();
        let token = session_token(&config_jwt, USER_ID);
        let chat_orm = ChatOrmApp::new();
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(send_message).configure(configure_chat(config_jwt, chat_orm))).await;
        let req = test::TestRequest::post()
            .uri("/api/message/send")
            .cookie(Cookie::new("token", token))
            .set_json(json!({ "conversation_id": CONVERSATION_ID }))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.error_code, ApiErrorKind::NullElement.code());
        assert_eq!(body.error_msg, MSG_SEND_FIELDS_REQUIRED);
    }

    #[test]
    async fn test_send_message_to_missing_conversation() {
        let config_jwt = config_jwt::get_test_config();
        let token = session_token(&config_jwt, USER_ID);
        let chat_orm = ChatOrmApp::new();
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(send_message).configure(configure_chat(config_jwt, chat_orm))).await;
        let req = test::TestRequest::post()
            .uri("/api/message/send")
            .cookie(Cookie::new("token", token))
            .set_json(json!({ "conversation_id": CONVERSATION_ID, "message": "hello" }))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.error_code, ApiErrorKind::ConversationNotExists.code());
    }

    #[test]
    async fn test_send_message_as_outsider_is_not_conversation_member() {
        let config_jwt = config_jwt::get_test_config();
        let token = session_token(&config_jwt, USER_ID);
        let conversation = ChatOrmApp::new_conversation(CONVERSATION_ID, &[OTHER_ID]);
        let chat_orm = ChatOrmApp::create(&[conversation]);
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(send_message).configure(configure_chat(config_jwt, chat_orm))).await;
        let req = test::TestRequest::post()
            .uri("/api/message/send")
            .cookie(Cookie::new("token", token))
            .set_json(json!({ "conversation_id": CONVERSATION_ID, "message": "hello" }))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.error_code, ApiErrorKind::NotConversationMember.code());
    }

    #[test]
    async fn test_get_messages_success() {
        let config_jwt = config_jwt::get_test_config();
        let token = session_token(&config_jwt, USER_ID);
        let conversation = ChatOrmApp::new_conversation(CONVERSATION_ID, &[USER_ID, OTHER_ID]);
        let mut chat_orm = ChatOrmApp::create(&[conversation]);
        chat_orm.message_vec.push(MockMessage {
            id: 1,
            conversation_id: CONVERSATION_ID,
            sender_id: OTHER_ID,
            content: "hello".to_string(),
        });
        chat_orm.message_vec.push(MockMessage {
            id: 2,
            conversation_id: CONVERSATION_ID + 1,
            sender_id: OTHER_ID,
            content: "elsewhere".to_string(),
        });
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(get_messages).configure(configure_chat(config_jwt, chat_orm))).await;
        let req = test::TestRequest::get()
            .uri(&format!("/api/message/list?conversation_id={}", CONVERSATION_ID))
            .cookie(Cookie::new("token", token))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(body.success);
        let data = body.data.expect("data is missing");
        let rows = data.as_array().expect("data is not an array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["content"], json!("hello"));
    }

    #[test]
    async fn test_get_messages_without_conversation_id_is_null_element() {
        let config_jwt = config_jwt::get_test_config();
        let token = session_token(&config_jwt, USER_ID);
        let chat_orm = ChatOrmApp::new();
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(get_messages).configure(configure_chat(config_jwt, chat_orm))).await;
        let req = test::TestRequest::get()
            .uri("/api/message/list")
            .cookie(Cookie::new("token", token))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.error_code, ApiErrorKind::NullElement.code());
        assert_eq!(body.error_msg, MSG_CONVERSATION_ID_REQUIRED);
    }

    #[test]
    async fn test_get_conversation_list_success() {
        let config_jwt = config_jwt::get_test_config();
        let token = session_token(&config_jwt, USER_ID);
        let conversation1 = ChatOrmApp::new_conversation(CONVERSATION_ID, &[USER_ID, OTHER_ID]);
        let conversation2 = ChatOrmApp::new_conversation(CONVERSATION_ID + 1, &[OTHER_ID]);
        let chat_orm = ChatOrmApp::create(&[conversation1, conversation2]);
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(get_conversation_list).configure(configure_chat(config_jwt, chat_orm))).await;
        let req = test::TestRequest::get()
            .uri("/api/conversation/list")
            .cookie(Cookie::new("token", token))
            .to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(body.success);
        let data = body.data.expect("data is missing");
        assert_eq!(data["private"].as_array().unwrap().len(), 1);
        assert_eq!(data["group"].as_array().unwrap().len(), 0);
    }

    #[test]
    async fn test_get_conversation_list_without_session() {
        let config_jwt = config_jwt::get_test_config();
        let chat_orm = ChatOrmApp::new();
        #[rustfmt::skip]
        let app = test::init_service(
            App::new().service(get_conversation_list).configure(configure_chat(config_jwt, chat_orm))).await;
        let req = test::TestRequest::get().uri("/api/conversation/list").to_request();

        let body: ApiResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.success);
        assert_eq!(body.error_code, ApiErrorKind::UserNotLoggedIn.code());
    }
}
