use actix_web::{get, post, web, HttpResponse};

use crate::errors::{ApiError, ApiErrorKind, ApiResponse};
use crate::extractors::authentication::Authenticated;
#[cfg(not(feature = "mockdata"))]
use crate::friends::friend_orm::impls::FriendOrmApp;
#[cfg(feature = "mockdata")]
use crate::friends::friend_orm::tests::FriendOrmApp;
use crate::friends::{
    friend_models::{
        BlockUserDto, DeleteFriendDto, RespondFriendRequestDto, SendFriendRequestDto,
        RESPONSE_ACCEPT, RESPONSE_REJECT,
    },
    friend_orm::FriendOrm,
};
use crate::settings::err;

pub const MSG_RECEIVER_ID_REQUIRED: &str = "receiver_id must not be empty";
pub const MSG_RESPOND_PARAMS_INVALID: &str = "sender_id and a response of accept or reject are required";
pub const MSG_FRIEND_ID_REQUIRED: &str = "friend_id must not be empty";
pub const MSG_BLOCKED_ID_REQUIRED: &str = "blocked_id must not be empty";

pub fn configure() -> impl FnOnce(&mut web::ServiceConfig) {
    |config: &mut web::ServiceConfig| {
        config
            // POST /api/friend/request
            .service(send_friend_request)
            // POST /api/friend/respond
            .service(respond_friend_request)
            // POST /api/friend/delete
            .service(delete_friend)
            // POST /api/friend/block
            .service(block_user)
            // GET /api/friend/list
            .service(get_friend_list)
            // GET /api/friend/requests
            .service(get_friend_requests);
    }
}

fn blocking_error(e: actix_web::error::BlockingError) -> ApiError {
    log::error!("{}: {}; {}", err::CD_BLOCKING, err::MSG_BLOCKING, e.to_string());
    ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string())
}

/// send_friend_request
///
/// Send a friend request from the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/friend/request \
/// -d '{"receiver_id": 2, "message": "hello"}' \
/// -H 'Content-Type: application/json'
/// ```
///
/// The friend-request state machine (already friends, blocked, duplicate
/// request, sending to oneself) is enforced by `proc_send_friend_req`.
///
#[post("/api/friend/request")]
pub async fn send_friend_request(
    authenticated: Authenticated,
    friend_orm: web::Data<FriendOrmApp>,
    json_body: web::Json<SendFriendRequestDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let sender_id = authenticated.user_id;
    let send_friend_request_dto = json_body.into_inner();
    let message = send_friend_request_dto.message.unwrap_or_default();

    let receiver_id = send_friend_request_dto.receiver_id.ok_or_else(|| {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_RECEIVER_ID_REQUIRED);
        ApiError::null_element(MSG_RECEIVER_ID_REQUIRED)
    })?;

    web::block(move || friend_orm.send_friend_request(sender_id, receiver_id, &message))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// respond_friend_request
///
/// Accept or reject a pending friend request addressed to the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/friend/respond \
/// -d '{"sender_id": 2, "response": "accept"}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/friend/respond")]
pub async fn respond_friend_request(
    authenticated: Authenticated,
    friend_orm: web::Data<FriendOrmApp>,
    json_body: web::Json<RespondFriendRequestDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let receiver_id = authenticated.user_id;
    let respond_friend_request_dto = json_body.into_inner();
    let sender_id = respond_friend_request_dto.sender_id;
    let response = respond_friend_request_dto.response.unwrap_or_default();

    let valid_response = response == RESPONSE_ACCEPT || response == RESPONSE_REJECT;
    let sender_id = match (sender_id, valid_response) {
        (Some(sender_id), true) => sender_id,
        _ => {
            log::error!("{}: {}", err::CD_VALIDATION, MSG_RESPOND_PARAMS_INVALID);
            return Err(ApiError::null_element(MSG_RESPOND_PARAMS_INVALID));
        }
    };

    web::block(move || friend_orm.respond_friend_request(receiver_id, sender_id, &response))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// delete_friend
///
/// Remove a friend of the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/friend/delete \
/// -d '{"friend_id": 2}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/friend/delete")]
pub async fn delete_friend(
    authenticated: Authenticated,
    friend_orm: web::Data<FriendOrmApp>,
    json_body: web::Json<DeleteFriendDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;

    let friend_id = json_body.into_inner().friend_id.ok_or_else(|| {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_FRIEND_ID_REQUIRED);
        ApiError::null_element(MSG_FRIEND_ID_REQUIRED)
    })?;

    web::block(move || friend_orm.delete_friend(user_id, friend_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// block_user
///
/// Block another user on behalf of the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/friend/block \
/// -d '{"blocked_id": 2}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/friend/block")]
pub async fn block_user(
    authenticated: Authenticated,
    friend_orm: web::Data<FriendOrmApp>,
    json_body: web::Json<BlockUserDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let blocker_id = authenticated.user_id;

    let blocked_id = json_body.into_inner().blocked_id.ok_or_else(|| {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_BLOCKED_ID_REQUIRED);
        ApiError::null_element(MSG_BLOCKED_ID_REQUIRED)
    })?;

    web::block(move || friend_orm.block_user(blocker_id, blocked_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// get_friend_list
///
/// Friends of the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X GET http://localhost:8080/api/friend/list
/// ```
///
#[get("/api/friend/list")]
pub async fn get_friend_list(
    authenticated: Authenticated,
    friend_orm: web::Data<FriendOrmApp>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;

    let friends = web::block(move || friend_orm.get_friend_list(user_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(Some(serde_json::Value::Array(friends))).to_http())
}

/// get_friend_requests
///
/// Friend requests received by and sent by the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X GET http://localhost:8080/api/friend/requests
/// ```
///
#[get("/api/friend/requests")]
pub async fn get_friend_requests(
    authenticated: Authenticated,
    friend_orm: web::Data<FriendOrmApp>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;

    let requests = web::block(move || friend_orm.get_friend_requests(user_id))
        .await
        .map_err(blocking_error)??;

    let data = serde_json::to_value(&requests)
        .map_err(|e| ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string()))?;
    Ok(ApiResponse::success(Some(data)).to_http())
}
