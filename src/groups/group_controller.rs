use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::errors::{ApiError, ApiErrorKind, ApiResponse};
use crate::extractors::authentication::Authenticated;
#[cfg(not(feature = "mockdata"))]
use crate::groups::group_orm::impls::GroupOrmApp;
#[cfg(feature = "mockdata")]
use crate::groups::group_orm::tests::GroupOrmApp;
use crate::groups::{
    group_models::{
        CreateGroupDto, DissolveGroupDto, ExitGroupDto, GroupMembersQuery, InviteToGroupDto,
        MemberPermissionDto, ModifyGroupDto, DEFAULT_GROUP_LIMITATION,
    },
    group_orm::GroupOrm,
};
use crate::settings::err;

pub const MSG_GROUP_NAME_REQUIRED: &str = "group_name must not be empty";
pub const MSG_INVITE_FIELDS_REQUIRED: &str = "invitee_id and group_id must not be empty";
pub const MSG_MODIFY_FIELDS_REQUIRED: &str =
    "group_id, group_name, limitation and allow_new_member must not be empty";
pub const MSG_PERMISSION_FIELDS_REQUIRED: &str =
    "member_id, group_id and permission must not be empty";
pub const MSG_GROUP_ID_REQUIRED: &str = "group_id must not be empty";

pub fn configure() -> impl FnOnce(&mut web::ServiceConfig) {
    |config: &mut web::ServiceConfig| {
        config
            // POST /api/group/create
            .service(create_group)
            // POST /api/group/invite
            .service(invite_to_group)
            // POST /api/group/modify
            .service(modify_group_option)
            // POST /api/group/permission
            .service(modify_member_permission)
            // POST /api/group/exit
            .service(exit_group)
            // POST /api/group/dissolve
            .service(dissolve_group)
            // GET /api/group/list
            .service(get_group_list)
            // GET /api/group/members
            .service(get_group_members);
    }
}

fn blocking_error(e: actix_web::error::BlockingError) -> ApiError {
    log::error!("{}: {}; {}", err::CD_BLOCKING, err::MSG_BLOCKING, e.to_string());
    ApiError::with_message(ApiErrorKind::UnknownError, &e.to_string())
}

/// create_group
///
/// Create a group owned by the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/group/create \
/// -d '{"group_name": "rustaceans", "limitation": 50}' \
/// -H 'Content-Type: application/json'
/// ```
///
/// Returns the envelope with `{"group_id"}`. The member cap defaults to 20
/// and its validity is checked by `proc_create_group`.
///
#[post("/api/group/create")]
pub async fn create_group(
    authenticated: Authenticated,
    group_orm: web::Data<GroupOrmApp>,
    json_body: web::Json<CreateGroupDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;
    let create_group_dto = json_body.into_inner();
    let group_name = create_group_dto.group_name.unwrap_or_default();
    let limitation = create_group_dto.limitation.unwrap_or(DEFAULT_GROUP_LIMITATION);

    if group_name.is_empty() {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_GROUP_NAME_REQUIRED);
        return Err(ApiError::null_element(MSG_GROUP_NAME_REQUIRED));
    }

    let group_id = web::block(move || group_orm.create_group(user_id, &group_name, limitation))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(Some(json!({ "group_id": group_id }))).to_http())
}

/// invite_to_group
///
/// Invite another user into a group the session user belongs to.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/group/invite \
/// -d '{"invitee_id": 2, "group_id": 7}' \
/// -H 'Content-Type: application/json'
/// ```
///
/// Membership caps and the allow-new-member switch are enforced by
/// `proc_invite_into_group`.
///
#[post("/api/group/invite")]
pub async fn invite_to_group(
    authenticated: Authenticated,
    group_orm: web::Data<GroupOrmApp>,
    json_body: web::Json<InviteToGroupDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;
    let invite_to_group_dto = json_body.into_inner();

    let (invitee_id, group_id) =
        match (invite_to_group_dto.invitee_id, invite_to_group_dto.group_id) {
            (Some(invitee_id), Some(group_id)) => (invitee_id, group_id),
            _ => {
                log::error!("{}: {}", err::CD_VALIDATION, MSG_INVITE_FIELDS_REQUIRED);
                return Err(ApiError::null_element(MSG_INVITE_FIELDS_REQUIRED));
            }
        };

    web::block(move || group_orm.invite_to_group(user_id, invitee_id, group_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// modify_group_option
///
/// Change name, member cap and the allow-new-member switch of a group.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/group/modify \
/// -d '{"group_id": 7, "group_name": "rustaceans", "limitation": 50, "allow_new_member": true}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/group/modify")]
pub async fn modify_group_option(
    authenticated: Authenticated,
    group_orm: web::Data<GroupOrmApp>,
    json_body: web::Json<ModifyGroupDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;
    let modify_group_dto = json_body.into_inner();
    let group_name = modify_group_dto.group_name.unwrap_or_default();

    let (group_id, limitation, allow_new_member) = match (
        modify_group_dto.group_id,
        modify_group_dto.limitation,
        modify_group_dto.allow_new_member,
    ) {
        (Some(group_id), Some(limitation), Some(allow_new_member)) if !group_name.is_empty() => {
            (group_id, limitation, allow_new_member)
        }
        _ => {
            log::error!("{}: {}", err::CD_VALIDATION, MSG_MODIFY_FIELDS_REQUIRED);
            return Err(ApiError::null_element(MSG_MODIFY_FIELDS_REQUIRED));
        }
    };

    web::block(move || {
        group_orm.modify_group_option(user_id, group_id, &group_name, limitation, allow_new_member)
    })
    .await
    .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// modify_member_permission
///
/// Change the permission level of a group member.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/group/permission \
/// -d '{"member_id": 2, "group_id": 7, "permission": 1}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/group/permission")]
pub async fn modify_member_permission(
    authenticated: Authenticated,
    group_orm: web::Data<GroupOrmApp>,
    json_body: web::Json<MemberPermissionDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;
    let member_permission_dto = json_body.into_inner();

    let (member_id, group_id, permission) = match (
        member_permission_dto.member_id,
        member_permission_dto.group_id,
        member_permission_dto.permission,
    ) {
        (Some(member_id), Some(group_id), Some(permission)) => (member_id, group_id, permission),
        _ => {
            log::error!("{}: {}", err::CD_VALIDATION, MSG_PERMISSION_FIELDS_REQUIRED);
            return Err(ApiError::null_element(MSG_PERMISSION_FIELDS_REQUIRED));
        }
    };

    web::block(move || group_orm.modify_member_permission(user_id, member_id, group_id, permission))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// exit_group
///
/// Leave a group, or remove another member when the session user has the
/// permission to.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/group/exit \
/// -d '{"group_id": 7}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/group/exit")]
pub async fn exit_group(
    authenticated: Authenticated,
    group_orm: web::Data<GroupOrmApp>,
    json_body: web::Json<ExitGroupDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;
    let exit_group_dto = json_body.into_inner();
    // Without an explicit target the user leaves on their own.
    let target_id = exit_group_dto.target_id.unwrap_or(user_id);

    let group_id = exit_group_dto.group_id.ok_or_else(|| {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_GROUP_ID_REQUIRED);
        ApiError::null_element(MSG_GROUP_ID_REQUIRED)
    })?;

    web::block(move || group_orm.exit_group(user_id, target_id, group_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// dissolve_group
///
/// Dissolve a group owned by the session user.
///
/// One could call with following curl.
/// ```text
/// curl -i -X POST http://localhost:8080/api/group/dissolve \
/// -d '{"group_id": 7}' \
/// -H 'Content-Type: application/json'
/// ```
///
#[post("/api/group/dissolve")]
pub async fn dissolve_group(
    authenticated: Authenticated,
    group_orm: web::Data<GroupOrmApp>,
    json_body: web::Json<DissolveGroupDto>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;

    let group_id = json_body.into_inner().group_id.ok_or_else(|| {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_GROUP_ID_REQUIRED);
        ApiError::null_element(MSG_GROUP_ID_REQUIRED)
    })?;

    web::block(move || group_orm.dissolve_group(user_id, group_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(None).to_http())
}

/// get_group_list
///
/// Groups the session user belongs to.
///
/// One could call with following curl.
/// ```text
/// curl -i -X GET http://localhost:8080/api/group/list
/// ```
///
#[get("/api/group/list")]
pub async fn get_group_list(
    authenticated: Authenticated,
    group_orm: web::Data<GroupOrmApp>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let user_id = authenticated.user_id;

    let groups = web::block(move || group_orm.get_group_list(user_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(Some(serde_json::Value::Array(groups))).to_http())
}

/// get_group_members
///
/// Members of a group, highest permission first.
///
/// One could call with following curl.
/// ```text
/// curl -i -X GET http://localhost:8080/api/group/members?group_id=7
/// ```
///
#[get("/api/group/members")]
pub async fn get_group_members(
    authenticated: Authenticated,
    group_orm: web::Data<GroupOrmApp>,
    query: web::Query<GroupMembersQuery>,
) -> actix_web::Result<HttpResponse, ApiError> {
    let _user_id = authenticated.user_id;

    let group_id = query.into_inner().group_id.ok_or_else(|| {
        log::error!("{}: {}", err::CD_VALIDATION, MSG_GROUP_ID_REQUIRED);
        ApiError::null_element(MSG_GROUP_ID_REQUIRED)
    })?;

    let members = web::block(move || group_orm.get_group_members(group_id))
        .await
        .map_err(blocking_error)??;

    Ok(ApiResponse::success(Some(serde_json::Value::Array(members))).to_http())
}
