use std::fmt;

use actix_web::{http, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unified error codes for the whole API.
///
/// The stored procedures signal failures with inconsistent numeric codes and
/// free-text messages; every one of them is reduced to a member of this closed
/// enumeration before it reaches a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Success,
    UserExists,
    UserNotExists,
    UserNotLoggedIn,
    InvalidCredentials,
    NullElement,

    AlreadyFriends,
    NotFriends,
    Blocked,
    ShouldUnblockFirstly,
    CannotSendToSelf,
    RequestAlreadySent,
    NoSuchPendingRequest,
    AlreadyBlocked,

    ConversationNotExists,
    NotConversationMember,
    PermissionDenied,

    GroupNotExists,
    GroupFull,
    GroupNotAllowNewMember,
    InviterNotInGroup,
    InviteeAlreadyInGroup,
    MemberNotInGroup,
    OwnerShouldTransferred,
    InvalidLimitation,

    SqlException,
    UnknownError,
}

impl ApiErrorKind {
    /// Numeric code as serialized in the response envelope.
    pub fn code(&self) -> i32 {
        match self {
            ApiErrorKind::Success => 0,
            ApiErrorKind::UserExists => 1001,
            ApiErrorKind::UserNotExists => 1002,
            ApiErrorKind::UserNotLoggedIn => 1003,
            ApiErrorKind::InvalidCredentials => 1004,
            ApiErrorKind::NullElement => 1005,
            ApiErrorKind::AlreadyFriends => 2001,
            ApiErrorKind::NotFriends => 2002,
            ApiErrorKind::Blocked => 2003,
            ApiErrorKind::ShouldUnblockFirstly => 2004,
            ApiErrorKind::CannotSendToSelf => 2005,
            ApiErrorKind::RequestAlreadySent => 2006,
            ApiErrorKind::NoSuchPendingRequest => 2007,
            ApiErrorKind::AlreadyBlocked => 2008,
            ApiErrorKind::ConversationNotExists => 3001,
            ApiErrorKind::NotConversationMember => 3002,
            ApiErrorKind::PermissionDenied => 3003,
            ApiErrorKind::GroupNotExists => 4001,
            ApiErrorKind::GroupFull => 4002,
            ApiErrorKind::GroupNotAllowNewMember => 4003,
            ApiErrorKind::InviterNotInGroup => 4004,
            ApiErrorKind::InviteeAlreadyInGroup => 4005,
            ApiErrorKind::MemberNotInGroup => 4006,
            ApiErrorKind::OwnerShouldTransferred => 4007,
            ApiErrorKind::InvalidLimitation => 4008,
            ApiErrorKind::SqlException => 5000,
            ApiErrorKind::UnknownError => 5999,
        }
    }

    /// Canonical client-facing message for this kind.
    pub fn message(&self) -> &'static str {
        match self {
            ApiErrorKind::Success => "Operation successful",
            ApiErrorKind::UserExists => "User already exists",
            ApiErrorKind::UserNotExists => "User does not exist",
            ApiErrorKind::UserNotLoggedIn => "User is not logged in",
            ApiErrorKind::InvalidCredentials => "Incorrect username or password",
            ApiErrorKind::NullElement => "Required parameter is missing",
            ApiErrorKind::AlreadyFriends => "Already friends",
            ApiErrorKind::NotFriends => "Not friends",
            ApiErrorKind::Blocked => "Blocked by the other user",
            ApiErrorKind::ShouldUnblockFirstly => "Unblock the user first",
            ApiErrorKind::CannotSendToSelf => "Cannot send a request to oneself",
            ApiErrorKind::RequestAlreadySent => "Request already sent",
            ApiErrorKind::NoSuchPendingRequest => "No pending friend request",
            ApiErrorKind::AlreadyBlocked => "Already blocked",
            ApiErrorKind::ConversationNotExists => "Conversation does not exist or is not active",
            ApiErrorKind::NotConversationMember => "Not a member of the conversation",
            ApiErrorKind::PermissionDenied => "Permission denied",
            ApiErrorKind::GroupNotExists => "Group does not exist",
            ApiErrorKind::GroupFull => "Group is full",
            ApiErrorKind::GroupNotAllowNewMember => "Group does not allow new members",
            ApiErrorKind::InviterNotInGroup => "Inviter is not in the group",
            ApiErrorKind::InviteeAlreadyInGroup => "Invitee is already in the group",
            ApiErrorKind::MemberNotInGroup => "Member is not in the group",
            ApiErrorKind::OwnerShouldTransferred => "Owner must transfer ownership first",
            ApiErrorKind::InvalidLimitation => "Invalid group member limitation",
            ApiErrorKind::SqlException => "Database error",
            ApiErrorKind::UnknownError => "Unknown error",
        }
    }
}

/// Map a raw (code, message) pair reported by a stored procedure to a unified
/// error kind and a client-facing message.
///
/// The raw codes are not consistent across procedures, so apart from the two
/// reserved codes (0 = success, 500 = SQL exception) the mapping keys off
/// case-insensitive substrings of the raw message. The rules are checked in a
/// fixed order; the generic "not in group" rule must stay after the more
/// specific "inviter is not in group" / "invitee is in group" rules, which it
/// would otherwise shadow.
pub fn normalize_sql_error(raw_code: i32, raw_msg: &str) -> (ApiErrorKind, String) {
    fn hit(kind: ApiErrorKind) -> (ApiErrorKind, String) {
        (kind, kind.message().to_string())
    }

    if raw_code == 0 {
        return hit(ApiErrorKind::Success);
    }
    if raw_code == 500 {
        return hit(ApiErrorKind::SqlException);
    }

    let msg = raw_msg.to_lowercase();

    // User rules.
    if msg.contains("user exists") {
        return hit(ApiErrorKind::UserExists);
    }
    if msg.contains("user not exists") {
        return hit(ApiErrorKind::UserNotExists);
    }
    if msg.contains("null element") {
        return hit(ApiErrorKind::NullElement);
    }

    // Friend rules.
    if msg.contains("already friends") {
        return hit(ApiErrorKind::AlreadyFriends);
    }
    if msg.contains("not friends") {
        return hit(ApiErrorKind::NotFriends);
    }
    if msg.contains("blocked") && !msg.contains("already") {
        return hit(ApiErrorKind::Blocked);
    }
    if msg.contains("already blocked") {
        return hit(ApiErrorKind::AlreadyBlocked);
    }
    if msg.contains("should unblock") {
        return hit(ApiErrorKind::ShouldUnblockFirstly);
    }
    if msg.contains("to oneself") {
        return hit(ApiErrorKind::CannotSendToSelf);
    }
    if msg.contains("request already sent") {
        return hit(ApiErrorKind::RequestAlreadySent);
    }
    if msg.contains("no such pending request") {
        return hit(ApiErrorKind::NoSuchPendingRequest);
    }

    // Conversation rules.
    if msg.contains("conversation not exists") || msg.contains("not active") {
        return hit(ApiErrorKind::ConversationNotExists);
    }
    if msg.contains("not conversation member") {
        return hit(ApiErrorKind::NotConversationMember);
    }
    if msg.contains("permission denied") {
        return hit(ApiErrorKind::PermissionDenied);
    }

    // Group rules.
    if msg.contains("group is full") {
        return hit(ApiErrorKind::GroupFull);
    }
    if msg.contains("does not allow new member") {
        return hit(ApiErrorKind::GroupNotAllowNewMember);
    }
    if msg.contains("inviter is not in group") {
        return hit(ApiErrorKind::InviterNotInGroup);
    }
    if msg.contains("invitee is in group") {
        return hit(ApiErrorKind::InviteeAlreadyInGroup);
    }
    if msg.contains("no less than number of members") || msg.contains("no more than 200") {
        return hit(ApiErrorKind::InvalidLimitation);
    }
    if msg.contains("not in group") {
        return hit(ApiErrorKind::MemberNotInGroup);
    }
    if msg.contains("owner should transferred") {
        return hit(ApiErrorKind::OwnerShouldTransferred);
    }
    if msg.contains("no such group") {
        return hit(ApiErrorKind::GroupNotExists);
    }

    // No rule matched; keep the original message when there is one.
    let message = if raw_msg.is_empty() {
        ApiErrorKind::UnknownError.message().to_string()
    } else {
        raw_msg.to_string()
    };
    (ApiErrorKind::UnknownError, message)
}

/// A failed operation, carried through controllers and data-access layers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    /// An error with the canonical message of its kind.
    pub fn kind(kind: ApiErrorKind) -> Self {
        ApiError {
            kind,
            message: kind.message().to_string(),
        }
    }
    /// An error with a message overriding the canonical one.
    pub fn with_message(kind: ApiErrorKind, message: &str) -> Self {
        ApiError {
            kind,
            message: message.to_string(),
        }
    }
    /// Session gate failure, raised before any handler work.
    pub fn not_logged_in() -> Self {
        Self::kind(ApiErrorKind::UserNotLoggedIn)
    }
    /// A required request field is missing.
    pub fn null_element(message: &str) -> Self {
        Self::with_message(ApiErrorKind::NullElement, message)
    }
}

impl std::error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl From<(ApiErrorKind, String)> for ApiError {
    fn from((kind, message): (ApiErrorKind, String)) -> Self {
        ApiError { kind, message }
    }
}

/// The uniform JSON envelope returned by every endpoint.
///
/// All responses, including failures, go out with HTTP status 200; clients
/// read `success` and `error_code` instead of the transport status.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error_code: i32,
    pub error_msg: String,
}

impl ApiResponse {
    /// Success envelope; the error channel always carries the canonical
    /// success code and message.
    pub fn success(data: Option<Value>) -> Self {
        ApiResponse {
            success: true,
            data,
            error_code: ApiErrorKind::Success.code(),
            error_msg: ApiErrorKind::Success.message().to_string(),
        }
    }
    /// Failure envelope; `data` is always empty.
    pub fn failure(kind: ApiErrorKind, message: Option<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error_code: kind.code(),
            error_msg: message.unwrap_or_else(|| kind.message().to_string()),
        }
    }

    pub fn to_http(&self) -> HttpResponse {
        HttpResponse::Ok().json(self)
    }
}

impl From<&ApiError> for ApiResponse {
    fn from(error: &ApiError) -> Self {
        ApiResponse::failure(error.kind, Some(error.message.clone()))
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> http::StatusCode {
        http::StatusCode::OK
    }
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        ApiResponse::from(self).to_http()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_normalize_code_zero_is_success_for_any_message() {
        for msg in ["", "user exists", "whatever"] {
            let (kind, message) = normalize_sql_error(0, msg);
            assert_eq!(kind, ApiErrorKind::Success);
            assert_eq!(message, ApiErrorKind::Success.message());
        }
    }

    #[test]
    fn test_normalize_code_500_is_sql_exception_for_any_message() {
        for msg in ["", "already friends", "duplicate key"] {
            let (kind, message) = normalize_sql_error(500, msg);
            assert_eq!(kind, ApiErrorKind::SqlException);
            assert_eq!(message, ApiErrorKind::SqlException.message());
        }
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        let (kind, _) = normalize_sql_error(999, "USER NOT EXISTS");
        assert_eq!(kind, ApiErrorKind::UserNotExists);

        let (kind, _) = normalize_sql_error(999, "Group Is Full");
        assert_eq!(kind, ApiErrorKind::GroupFull);
    }

    #[test]
    fn test_normalize_specific_group_rules_win_over_generic_membership() {
        // "invitee is in group" also contains "in group"; the specific rule
        // must be the one that fires.
        let (kind, _) = normalize_sql_error(999, "invitee is in group");
        assert_eq!(kind, ApiErrorKind::InviteeAlreadyInGroup);

        let (kind, _) = normalize_sql_error(999, "inviter is not in group");
        assert_eq!(kind, ApiErrorKind::InviterNotInGroup);

        let (kind, _) = normalize_sql_error(999, "someone not in group");
        assert_eq!(kind, ApiErrorKind::MemberNotInGroup);

        let (kind, _) = normalize_sql_error(999, "user not in group");
        assert_eq!(kind, ApiErrorKind::MemberNotInGroup);
    }

    #[test]
    fn test_normalize_blocked_rule_excludes_already() {
        let (kind, _) = normalize_sql_error(999, "Already Blocked");
        assert_eq!(kind, ApiErrorKind::AlreadyBlocked);

        let (kind, _) = normalize_sql_error(999, "blocked by receiver");
        assert_eq!(kind, ApiErrorKind::Blocked);
    }

    #[test]
    fn test_normalize_oneself_and_pending_request_rules() {
        let (kind, _) = normalize_sql_error(999, "cannot send friend request to oneself");
        assert_eq!(kind, ApiErrorKind::CannotSendToSelf);

        let (kind, _) = normalize_sql_error(999, "no such pending request");
        assert_eq!(kind, ApiErrorKind::NoSuchPendingRequest);
    }

    #[test]
    fn test_normalize_conversation_and_limitation_alternatives() {
        let (kind, _) = normalize_sql_error(999, "conversation not exists");
        assert_eq!(kind, ApiErrorKind::ConversationNotExists);

        let (kind, _) = normalize_sql_error(999, "conversation is not active");
        assert_eq!(kind, ApiErrorKind::ConversationNotExists);

        let (kind, _) = normalize_sql_error(999, "limitation no less than number of members");
        assert_eq!(kind, ApiErrorKind::InvalidLimitation);

        let (kind, _) = normalize_sql_error(999, "limitation no more than 200");
        assert_eq!(kind, ApiErrorKind::InvalidLimitation);
    }

    #[test]
    fn test_normalize_unknown_keeps_raw_message() {
        let (kind, message) = normalize_sql_error(7, "some unrecognized text");
        assert_eq!(kind, ApiErrorKind::UnknownError);
        assert_eq!(message, "some unrecognized text");
    }

    #[test]
    fn test_normalize_unknown_with_empty_message_uses_canonical_text() {
        let (kind, message) = normalize_sql_error(7, "");
        assert_eq!(kind, ApiErrorKind::UnknownError);
        assert_eq!(message, ApiErrorKind::UnknownError.message());
    }

    #[test]
    fn test_success_envelope() {
        let response = ApiResponse::success(Some(json!({ "x": 1 })));

        assert!(response.success);
        assert_eq!(response.data, Some(json!({ "x": 1 })));
        assert_eq!(response.error_code, ApiErrorKind::Success.code());
        assert_eq!(response.error_msg, ApiErrorKind::Success.message());
    }

    #[test]
    fn test_failure_envelope_uses_canonical_message_by_default() {
        let response = ApiResponse::failure(ApiErrorKind::GroupFull, None);

        assert!(!response.success);
        assert_eq!(response.data, None);
        assert_eq!(response.error_code, ApiErrorKind::GroupFull.code());
        assert_eq!(response.error_msg, ApiErrorKind::GroupFull.message());
    }

    #[test]
    fn test_failure_envelope_keeps_given_message() {
        let response =
            ApiResponse::failure(ApiErrorKind::NullElement, Some("group_id is required".to_string()));

        assert!(!response.success);
        assert_eq!(response.error_code, ApiErrorKind::NullElement.code());
        assert_eq!(response.error_msg, "group_id is required");
    }

    #[test]
    fn test_envelope_round_trip() {
        let response = ApiResponse::failure(ApiErrorKind::PermissionDenied, None);
        let text = serde_json::to_string(&response).unwrap();
        let parsed: ApiResponse = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, response);
    }
}
