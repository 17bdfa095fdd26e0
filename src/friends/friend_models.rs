use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RESPONSE_ACCEPT: &str = "accept";
pub const RESPONSE_REJECT: &str = "reject";

// ** Section: request bodies **

#[derive(Debug, Deserialize, Clone)]
pub struct SendFriendRequestDto {
    pub receiver_id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RespondFriendRequestDto {
    pub sender_id: Option<i64>,
    /// "accept" or "reject".
    pub response: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeleteFriendDto {
    pub friend_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlockUserDto {
    pub blocked_id: Option<i64>,
}

// ** Section: response payloads **

/// Friend requests involving the session user, both directions.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FriendRequestLists {
    pub received: Vec<Value>,
    pub sent: Vec<Value>,
}
