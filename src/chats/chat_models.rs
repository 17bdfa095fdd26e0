use serde::{Deserialize, Serialize};
use serde_json::Value;

// ** Section: request bodies **

#[derive(Debug, Deserialize, Clone)]
pub struct SendMessageDto {
    pub conversation_id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagesQuery {
    pub conversation_id: Option<i64>,
}

// ** Section: response payloads **

/// The session user's conversations, split by kind.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConversationLists {
    pub private: Vec<Value>,
    pub group: Vec<Value>,
}
