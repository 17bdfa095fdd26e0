use crate::chats::chat_models::ConversationLists;
use crate::errors::ApiError;

pub trait ChatOrm {
    /// Call `proc_send_message`; membership and conversation state checks
    /// happen inside the procedure.
    fn send_message(&self, user_id: i64, conversation_id: i64, message: &str) -> Result<(), ApiError>;

    /// Messages of one conversation, oldest first.
    fn get_messages(&self, conversation_id: i64) -> Result<Vec<serde_json::Value>, ApiError>;

    /// Active conversations of the user, private and group ones apart.
    fn get_conversation_list(&self, user_id: i64) -> Result<ConversationLists, ApiError>;
}

pub mod cfg {
    use crate::dbase::DbPool;

    #[cfg(not(feature = "mockdata"))]
    use super::impls::ChatOrmApp;
    #[cfg(not(feature = "mockdata"))]
    pub fn get_chat_orm_app(pool: DbPool) -> ChatOrmApp {
        ChatOrmApp::new(pool)
    }

    #[cfg(feature = "mockdata")]
    use super::tests::ChatOrmApp;
    #[cfg(feature = "mockdata")]
    pub fn get_chat_orm_app(_: DbPool) -> ChatOrmApp {
        ChatOrmApp::new()
    }
}

#[cfg(not(feature = "mockdata"))]
pub mod impls {
    use mysql::Value;

    use crate::dbase::{
        self,
        procedures::{self, impls::MySqlSession, OUT_ERR_CODE, OUT_ERR_MSG},
    };
    use crate::errors::{ApiError, ApiErrorKind};
    use crate::settings::err;

    use super::*;

    #[derive(Clone)]
    pub struct ChatOrmApp {
        pub pool: dbase::DbPool,
    }

    impl ChatOrmApp {
        pub fn new(pool: dbase::DbPool) -> Self {
            ChatOrmApp { pool }
        }
        fn get_conn(&self) -> Result<dbase::DbPooledConnection, ApiError> {
            self.pool.get().map_err(|e| db_error(e.to_string()))
        }
    }

    fn db_error(info: String) -> ApiError {
        log::error!("{}: {}", err::CD_DATABASE, &info);
        ApiError::with_message(ApiErrorKind::SqlException, &info)
    }

    impl ChatOrm for ChatOrmApp {
        fn send_message(
            &self,
            user_id: i64,
            conversation_id: i64,
            message: &str,
        ) -> Result<(), ApiError> {
            let mut conn = self.get_conn()?;
            let mut session = MySqlSession::new(&mut conn);

            let outcome = procedures::call_procedure(
                &mut session,
                "proc_send_message",
                vec![Value::from(user_id), Value::from(conversation_id), Value::from(message)],
                &[OUT_ERR_CODE, OUT_ERR_MSG],
            );
            outcome.into_result().map(|_| ())
        }

        fn get_messages(&self, conversation_id: i64) -> Result<Vec<serde_json::Value>, ApiError> {
            let mut conn = self.get_conn()?;

            dbase::query_rows(
                &mut conn,
                "SELECT m.id, m.sender_id, u.username, u.display_name, m.content, m.created_at \
                 FROM messages m \
                 JOIN users u ON u.id = m.sender_id \
                 WHERE m.conversation_id = ? \
                 ORDER BY m.created_at ASC",
                vec![Value::from(conversation_id)],
            )
            .map_err(db_error)
        }

        fn get_conversation_list(&self, user_id: i64) -> Result<ConversationLists, ApiError> {
            let mut conn = self.get_conn()?;

            let private = dbase::query_rows(
                &mut conn,
                "SELECT \
                     c.id AS conversation_id, c.type, c.updated_at, \
                     CASE WHEN f.user1_id = ? THEN f.user2_id ELSE f.user1_id END AS other_user_id, \
                     u.username AS other_username, \
                     u.display_name AS other_display_name \
                 FROM conversations c \
                 JOIN friends f ON f.conversation_id = c.id \
                 JOIN users u \
                   ON (u.id = CASE WHEN f.user1_id = ? THEN f.user2_id ELSE f.user1_id END) \
                 WHERE (f.user1_id = ? OR f.user2_id = ?) \
                   AND c.type = 'private' AND c.is_active = 1 \
                 ORDER BY c.updated_at DESC",
                vec![
                    Value::from(user_id),
                    Value::from(user_id),
                    Value::from(user_id),
                    Value::from(user_id),
                ],
            )
            .map_err(db_error)?;

            let group = dbase::query_rows(
                &mut conn,
                "SELECT \
                     c.id AS conversation_id, c.type, c.updated_at, \
                     g.id AS group_id, g.group_name, g.number_of_members \
                 FROM conversations c \
                 JOIN chatgroups g ON g.conversation_id = c.id \
                 JOIN group_members gm ON gm.group_id = g.id \
                 WHERE gm.uid = ? AND c.type = 'group' AND c.is_active = 1 \
                 ORDER BY c.updated_at DESC",
                vec![Value::from(user_id)],
            )
            .map_err(db_error)?;

            Ok(ConversationLists { private, group })
        }
    }
}

#[cfg(feature = "mockdata")]
pub mod tests {
    use serde_json::json;

    use crate::errors::{ApiError, ApiErrorKind};

    use super::*;

    #[derive(Debug, Clone)]
    pub struct MockConversation {
        pub id: i64,
        pub is_active: bool,
        pub member_ids: Vec<i64>,
    }

    #[derive(Debug, Clone)]
    pub struct MockMessage {
        pub id: i64,
        pub conversation_id: i64,
        pub sender_id: i64,
        pub content: String,
    }

    /// In-memory stand-in replaying the observable behavior of the message
    /// procedures.
    #[derive(Debug, Clone)]
    pub struct ChatOrmApp {
        pub conversation_vec: Vec<MockConversation>,
        pub message_vec: Vec<MockMessage>,
    }

    impl ChatOrmApp {
        /// Create a new instance.
        pub fn new() -> Self {
            ChatOrmApp {
                conversation_vec: Vec::new(),
                message_vec: Vec::new(),
            }
        }
        /// Create a new instance with the specified conversation list.
        #[cfg(test)]
        pub fn create(conversation_list: &[MockConversation]) -> Self {
            ChatOrmApp {
                conversation_vec: conversation_list.to_vec(),
                message_vec: Vec::new(),
            }
        }
        /// Create a new entity instance.
        pub fn new_conversation(id: i64, member_ids: &[i64]) -> MockConversation {
            MockConversation {
                id,
                is_active: true,
                member_ids: member_ids.to_vec(),
            }
        }
    }

    impl ChatOrm for ChatOrmApp {
        fn send_message(
            &self,
            user_id: i64,
            conversation_id: i64,
            _message: &str,
        ) -> Result<(), ApiError> {
            let conversation = self
                .conversation_vec
                .iter()
                .find(|conversation| conversation.id == conversation_id);
            let conversation = match conversation {
                Some(conversation) if conversation.is_active => conversation,
                _ => return Err(ApiError::kind(ApiErrorKind::ConversationNotExists)),
            };
            if !conversation.member_ids.contains(&user_id) {
                return Err(ApiError::kind(ApiErrorKind::NotConversationMember));
            }
            Ok(())
        }

        fn get_messages(&self, conversation_id: i64) -> Result<Vec<serde_json::Value>, ApiError> {
            let rows = self
                .message_vec
                .iter()
                .filter(|message| message.conversation_id == conversation_id)
                .map(|message| {
                    json!({
                        "id": message.id,
                        "sender_id": message.sender_id,
                        "username": format!("user{}", message.sender_id),
                        "content": message.content,
                        "created_at": "2024-01-15 10:00:00",
                    })
                })
                .collect();
            Ok(rows)
        }

        fn get_conversation_list(&self, user_id: i64) -> Result<ConversationLists, ApiError> {
            let private = self
                .conversation_vec
                .iter()
                .filter(|conversation| {
                    conversation.is_active && conversation.member_ids.contains(&user_id)
                })
                .map(|conversation| {
                    json!({
                        "conversation_id": conversation.id,
                        "type": "private",
                    })
                })
                .collect();
            Ok(ConversationLists {
                private,
                group: Vec::new(),
            })
        }
    }
}
