use crate::errors::ApiError;
use crate::friends::friend_models::FriendRequestLists;

pub trait FriendOrm {
    /// Call `proc_send_friend_req` on behalf of the sender.
    fn send_friend_request(
        &self,
        sender_id: i64,
        receiver_id: i64,
        message: &str,
    ) -> Result<(), ApiError>;

    /// Call `proc_respond_friend_req`; `response` is "accept" or "reject".
    fn respond_friend_request(
        &self,
        receiver_id: i64,
        sender_id: i64,
        response: &str,
    ) -> Result<(), ApiError>;

    /// Call `proc_del_friend`.
    fn delete_friend(&self, user_id: i64, friend_id: i64) -> Result<(), ApiError>;

    /// Call `proc_block`.
    fn block_user(&self, blocker_id: i64, blocked_id: i64) -> Result<(), ApiError>;

    /// Friends of the user, restricted to active conversations.
    fn get_friend_list(&self, user_id: i64) -> Result<Vec<serde_json::Value>, ApiError>;

    /// Friend requests received by and sent by the user.
    fn get_friend_requests(&self, user_id: i64) -> Result<FriendRequestLists, ApiError>;
}

pub mod cfg {
    use crate::dbase::DbPool;

    #[cfg(not(feature = "mockdata"))]
    use super::impls::FriendOrmApp;
    #[cfg(not(feature = "mockdata"))]
    pub fn get_friend_orm_app(pool: DbPool) -> FriendOrmApp {
        FriendOrmApp::new(pool)
    }

    #[cfg(feature = "mockdata")]
    use super::tests::FriendOrmApp;
    #[cfg(feature = "mockdata")]
    pub fn get_friend_orm_app(_: DbPool) -> FriendOrmApp {
        FriendOrmApp::new()
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
    pub struct FriendOrmApp {
        pub pool: dbase::DbPool,
    }

    impl FriendOrmApp {
        pub fn new(pool: dbase::DbPool) -> Self {
            FriendOrmApp { pool }
        }
        fn get_conn(&self) -> Result<dbase::DbPooledConnection, ApiError> {
            self.pool.get().map_err(|e| db_error(e.to_string()))
        }

        fn call(&self, name: &str, in_params: Vec<Value>) -> Result<(), ApiError> {
            let mut conn = self.get_conn()?;
            let mut session = MySqlSession::new(&mut conn);

            let outcome =
                procedures::call_procedure(&mut session, name, in_params, &[OUT_ERR_CODE, OUT_ERR_MSG]);
            outcome.into_result().map(|_| ())
        }
    }

    fn db_error(info: String) -> ApiError {
        log::error!("{}: {}", err::CD_DATABASE, &info);
        ApiError::with_message(ApiErrorKind::SqlException, &info)
    }

    impl FriendOrm for FriendOrmApp {
        fn send_friend_request(
            &self,
            sender_id: i64,
            receiver_id: i64,
            message: &str,
        ) -> Result<(), ApiError> {
            self.call(
                "proc_send_friend_req",
                vec![Value::from(sender_id), Value::from(receiver_id), Value::from(message)],
            )
        }

        fn respond_friend_request(
            &self,
            receiver_id: i64,
            sender_id: i64,
            response: &str,
        ) -> Result<(), ApiError> {
            self.call(
                "proc_respond_friend_req",
                vec![Value::from(receiver_id), Value::from(sender_id), Value::from(response)],
            )
        }

        fn delete_friend(&self, user_id: i64, friend_id: i64) -> Result<(), ApiError> {
            self.call("proc_del_friend", vec![Value::from(user_id), Value::from(friend_id)])
        }

        fn block_user(&self, blocker_id: i64, blocked_id: i64) -> Result<(), ApiError> {
            self.call("proc_block", vec![Value::from(blocker_id), Value::from(blocked_id)])
        }

        fn get_friend_list(&self, user_id: i64) -> Result<Vec<serde_json::Value>, ApiError> {
            let mut conn = self.get_conn()?;

            dbase::query_rows(
                &mut conn,
                "SELECT \
                     CASE WHEN f.user1_id = ? THEN f.user2_id ELSE f.user1_id END AS friend_id, \
                     u.username, u.display_name, u.phone, \
                     f.conversation_id, f.created_at \
                 FROM friends f \
                 JOIN users u \
                   ON (u.id = CASE WHEN f.user1_id = ? THEN f.user2_id ELSE f.user1_id END) \
                 JOIN conversations c ON c.id = f.conversation_id \
                 WHERE (f.user1_id = ? OR f.user2_id = ?) AND c.is_active = 1",
                vec![
                    Value::from(user_id),
                    Value::from(user_id),
                    Value::from(user_id),
                    Value::from(user_id),
                ],
            )
            .map_err(db_error)
        }

        fn get_friend_requests(&self, user_id: i64) -> Result<FriendRequestLists, ApiError> {
            let mut conn = self.get_conn()?;

            let received = dbase::query_rows(
                &mut conn,
                "SELECT fr.sender_id, u.username, u.display_name, fr.message, fr.status, fr.updated_at \
                 FROM friend_requests fr \
                 JOIN users u ON u.id = fr.sender_id \
                 WHERE fr.receiver_id = ? \
                 ORDER BY fr.updated_at DESC",
                vec![Value::from(user_id)],
            )
            .map_err(db_error)?;

            let sent = dbase::query_rows(
                &mut conn,
                "SELECT fr.receiver_id, u.username, u.display_name, fr.message, fr.status, fr.updated_at \
                 FROM friend_requests fr \
                 JOIN users u ON u.id = fr.receiver_id \
                 WHERE fr.sender_id = ? \
                 ORDER BY fr.updated_at DESC",
                vec![Value::from(user_id)],
            )
            .map_err(db_error)?;

            Ok(FriendRequestLists { received, sent })
        }
    }
}

#[cfg(feature = "mockdata")]
pub mod tests {
    use serde_json::json;

    use crate::errors::{ApiError, ApiErrorKind};

    use super::*;

    #[derive(Debug, Clone)]
    pub struct MockFriendRequest {
        pub sender_id: i64,
        pub receiver_id: i64,
        pub message: String,
    }

    /// In-memory stand-in replaying the observable behavior of the friend
    /// procedures.
    #[derive(Debug, Clone)]
    pub struct FriendOrmApp {
        /// Known user ids.
        pub user_vec: Vec<i64>,
        /// Unordered friend pairs.
        pub friend_vec: Vec<(i64, i64)>,
        /// (blocker, blocked) pairs.
        pub blocked_vec: Vec<(i64, i64)>,
        /// Pending friend requests.
        pub request_vec: Vec<MockFriendRequest>,
    }

    impl FriendOrmApp {
        /// Create a new instance.
        pub fn new() -> Self {
            FriendOrmApp {
                user_vec: Vec::new(),
                friend_vec: Vec::new(),
                blocked_vec: Vec::new(),
                request_vec: Vec::new(),
            }
        }
        /// Create a new instance with the specified users and friend pairs.
        #[cfg(test)]
        pub fn create(user_ids: &[i64], friend_pairs: &[(i64, i64)]) -> Self {
            FriendOrmApp {
                user_vec: user_ids.to_vec(),
                friend_vec: friend_pairs.to_vec(),
                blocked_vec: Vec::new(),
                request_vec: Vec::new(),
            }
        }

        fn are_friends(&self, a: i64, b: i64) -> bool {
            self.friend_vec
                .iter()
                .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
        }
        fn is_blocked(&self, blocker: i64, blocked: i64) -> bool {
            self.blocked_vec.iter().any(|(x, y)| *x == blocker && *y == blocked)
        }
    }

    impl FriendOrm for FriendOrmApp {
        fn send_friend_request(
            &self,
            sender_id: i64,
            receiver_id: i64,
            _message: &str,
        ) -> Result<(), ApiError> {
            if sender_id == receiver_id {
                return Err(ApiError::kind(ApiErrorKind::CannotSendToSelf));
            }
            if !self.user_vec.contains(&receiver_id) {
                return Err(ApiError::kind(ApiErrorKind::UserNotExists));
            }
            if self.are_friends(sender_id, receiver_id) {
                return Err(ApiError::kind(ApiErrorKind::AlreadyFriends));
            }
            if self.is_blocked(receiver_id, sender_id) {
                return Err(ApiError::kind(ApiErrorKind::Blocked));
            }
            let already_sent = self
                .request_vec
                .iter()
                .any(|r| r.sender_id == sender_id && r.receiver_id == receiver_id);
            if already_sent {
                return Err(ApiError::kind(ApiErrorKind::RequestAlreadySent));
            }
            Ok(())
        }

        fn respond_friend_request(
            &self,
            receiver_id: i64,
            sender_id: i64,
            _response: &str,
        ) -> Result<(), ApiError> {
            let pending = self
                .request_vec
                .iter()
                .any(|r| r.sender_id == sender_id && r.receiver_id == receiver_id);
            if !pending {
                return Err(ApiError::kind(ApiErrorKind::NoSuchPendingRequest));
            }
            Ok(())
        }

        fn delete_friend(&self, user_id: i64, friend_id: i64) -> Result<(), ApiError> {
            if !self.are_friends(user_id, friend_id) {
                return Err(ApiError::kind(ApiErrorKind::NotFriends));
            }
            Ok(())
        }

        fn block_user(&self, blocker_id: i64, blocked_id: i64) -> Result<(), ApiError> {
            if !self.user_vec.contains(&blocked_id) {
                return Err(ApiError::kind(ApiErrorKind::UserNotExists));
            }
            if self.is_blocked(blocker_id, blocked_id) {
                return Err(ApiError::kind(ApiErrorKind::AlreadyBlocked));
            }
            Ok(())
        }

        fn get_friend_list(&self, user_id: i64) -> Result<Vec<serde_json::Value>, ApiError> {
            let rows: Vec<serde_json::Value> = self
                .friend_vec
                .iter()
                .filter(|(a, b)| *a == user_id || *b == user_id)
                .map(|(a, b)| {
                    let friend_id = if *a == user_id { *b } else { *a };
                    json!({
                        "friend_id": friend_id,
                        "username": format!("user{}", friend_id),
                        "display_name": format!("User {}", friend_id),
                        "phone": null,
                        "conversation_id": friend_id + 9000,
                        "created_at": "2024-01-15 10:00:00",
                    })
                })
                .collect();
            Ok(rows)
        }

        fn get_friend_requests(&self, user_id: i64) -> Result<FriendRequestLists, ApiError> {
            let received = self
                .request_vec
                .iter()
                .filter(|r| r.receiver_id == user_id)
                .map(|r| {
                    json!({
                        "sender_id": r.sender_id,
                        "username": format!("user{}", r.sender_id),
                        "message": r.message,
                        "status": "pending",
                    })
                })
                .collect();
            let sent = self
                .request_vec
                .iter()
                .filter(|r| r.sender_id == user_id)
                .map(|r| {
                    json!({
                        "receiver_id": r.receiver_id,
                        "username": format!("user{}", r.receiver_id),
                        "message": r.message,
                        "status": "pending",
                    })
                })
                .collect();
            Ok(FriendRequestLists { received, sent })
        }
    }
}
