use crate::errors::ApiError;
use crate::users::user_models::LoginUser;

pub trait UserOrm {
    /// Call `proc_register_user_base` and return the new user's id.
    fn register_user(&self, username: &str, password_hash: &str) -> Result<i64, ApiError>;

    /// Find the login row (including the stored hash) for a username.
    fn find_login_user(&self, username: &str) -> Result<Option<LoginUser>, ApiError>;

    /// Fetch the profile fields of one user.
    fn get_user_info(&self, user_id: i64) -> Result<Option<serde_json::Value>, ApiError>;

    /// Call `proc_alter_user_info` to replace password, phone and display name.
    fn update_user_info(
        &self,
        user_id: i64,
        password_hash: &str,
        phone: &str,
        display_name: &str,
    ) -> Result<(), ApiError>;

    /// Look up users by username or display name, capped at 20 rows.
    fn search_users(&self, keyword: &str) -> Result<Vec<serde_json::Value>, ApiError>;
}

pub mod cfg {
    use crate::dbase::DbPool;

    #[cfg(not(feature = "mockdata"))]
    use super::impls::UserOrmApp;
    #[cfg(not(feature = "mockdata"))]
    pub fn get_user_orm_app(pool: DbPool) -> UserOrmApp {
        UserOrmApp::new(pool)
    }

    #[cfg(feature = "mockdata")]
    use super::tests::UserOrmApp;
    #[cfg(feature = "mockdata")]
    pub fn get_user_orm_app(_: DbPool) -> UserOrmApp {
        UserOrmApp::new()
    }
}

#[cfg(not(feature = "mockdata"))]
pub mod impls {
    use mysql::prelude::Queryable;
    use mysql::{Row, Value};

    use crate::dbase::{
        self,
        procedures::{self, impls::MySqlSession, OUT_ERR_CODE, OUT_ERR_MSG},
    };
    use crate::errors::{ApiError, ApiErrorKind};
    use crate::settings::err;

    use super::*;

    #[derive(Clone)]
    pub struct UserOrmApp {
        pub pool: dbase::DbPool,
    }

    impl UserOrmApp {
        pub fn new(pool: dbase::DbPool) -> Self {
            UserOrmApp { pool }
        }
        fn get_conn(&self) -> Result<dbase::DbPooledConnection, ApiError> {
            self.pool.get().map_err(|e| db_error(e.to_string()))
        }
    }

    fn db_error(info: String) -> ApiError {
        log::error!("{}: {}", err::CD_DATABASE, &info);
        ApiError::with_message(ApiErrorKind::SqlException, &info)
    }

    impl UserOrm for UserOrmApp {
        fn register_user(&self, username: &str, password_hash: &str) -> Result<i64, ApiError> {
            let mut conn = self.get_conn()?;
            let mut session = MySqlSession::new(&mut conn);

            let outcome = procedures::call_procedure(
                &mut session,
                "proc_register_user_base",
                vec![Value::from(username), Value::from(password_hash)],
                &["p_userid", OUT_ERR_CODE, OUT_ERR_MSG],
            );
            let outputs = outcome.into_result()?;

            outputs
                .get("p_userid")
                .and_then(dbase::value_to_i64)
                .ok_or_else(|| db_error("proc_register_user_base returned no p_userid".to_string()))
        }

        fn find_login_user(&self, username: &str) -> Result<Option<LoginUser>, ApiError> {
            let mut conn = self.get_conn()?;

            let row: Option<Row> = conn
                .exec_first(
                    "SELECT id, username, display_name, phone, password_hash \
                     FROM users WHERE username = ? AND cancelled = 0",
                    (username,),
                )
                .map_err(|e| db_error(e.to_string()))?;

            Ok(row.map(|row| LoginUser {
                id: row.get("id").unwrap_or_default(),
                username: row.get("username").unwrap_or_default(),
                display_name: row.get("display_name").unwrap_or(None),
                phone: row.get("phone").unwrap_or(None),
                password_hash: row.get("password_hash").unwrap_or_default(),
            }))
        }

        fn get_user_info(&self, user_id: i64) -> Result<Option<serde_json::Value>, ApiError> {
            let mut conn = self.get_conn()?;

            dbase::query_one(
                &mut conn,
                "SELECT id, username, display_name, phone, created_at \
                 FROM users WHERE id = ? AND cancelled = 0",
                vec![Value::from(user_id)],
            )
            .map_err(db_error)
        }

        fn update_user_info(
            &self,
            user_id: i64,
            password_hash: &str,
            phone: &str,
            display_name: &str,
        ) -> Result<(), ApiError> {
            let mut conn = self.get_conn()?;
            let mut session = MySqlSession::new(&mut conn);

            let outcome = procedures::call_procedure(
                &mut session,
                "proc_alter_user_info",
                vec![
                    Value::from(user_id),
                    Value::from(password_hash),
                    Value::from(phone),
                    Value::from(display_name),
                ],
                &[OUT_ERR_CODE, OUT_ERR_MSG],
            );
            outcome.into_result().map(|_| ())
        }

        fn search_users(&self, keyword: &str) -> Result<Vec<serde_json::Value>, ApiError> {
            let mut conn = self.get_conn()?;

            let pattern = format!("%{}%", keyword);
            dbase::query_rows(
                &mut conn,
                "SELECT id, username, display_name, phone \
                 FROM users \
                 WHERE (username LIKE ? OR display_name LIKE ?) AND cancelled = 0 \
                 LIMIT 20",
                vec![Value::from(pattern.clone()), Value::from(pattern)],
            )
            .map_err(db_error)
        }
    }
}

#[cfg(feature = "mockdata")]
pub mod tests {
    use serde_json::json;

    use crate::errors::{ApiError, ApiErrorKind};

    use super::*;

    pub const USER_ID_START: i64 = 1201;

    #[derive(Debug, Clone)]
    pub struct MockUser {
        pub id: i64,
        pub username: String,
        pub password_hash: String,
        pub display_name: Option<String>,
        pub phone: Option<String>,
        pub created_at: String,
    }

    #[derive(Debug, Clone)]
    pub struct UserOrmApp {
        pub user_vec: Vec<MockUser>,
    }

    impl UserOrmApp {
        /// Create a new instance.
        pub fn new() -> Self {
            UserOrmApp { user_vec: Vec::new() }
        }
        /// Create a new instance with the specified user list.
        #[cfg(test)]
        pub fn create(user_list: &[MockUser]) -> Self {
            UserOrmApp {
                user_vec: user_list.to_vec(),
            }
        }
        /// Create a new entity instance.
        pub fn new_user(id: i64, username: &str, password_hash: &str) -> MockUser {
            MockUser {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                display_name: Some(format!("{}_display", username)),
                phone: None,
                created_at: "2024-01-15 10:00:00".to_string(),
            }
        }

        fn find_by_username(&self, username: &str) -> Option<&MockUser> {
            self.user_vec.iter().find(|user| user.username == username)
        }
    }

    impl UserOrm for UserOrmApp {
        fn register_user(&self, username: &str, _password_hash: &str) -> Result<i64, ApiError> {
            if self.find_by_username(username).is_some() {
                return Err(ApiError::kind(ApiErrorKind::UserExists));
            }
            Ok(USER_ID_START + self.user_vec.len() as i64)
        }

        fn find_login_user(&self, username: &str) -> Result<Option<LoginUser>, ApiError> {
            Ok(self.find_by_username(username).map(|user| LoginUser {
                id: user.id,
                username: user.username.clone(),
                display_name: user.display_name.clone(),
                phone: user.phone.clone(),
                password_hash: user.password_hash.clone(),
            }))
        }

        fn get_user_info(&self, user_id: i64) -> Result<Option<serde_json::Value>, ApiError> {
            Ok(self.user_vec.iter().find(|user| user.id == user_id).map(|user| {
                json!({
                    "id": user.id,
                    "username": user.username,
                    "display_name": user.display_name,
                    "phone": user.phone,
                    "created_at": user.created_at,
                })
            }))
        }

        fn update_user_info(
            &self,
            user_id: i64,
            _password_hash: &str,
            _phone: &str,
            _display_name: &str,
        ) -> Result<(), ApiError> {
            if !self.user_vec.iter().any(|user| user.id == user_id) {
                return Err(ApiError::kind(ApiErrorKind::UserNotExists));
            }
            Ok(())
        }

        fn search_users(&self, keyword: &str) -> Result<Vec<serde_json::Value>, ApiError> {
            let rows: Vec<serde_json::Value> = self
                .user_vec
                .iter()
                .filter(|user| {
                    user.username.contains(keyword)
                        || user
                            .display_name
                            .as_ref()
                            .map(|name| name.contains(keyword))
                            .unwrap_or(false)
                })
                .take(20)
                .map(|user| {
                    json!({
                        "id": user.id,
                        "username": user.username,
                        "display_name": user.display_name,
                        "phone": user.phone,
                    })
                })
                .collect();
            Ok(rows)
        }
    }
}
