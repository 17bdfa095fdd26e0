use serde::{Deserialize, Serialize};

// ** Section: request bodies **

#[derive(Debug, Deserialize, Clone)]
pub struct RegisterUserDto {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginUserDto {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpdateUserDto {
    pub password: Option<String>,
    pub phone: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchUsersQuery {
    pub keyword: Option<String>,
}

// ** Section: database rows **

/// The user row consulted at login. The stored hash is needed to verify the
/// password and never leaves the server.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LoginUser {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
}
