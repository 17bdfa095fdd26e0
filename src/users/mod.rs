pub(super) mod user_auth_controller;
pub(super) mod user_controller;
pub(super) mod user_models;
pub(super) mod user_orm;
