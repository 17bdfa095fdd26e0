pub(super) mod chat_controller;
pub(super) mod chat_models;
pub(super) mod chat_orm;
