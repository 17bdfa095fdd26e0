pub(super) mod friend_controller;
pub(super) mod friend_models;
pub(super) mod friend_orm;
