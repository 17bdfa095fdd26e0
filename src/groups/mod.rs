pub(super) mod group_controller;
pub(super) mod group_models;
pub(super) mod group_orm;
