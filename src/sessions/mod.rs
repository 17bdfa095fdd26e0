pub(crate) mod config_jwt;
pub(crate) mod hash_tools;
pub(crate) mod tokens;
