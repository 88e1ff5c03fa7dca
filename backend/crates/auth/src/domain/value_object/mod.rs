//! Value Object Module

pub mod email;
pub mod permission;
pub mod token_scope;
pub mod user_password;
pub mod user_role;
