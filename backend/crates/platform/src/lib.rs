//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, URL-safe tokens)
//! - Password hashing (Argon2id)
//! - Pool setup and per-operation deadlines
//! - Generic versioned entity store
//! - Bounded background tasks
//! - Rate limiting infrastructure

pub mod background;
pub mod client;
pub mod crypto;
pub mod db;
pub mod password;
pub mod rate_limit;
pub mod store;
