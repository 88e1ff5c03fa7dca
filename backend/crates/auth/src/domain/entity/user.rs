//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use kernel::validation::{Validate, Validator};

use crate::domain::value_object::{
    email::Email, user_password::UserPassword, user_role::UserRole,
};

const NAME_MAX_BYTES: usize = 500;

/// User entity
///
/// `version` starts at 1 and moves on every successful update; a stale
/// copy can never overwrite a newer row.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub surname: String,
    /// Unique, lower-cased
    pub email: Email,
    pub password: UserPassword,
    pub activated: bool,
    pub role: UserRole,
    pub version: i32,
}

impl User {
    /// A not-yet-inserted, inactive user
    pub fn new(name: String, surname: String, email: Email, password: UserPassword) -> Self {
        Self {
            id: UserId::from_db(0),
            created_at: Utc::now(),
            name,
            surname,
            email,
            password,
            activated: false,
            role: UserRole::default(),
            version: 0,
        }
    }

    pub fn activate(&mut self) {
        self.activated = true;
    }
}

/// Field checks shared by registration and profile updates
pub fn validate_name(v: &mut Validator, key: &str, value: &str) {
    v.check(!value.trim().is_empty(), key, "must be provided");
    v.check(
        value.len() <= NAME_MAX_BYTES,
        key,
        "must not be more than 500 bytes long",
    );
}

impl Validate for User {
    fn validate(&self, v: &mut Validator) {
        validate_name(v, "name", &self.name);
        validate_name(v, "surname", &self.surname);
    }
}
