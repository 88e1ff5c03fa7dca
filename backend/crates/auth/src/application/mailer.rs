//! Outgoing mail port
//!
//! Use cases only build [`OutgoingMail`]; delivery is behind [`Mailer`] so
//! tests can record messages instead of writing them anywhere.

use kernel::id::UserId;

use crate::domain::value_object::email::Email;

/// A rendered plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Email,
    pub to_name: Option<String>,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    /// Welcome mail carrying the activation token
    pub fn welcome(to: &Email, name: &str, user_id: UserId, activation_token: &str) -> Self {
        Self {
            to: to.clone(),
            to_name: Some(name.to_string()),
            subject: "Welcome!".to_string(),
            body: format!(
                "Hi {name},\n\n\
                 Thanks for signing up. Your user ID number is {user_id}.\n\n\
                 Please send a request to the `PUT /v1/users/activated` endpoint with the \
                 following JSON body to activate your account:\n\n\
                 {{\"token\": \"{activation_token}\"}}\n\n\
                 Please note that this is a one-time use token and it will expire in 3 days.\n"
            ),
        }
    }

    /// Re-issued activation token
    pub fn activation(to: &Email, activation_token: &str) -> Self {
        Self {
            to: to.clone(),
            to_name: None,
            subject: "Activate your account".to_string(),
            body: format!(
                "Hi,\n\n\
                 Please send a `PUT /v1/users/activated` request with the following JSON \
                 body to activate your account:\n\n\
                 {{\"token\": \"{activation_token}\"}}\n\n\
                 Please note that this is a one-time use token and it will expire in 3 days.\n"
            ),
        }
    }
}

/// Mail delivery
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MailError(pub String);
