//! File-backed mail delivery
//!
//! Each message is written as an `.eml` file under the mail directory.

use std::path::{Path, PathBuf};

use lettre::{
    Address, AsyncFileTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
};

use crate::application::mailer::{MailError, Mailer, OutgoingMail};

/// Writes outgoing mail to disk
pub struct FileMailer {
    transport: AsyncFileTransport<Tokio1Executor>,
    sender: Mailbox,
    dir: PathBuf,
}

impl FileMailer {
    /// `sender` is a mailbox such as `Greenlight <no-reply@greenlight.local>`
    pub fn new(dir: impl AsRef<Path>, sender: &str) -> Result<Self, MailError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .map_err(|e| MailError(format!("create mail directory: {e}")))?;
        }
        let sender = sender
            .parse::<Mailbox>()
            .map_err(|e| MailError(format!("parse sender: {e}")))?;

        Ok(Self {
            transport: AsyncFileTransport::<Tokio1Executor>::new(dir),
            sender,
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn build(&self, mail: OutgoingMail) -> Result<Message, MailError> {
        let address = mail
            .to
            .as_str()
            .parse::<Address>()
            .map_err(|e| MailError(format!("parse recipient: {e}")))?;

        Message::builder()
            .from(self.sender.clone())
            .to(Mailbox::new(mail.to_name, address))
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| MailError(format!("build message: {e}")))
    }
}

impl Mailer for FileMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = self.build(mail)?;
        let id = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError(format!("write mail file: {e}")))?;

        tracing::info!(mail_id = %id, "Mail written");
        Ok(())
    }
}
