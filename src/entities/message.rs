//! Free-text messages from users

use crate::core::error::FieldErrors;
use crate::core::validation::FieldValidator;
use crate::core::validation::validators::{max_length, not_blank};
use crate::dispatch::representation::{WriteContext, WriteRepresentation};
use crate::impl_data_entity;
use serde::Deserialize;
use uuid::Uuid;

impl_data_entity!(
    Message,
    "message",
    "messages",
    ["message"],
    owner: user,
    {
        user: Uuid,
        message: String,
    }
);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {
    pub user: Option<Uuid>,
    pub message: Option<String>,
}

impl WriteRepresentation<Message> for MessagePayload {
    fn validate(&self, ctx: &WriteContext<'_, Message>) -> FieldErrors {
        let mut v = FieldValidator::new(ctx.mode);
        v.required("user", self.user.as_ref())
            .required("message", self.message.as_ref())
            .text(
                "message",
                self.message.as_deref(),
                &[&not_blank(), &max_length(2000)],
            );
        v.finish()
    }

    fn create(self) -> Message {
        Message::new(
            self.user.unwrap_or_default(),
            self.message.unwrap_or_default(),
        )
    }

    fn apply(self, message: &mut Message) {
        if let Some(user) = self.user {
            message.user = user;
        }
        if let Some(text) = self.message {
            message.message = text;
        }
    }
}
