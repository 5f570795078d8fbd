//! Outgoing replies for one turn
//!
//! Handlers append to [`Replies`]; once the turn is decided the
//! [`ReplySequencer`] drains them to the transport one at a time, in the
//! order they were produced.

use crate::runtime::{DeliveryError, ReplySink};
use serde::Serialize;
use std::time::Duration;

/// Ordered, finite sequence of messages produced during one turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Replies {
    messages: Vec<String>,
}

impl Replies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn extend<I, S>(&mut self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.messages.extend(messages.into_iter().map(Into::into));
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

impl IntoIterator for Replies {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

/// Delivers a turn's replies in generation order
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplySequencer {
    /// Pause between consecutive messages of one turn
    delay: Duration,
}

impl ReplySequencer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Deliver every message, awaiting each before the next.
    ///
    /// Returns the number delivered once the whole sequence is out; stops at
    /// the first delivery failure.
    pub async fn drain<S>(
        &self,
        conversation_id: &str,
        replies: impl IntoIterator<Item = String>,
        sink: &S,
    ) -> Result<usize, DeliveryError>
    where
        S: ReplySink + ?Sized,
    {
        let mut delivered = 0;
        for message in replies {
            if delivered > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            sink.deliver(conversation_id, &message).await?;
            delivered += 1;
        }
        tracing::debug!(conv_id = %conversation_id, delivered, "Replies drained");
        Ok(delivered)
    }
}
