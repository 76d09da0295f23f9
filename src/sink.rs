//! Destinations for decoded events.
//!
//! The read loop owns its sink and hands every event over by value, in wire
//! order. Sinks run on the read task, so they should not block for long.

use events::Event;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub trait EventSink: Send + 'static {
    fn deliver(&mut self, event: Event);
}

impl<F> EventSink for F
where
    F: FnMut(Event) + Send + 'static,
{
    fn deliver(&mut self, event: Event) {
        self(event);
    }
}

impl EventSink for mpsc::UnboundedSender<Event> {
    fn deliver(&mut self, event: Event) {
        if let Err(mpsc::error::SendError(event)) = self.send(event) {
            debug!(kind = %event.kind(), "sink: receiver dropped, discarding event");
        }
    }
}

/// Writes a one-line summary of each event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn deliver(&mut self, event: Event) {
        match &event {
            Event::Hello => info!("event: hello"),
            Event::Pong(pong) => info!(reply_to = pong.reply_to, "event: pong"),
            Event::UserTyping(typing) => {
                info!(user = %typing.user, channel = %typing.channel, "event: user typing");
            }
            Event::Message(message) => {
                info!(channel = %message.channel, user = %message.user, text = %message.text, "event: message");
            }
            Event::MessageChanged(changed) => {
                info!(channel = %changed.channel, text = %changed.message.text, "event: message changed");
            }
            Event::MessageDeleted(deleted) => {
                info!(channel = %deleted.channel, deleted_ts = %deleted.deleted_ts, "event: message deleted");
            }
            Event::DesktopNotification(note) => {
                info!(title = %note.title, channel = %note.channel, "event: desktop notification");
            }
            Event::ReactionAdded(reaction) => {
                info!(user = %reaction.user, reaction = %reaction.reaction, "event: reaction added");
            }
            Event::ReactionRemoved(reaction) => {
                info!(user = %reaction.user, reaction = %reaction.reaction, "event: reaction removed");
            }
            Event::Unknown(unknown) => {
                info!(kind = %unknown.kind, subtype = %unknown.subtype, raw = %unknown.raw, "event: unknown");
            }
        }
    }
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod tests;
