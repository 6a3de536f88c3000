//! Expansion of local intents into canonical chat events.

#[cfg(test)]
#[path = "translate_test.rs"]
mod translate_test;

use std::borrow::Cow;

use crate::event::{ChatEvent, ChatFile, ChatMessage, Event, Intent, Origin};
use crate::state::ChatState;

/// Expand a `synthetic` intent into the `chat` event it stands for.
///
/// The produced event is stamped with the visitor's display name, the
/// visitor's identifier (or `fallback_nick` while the visitor has none),
/// `now_ms`, and [`Origin::Local`]. Anything that is not a recognized intent
/// is returned unchanged, payload included.
#[must_use]
pub fn translate<'a>(state: &ChatState, event: &'a Event, now_ms: i64, fallback_nick: &str) -> Cow<'a, Event> {
    let Event::Synthetic(intent) = event else {
        return Cow::Borrowed(event);
    };

    let nick = state
        .visitor
        .nick
        .as_deref()
        .filter(|nick| !nick.is_empty())
        .unwrap_or(fallback_nick)
        .to_owned();
    let display_name = state.visitor.display_name.clone();

    let chat = match intent {
        Intent::VisitorSendMessage { msg } => ChatEvent::Message(ChatMessage {
            nick: Some(nick),
            display_name,
            timestamp: Some(now_ms),
            msg: msg.clone(),
            source: Origin::Local,
        }),
        Intent::VisitorSendFile { attachment } => ChatEvent::File(ChatFile {
            nick: Some(nick),
            display_name,
            timestamp: Some(now_ms),
            attachment: attachment.clone(),
            source: Origin::Local,
        }),
        Intent::Unknown { .. } => return Cow::Borrowed(event),
    };

    Cow::Owned(Event::Chat(chat))
}
