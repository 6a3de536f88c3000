//! Event envelopes applied to session state.
//!
//! ARCHITECTURE
//! ============
//! Every change to a chat session arrives as an envelope
//! `{ "type": <kind>, "detail": <payload> }`. Remote events come from the
//! transport already in canonical form; local intents arrive under the
//! `synthetic` kind and are expanded by the translator before reduction.
//! The `chat` and `synthetic` kinds carry a second `type` inside `detail`.
//!
//! DESIGN
//! ======
//! - Payloads are closed records. Every field is optional and decoded on its
//!   own: a field that is absent or has the wrong type becomes `None`, so a
//!   partial or sloppy event still reaches the reducer.
//! - Unknown kinds, top-level or nested, decode to an `Unknown` variant that
//!   keeps the kind and the raw detail. All of them are no-ops for the
//!   reducer.
//! - Only a missing `type`, or a detail that is not an object (an array for
//!   `department_update`, a string for the status kinds), is an
//!   [`EventError`].

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::state::{AccountStatus, ConnectionStatus, Department, Visitor};

// =============================================================================
// KINDS
// =============================================================================

pub const KIND_CONNECTION_UPDATE: &str = "connection_update";
pub const KIND_ACCOUNT_STATUS: &str = "account_status";
pub const KIND_DEPARTMENT_UPDATE: &str = "department_update";
pub const KIND_VISITOR_UPDATE: &str = "visitor_update";
pub const KIND_AGENT_UPDATE: &str = "agent_update";
pub const KIND_CHAT: &str = "chat";
pub const KIND_SYNTHETIC: &str = "synthetic";

pub const CHAT_MEMBER_JOIN: &str = "chat.memberjoin";
pub const CHAT_MEMBER_LEAVE: &str = "chat.memberleave";
pub const CHAT_MSG: &str = "chat.msg";
pub const CHAT_FILE: &str = "chat.file";
pub const CHAT_WAIT_QUEUE: &str = "chat.wait_queue";
pub const CHAT_REQUEST_RATING: &str = "chat.request.rating";
pub const CHAT_TYPING: &str = "typing";

pub const INTENT_SEND_MSG: &str = "visitor_send_msg";
pub const INTENT_SEND_FILE: &str = "visitor_send_file";

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("invalid event JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("event envelope has no `type`")]
    MissingKind,
    #[error("invalid detail for `{kind}` event: {source}")]
    InvalidDetail {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// FIELD DECODING
// =============================================================================

/// Decode an optional payload field, treating a value of the wrong type as
/// absent.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value)
        .inspect_err(|e| tracing::debug!(error = %e, "ignoring malformed payload field"))
        .ok())
}

/// Like [`lenient`] for fields with a natural default.
pub(crate) fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

fn field<T: DeserializeOwned>(detail: &Value, name: &str) -> Option<T> {
    detail.get(name).cloned().and_then(|value| serde_json::from_value(value).ok())
}

fn nested_kind<E: serde::de::Error>(detail: &Value) -> Result<String, E> {
    if !detail.is_object() {
        return Err(E::custom("nested detail is not an object"));
    }
    detail
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| E::custom("nested detail has no string `type`"))
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Marks where a transcript event originated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Echoed from the remote session.
    #[default]
    Remote,
    /// Produced on this client by the intent translator.
    Local,
}

impl Origin {
    #[allow(clippy::trivially_copy_pass_by_ref)]
    fn is_remote(&self) -> bool {
        *self == Self::Remote
    }
}

/// File attachment reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Member join/leave payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPresence {
    #[serde(default, deserialize_with = "lenient")]
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "lenient")]
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub msg: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default", skip_serializing_if = "Origin::is_remote")]
    pub source: Origin,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFile {
    #[serde(default, deserialize_with = "lenient")]
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub attachment: Option<Attachment>,
    #[serde(default, deserialize_with = "lenient_or_default", skip_serializing_if = "Origin::is_remote")]
    pub source: Origin,
}

/// Queue position notice for the visitor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitQueue {
    #[serde(default, deserialize_with = "lenient")]
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub wait_queue: Option<u32>,
}

/// Agent asking the visitor to rate the chat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingIndicator {
    #[serde(default, deserialize_with = "lenient")]
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub typing: bool,
}

/// Nested payload of a `chat` event, selected by `detail.type`.
///
/// On the wire the payload fields sit next to `type`; an unknown kind is
/// written back exactly as it was received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    MemberJoin(MemberPresence),
    MemberLeave(MemberPresence),
    Message(ChatMessage),
    File(ChatFile),
    WaitQueue(WaitQueue),
    RatingRequest(RatingRequest),
    Typing(TypingIndicator),
    /// Nested kind this crate does not route. Kept verbatim.
    Unknown { kind: String, detail: Value },
}

impl ChatEvent {
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::MemberJoin(_) => CHAT_MEMBER_JOIN,
            Self::MemberLeave(_) => CHAT_MEMBER_LEAVE,
            Self::Message(_) => CHAT_MSG,
            Self::File(_) => CHAT_FILE,
            Self::WaitQueue(_) => CHAT_WAIT_QUEUE,
            Self::RatingRequest(_) => CHAT_REQUEST_RATING,
            Self::Typing(_) => CHAT_TYPING,
            Self::Unknown { kind, .. } => kind,
        }
    }

    /// Identifier of the participant the event is about.
    #[must_use]
    pub fn nick(&self) -> Option<&str> {
        match self {
            Self::MemberJoin(p) | Self::MemberLeave(p) => p.nick.as_deref(),
            Self::Message(m) => m.nick.as_deref(),
            Self::File(f) => f.nick.as_deref(),
            Self::WaitQueue(w) => w.nick.as_deref(),
            Self::RatingRequest(r) => r.nick.as_deref(),
            Self::Typing(t) => t.nick.as_deref(),
            Self::Unknown { .. } => None,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::MemberJoin(p) | Self::MemberLeave(p) => p.display_name.as_deref(),
            Self::Message(m) => m.display_name.as_deref(),
            Self::File(f) => f.display_name.as_deref(),
            Self::WaitQueue(w) => w.display_name.as_deref(),
            Self::RatingRequest(r) => r.display_name.as_deref(),
            Self::Typing(_) | Self::Unknown { .. } => None,
        }
    }

    /// Sender-side timestamp carried by the event, if any.
    #[must_use]
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::MemberJoin(p) | Self::MemberLeave(p) => p.timestamp,
            Self::Message(m) => m.timestamp,
            Self::File(f) => f.timestamp,
            Self::WaitQueue(w) => w.timestamp,
            Self::RatingRequest(r) => r.timestamp,
            Self::Typing(_) | Self::Unknown { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(flatten)]
    payload: &'a T,
}

impl Serialize for ChatEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.kind();
        match self {
            Self::MemberJoin(p) | Self::MemberLeave(p) => Tagged { kind, payload: p }.serialize(serializer),
            Self::Message(m) => Tagged { kind, payload: m }.serialize(serializer),
            Self::File(f) => Tagged { kind, payload: f }.serialize(serializer),
            Self::WaitQueue(w) => Tagged { kind, payload: w }.serialize(serializer),
            Self::RatingRequest(r) => Tagged { kind, payload: r }.serialize(serializer),
            Self::Typing(t) => Tagged { kind, payload: t }.serialize(serializer),
            Self::Unknown { detail, .. } => detail.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ChatEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let detail = Value::deserialize(deserializer)?;
        let kind = nested_kind::<D::Error>(&detail)?;

        let event = match kind.as_str() {
            CHAT_MEMBER_JOIN => serde_json::from_value(detail).map(Self::MemberJoin),
            CHAT_MEMBER_LEAVE => serde_json::from_value(detail).map(Self::MemberLeave),
            CHAT_MSG => serde_json::from_value(detail).map(Self::Message),
            CHAT_FILE => serde_json::from_value(detail).map(Self::File),
            CHAT_WAIT_QUEUE => serde_json::from_value(detail).map(Self::WaitQueue),
            CHAT_REQUEST_RATING => serde_json::from_value(detail).map(Self::RatingRequest),
            CHAT_TYPING => serde_json::from_value(detail).map(Self::Typing),
            _ => Ok(Self::Unknown { kind, detail }),
        };
        event.map_err(D::Error::custom)
    }
}

/// Locally originated intent, carried under the `synthetic` kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    VisitorSendMessage { msg: Option<String> },
    VisitorSendFile { attachment: Option<Attachment> },
    /// Intent this crate does not expand. Kept verbatim.
    Unknown { kind: String, detail: Value },
}

impl Intent {
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::VisitorSendMessage { .. } => INTENT_SEND_MSG,
            Self::VisitorSendFile { .. } => INTENT_SEND_FILE,
            Self::Unknown { kind, .. } => kind,
        }
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let detail = Value::deserialize(deserializer)?;
        let kind = nested_kind::<D::Error>(&detail)?;

        let intent = match kind.as_str() {
            INTENT_SEND_MSG => Self::VisitorSendMessage {
                msg: field(&detail, "msg"),
            },
            INTENT_SEND_FILE => Self::VisitorSendFile {
                attachment: field(&detail, "attachment"),
            },
            _ => Self::Unknown { kind, detail },
        };
        Ok(intent)
    }
}

/// Agent profile change. `typing` is only applied when present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(default, deserialize_with = "lenient")]
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub avatar_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub typing: Option<bool>,
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// A discrete occurrence applied to session state.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    ConnectionUpdate(ConnectionStatus),
    AccountStatus(AccountStatus),
    DepartmentUpdate(Vec<Department>),
    VisitorUpdate(Visitor),
    AgentUpdate(AgentUpdate),
    Chat(ChatEvent),
    Synthetic(Intent),
    /// Top-level kind this crate does not route. Kept verbatim.
    Unknown { kind: String, detail: Value },
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    detail: Value,
}

impl Event {
    /// Decode an envelope from a JSON string.
    ///
    /// # Errors
    ///
    /// See [`Event::from_value`]; additionally [`EventError::InvalidJson`]
    /// when `raw` is not JSON.
    pub fn from_json(raw: &str) -> Result<Self, EventError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Decode an envelope from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MissingKind`] when `type` is absent,
    /// [`EventError::InvalidJson`] when the value is not an object or `type`
    /// is not a string, and [`EventError::InvalidDetail`] when the detail of
    /// a known kind has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        let raw: RawEnvelope = serde_json::from_value(value)?;
        let kind = raw.kind.ok_or(EventError::MissingKind)?;
        let detail = raw.detail;

        let event = match kind.as_str() {
            KIND_CONNECTION_UPDATE => Self::ConnectionUpdate(parse_detail(&kind, detail)?),
            KIND_ACCOUNT_STATUS => Self::AccountStatus(parse_detail(&kind, detail)?),
            KIND_DEPARTMENT_UPDATE => Self::DepartmentUpdate(parse_detail(&kind, detail)?),
            KIND_VISITOR_UPDATE => Self::VisitorUpdate(parse_detail(&kind, detail)?),
            KIND_AGENT_UPDATE => Self::AgentUpdate(parse_detail(&kind, detail)?),
            KIND_CHAT => Self::Chat(parse_detail(&kind, detail)?),
            KIND_SYNTHETIC => Self::Synthetic(parse_detail(&kind, detail)?),
            _ => Self::Unknown { kind, detail },
        };
        Ok(event)
    }

    /// Top-level kind as it appears on the wire.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::ConnectionUpdate(_) => KIND_CONNECTION_UPDATE,
            Self::AccountStatus(_) => KIND_ACCOUNT_STATUS,
            Self::DepartmentUpdate(_) => KIND_DEPARTMENT_UPDATE,
            Self::VisitorUpdate(_) => KIND_VISITOR_UPDATE,
            Self::AgentUpdate(_) => KIND_AGENT_UPDATE,
            Self::Chat(_) => KIND_CHAT,
            Self::Synthetic(_) => KIND_SYNTHETIC,
            Self::Unknown { kind, .. } => kind,
        }
    }
}

fn parse_detail<T: serde::de::DeserializeOwned>(kind: &str, detail: Value) -> Result<T, EventError> {
    serde_json::from_value(detail).map_err(|source| EventError::InvalidDetail {
        kind: kind.to_owned(),
        source,
    })
}
