//! Chat session state.
//!
//! DESIGN
//! ======
//! `ChatState` is a value. Collections sit behind `Arc` and are changed only
//! through `Arc::make_mut`, so cloning a state is cheap and a clone handed to
//! an observer is never altered by a later reduction. Fields untouched by an
//! event keep pointing at the same allocation as in the previous state.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::event::{AgentUpdate, lenient};
use crate::transcript::Transcript;

// =============================================================================
// STATUSES
// =============================================================================

/// Transport status of the chat session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ConnectionStatus {
    #[default]
    Closed,
    Connecting,
    Open,
    Unknown,
}

impl From<String> for ConnectionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "closed" => Self::Closed,
            "connecting" => Self::Connecting,
            "open" | "connected" => Self::Open,
            _ => Self::Unknown,
        }
    }
}

/// Availability of the chat account (or a department).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AccountStatus {
    #[default]
    Offline,
    Online,
    Away,
    Unknown,
}

impl From<String> for AccountStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "offline" => Self::Offline,
            "online" => Self::Online,
            "away" => Self::Away,
            _ => Self::Unknown,
        }
    }
}

// =============================================================================
// PARTICIPANTS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<AccountStatus>,
}

/// The visitor on this side of the chat. Doubles as the `visitor_update`
/// payload: present fields overwrite, absent fields are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Visitor {
    pub fn merge(&mut self, update: &Visitor) {
        merge_field(&mut self.nick, update.nick.as_deref());
        merge_field(&mut self.display_name, update.display_name.as_deref());
        merge_field(&mut self.email, update.email.as_deref());
        merge_field(&mut self.phone, update.phone.as_deref());
    }
}

/// Roster entry for an agent. `nick` always equals the roster key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub nick: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub typing: bool,
}

impl Agent {
    /// Record with only the identifier set.
    #[must_use]
    pub fn bare(nick: &str) -> Self {
        Self {
            nick: nick.to_owned(),
            ..Self::default()
        }
    }

    /// Apply a profile update. `nick` is left alone; the caller keys the
    /// roster and sets it.
    pub fn merge(&mut self, update: &AgentUpdate) {
        merge_field(&mut self.display_name, update.display_name.as_deref());
        merge_field(&mut self.avatar_path, update.avatar_path.as_deref());
        merge_field(&mut self.title, update.title.as_deref());
        if let Some(typing) = update.typing {
            self.typing = typing;
        }
    }
}

fn merge_field(slot: &mut Option<String>, incoming: Option<&str>) {
    if let Some(value) = incoming {
        *slot = Some(value.to_owned());
    }
}

// =============================================================================
// CHAT STATE
// =============================================================================

/// Client-side snapshot of one chat session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatState {
    pub connection: ConnectionStatus,
    pub account_status: AccountStatus,
    pub departments: Arc<Vec<Department>>,
    pub visitor: Arc<Visitor>,
    pub agents: Arc<BTreeMap<String, Agent>>,
    pub chats: Transcript,
    pub is_chatting: bool,
    /// Timestamp (ms) carried by the latest transcript entry not sent by the
    /// visitor. `None` when that entry had no timestamp.
    pub last_non_visitor_msg_ts: Option<i64>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            connection: ConnectionStatus::default(),
            account_status: AccountStatus::default(),
            departments: Arc::default(),
            visitor: Arc::default(),
            agents: Arc::default(),
            chats: Transcript::default(),
            is_chatting: false,
            last_non_visitor_msg_ts: Some(0),
        }
    }
}

impl ChatState {
    #[must_use]
    pub fn agent(&self, nick: &str) -> Option<&Agent> {
        self.agents.get(nick)
    }

    /// Agents currently flagged as typing, in identifier order.
    pub fn typing_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values().filter(|a| a.typing)
    }
}
