//! Participant role classification.
//!
//! DESIGN
//! ======
//! Roles are derived from the identifier's naming convention only. Every
//! other module asks this one (through [`Role`]) instead of testing prefixes
//! itself, so the convention lives in exactly one place.

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use serde::{Deserialize, Serialize};

/// Identifier prefix used by agents, e.g. `"agent:1"`.
pub const AGENT_PREFIX: &str = "agent:";

/// Identifier prefix used by visitors, e.g. `"visitor:42"`.
pub const VISITOR_PREFIX: &str = "visitor";

/// True when the identifier names an agent.
#[must_use]
pub fn is_agent(nick: &str) -> bool {
    nick.starts_with(AGENT_PREFIX)
}

/// True when the identifier names a visitor.
#[must_use]
pub fn is_visitor(nick: &str) -> bool {
    nick.starts_with(VISITOR_PREFIX)
}

/// Role of a chat participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Visitor,
    /// Neither prefix matched, or the identifier was absent (system
    /// messages, triggers, malformed events).
    Unknown,
}

impl Role {
    /// Classify a present identifier.
    #[must_use]
    pub fn classify(nick: &str) -> Self {
        if is_agent(nick) {
            Self::Agent
        } else if is_visitor(nick) {
            Self::Visitor
        } else {
            Self::Unknown
        }
    }

    /// Classify a possibly-absent identifier. Absent maps to [`Role::Unknown`].
    #[must_use]
    pub fn of(nick: Option<&str>) -> Self {
        nick.map_or(Self::Unknown, Self::classify)
    }

    #[must_use]
    pub fn is_agent(self) -> bool {
        self == Self::Agent
    }

    #[must_use]
    pub fn is_visitor(self) -> bool {
        self == Self::Visitor
    }
}
