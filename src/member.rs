//! Sender snapshots for transcript entries.
//!
//! A transcript entry carries a copy of its sender's profile as it was when
//! the entry was appended, so history renders without joining against the
//! live roster and is unaffected by later profile changes.

#[cfg(test)]
#[path = "member_test.rs"]
mod member_test;

use serde::Serialize;

use crate::identity::Role;
use crate::state::{Agent, ChatState, Visitor};

/// Denormalized sender profile, tagged with its role as `member_type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "member_type", rename_all = "lowercase")]
pub enum MemberSnapshot {
    Agent(Agent),
    Visitor(Visitor),
}

impl MemberSnapshot {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Agent(_) => Role::Agent,
            Self::Visitor(_) => Role::Visitor,
        }
    }

    #[must_use]
    pub fn nick(&self) -> Option<&str> {
        match self {
            Self::Agent(a) => Some(&a.nick),
            Self::Visitor(v) => v.nick.as_deref(),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Agent(a) => a.display_name.as_deref(),
            Self::Visitor(v) => v.display_name.as_deref(),
        }
    }
}

/// Resolve who sent an event.
///
/// Agent identifiers resolve to the roster record, or to a stub built from
/// the event's own fields when the agent is not on the roster yet. Every
/// other identifier (including an absent one) resolves to the visitor.
#[must_use]
pub fn resolve_member(state: &ChatState, nick: Option<&str>, display_name: Option<&str>) -> MemberSnapshot {
    match nick {
        Some(nick) if Role::classify(nick).is_agent() => {
            let agent = state.agents.get(nick).cloned().unwrap_or_else(|| Agent {
                nick: nick.to_owned(),
                display_name: display_name.map(str::to_owned),
                avatar_path: Some(String::new()),
                title: None,
                typing: false,
            });
            MemberSnapshot::Agent(agent)
        }
        _ => MemberSnapshot::Visitor(Visitor::clone(&state.visitor)),
    }
}
