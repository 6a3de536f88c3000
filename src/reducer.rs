//! The chat session state transition function.
//!
//! ARCHITECTURE
//! ============
//! `reduce(state, event) -> state` is the only way state changes. Local
//! intents are expanded by [`translate`] first; sender identity for
//! transcript entries comes from [`resolve_member`]; role decisions come
//! from [`Role`].
//!
//! DESIGN
//! ======
//! - The state is taken by value. Each arm touches only the fields its event
//!   names, through `Arc::make_mut`, so untouched fields stay shared with the
//!   previous state and snapshots held elsewhere never change.
//! - Nothing here fails. Unknown or malformed events leave the state as it
//!   was and are reported through `tracing`.

#[cfg(test)]
#[path = "reducer_test.rs"]
mod reducer_test;

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::event::{AgentUpdate, ChatEvent, Event};
use crate::identity::Role;
use crate::member::resolve_member;
use crate::state::{Agent, ChatState};
use crate::translate::translate;

/// Apply one event using the system clock and default configuration.
#[must_use]
pub fn reduce(state: ChatState, event: &Event) -> ChatState {
    Reducer::<SystemClock>::default().reduce(state, event)
}

/// Transition function bound to a clock and session configuration.
#[derive(Debug, Clone, Default)]
pub struct Reducer<C = SystemClock> {
    clock: C,
    config: SessionConfig,
}

impl<C: Clock> Reducer<C> {
    #[must_use]
    pub fn new(clock: C, config: SessionConfig) -> Self {
        Self { clock, config }
    }

    /// Apply one event, routing intents through the translator first.
    #[must_use]
    pub fn reduce(&self, state: ChatState, event: &Event) -> ChatState {
        if let Event::Synthetic(intent) = event {
            tracing::debug!(?intent, "translating intent");
            let canonical = translate(&state, event, self.clock.now_ms(), &self.config.fallback_nick);
            return self.update(state, &canonical);
        }
        self.update(state, event)
    }

    fn update(&self, mut state: ChatState, event: &Event) -> ChatState {
        tracing::debug!(kind = event.kind(), "applying event");

        match event {
            Event::ConnectionUpdate(status) => {
                state.connection = *status;
            }
            Event::AccountStatus(status) => {
                state.account_status = *status;
            }
            Event::DepartmentUpdate(departments) => {
                state.departments = Arc::new(departments.clone());
            }
            Event::VisitorUpdate(update) => {
                Arc::make_mut(&mut state.visitor).merge(update);
            }
            Event::AgentUpdate(update) => apply_agent_update(&mut state, update),
            Event::Chat(chat) => self.apply_chat(&mut state, chat),
            Event::Synthetic(intent) => {
                tracing::warn!(intent = intent.kind(), ?intent, "unhandled intent");
            }
            Event::Unknown { kind, detail } => {
                tracing::warn!(kind = kind.as_str(), ?detail, "unhandled event");
            }
        }

        state
    }

    fn apply_chat(&self, state: &mut ChatState, chat: &ChatEvent) {
        let role = Role::of(chat.nick());

        match chat {
            ChatEvent::MemberJoin(presence) => {
                match presence.nick.as_deref() {
                    Some(nick) if role.is_agent() => {
                        if !state.agents.contains_key(nick) {
                            Arc::make_mut(&mut state.agents).insert(nick.to_owned(), Agent::bare(nick));
                        }
                    }
                    Some(nick) => {
                        if state.visitor.nick.as_deref() != Some(nick) {
                            Arc::make_mut(&mut state.visitor).nick = Some(nick.to_owned());
                        }
                    }
                    None => tracing::warn!(kind = chat.kind(), "member join without nick"),
                }
                if !role.is_agent() {
                    state.is_chatting = true;
                }
                state.chats.append(self.clock.now_ms(), chat.clone(), None);
            }
            ChatEvent::MemberLeave(_) => {
                if !role.is_agent() {
                    state.is_chatting = false;
                }
                state.chats.append(self.clock.now_ms(), chat.clone(), None);
            }
            ChatEvent::Message(_) | ChatEvent::File(_) | ChatEvent::WaitQueue(_) | ChatEvent::RatingRequest(_) => {
                let member = resolve_member(state, chat.nick(), chat.display_name());
                state.chats.append(self.clock.now_ms(), chat.clone(), Some(member));
                if !role.is_visitor() {
                    state.last_non_visitor_msg_ts = chat.timestamp();
                }
            }
            ChatEvent::Typing(indicator) => {
                let Some(nick) = indicator.nick.as_deref() else {
                    tracing::warn!(kind = chat.kind(), "typing indicator without nick");
                    return;
                };
                let agents = Arc::make_mut(&mut state.agents);
                agents
                    .entry(nick.to_owned())
                    .or_insert_with(|| Agent::bare(nick))
                    .typing = indicator.typing;
            }
            ChatEvent::Unknown { kind, detail } => {
                tracing::warn!(kind = kind.as_str(), ?detail, "unhandled chat event");
            }
        }
    }
}

fn apply_agent_update(state: &mut ChatState, update: &AgentUpdate) {
    let Some(nick) = update.nick.as_deref() else {
        tracing::warn!("agent update without nick");
        return;
    };

    let agents = Arc::make_mut(&mut state.agents);
    let agent = agents.entry(nick.to_owned()).or_insert_with(|| Agent::bare(nick));
    agent.merge(update);
    nick.clone_into(&mut agent.nick);
}
