//! Session state holder.
//!
//! DESIGN
//! ======
//! One `ChatStore` per chat session, owned by whoever drives the session.
//! `dispatch` moves the current state into the reducer and commits the
//! result, then notifies listeners in subscription order. There is no reset;
//! a new session gets a new store.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::event::{Event, EventError};
use crate::reducer::Reducer;
use crate::state::ChatState;

/// Handle returned by [`ChatStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ChatState)>;

pub struct ChatStore<C = SystemClock> {
    session_id: Uuid,
    state: ChatState,
    reducer: Reducer<C>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl ChatStore<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_reducer(Reducer::default())
    }
}

impl Default for ChatStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ChatStore<C> {
    #[must_use]
    pub fn with_reducer(reducer: Reducer<C>) -> Self {
        let session_id = Uuid::new_v4();
        tracing::debug!(session = %session_id, "chat store created");
        Self {
            session_id,
            state: ChatState::default(),
            reducer,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Borrow the committed state.
    #[must_use]
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Snapshot of the committed state. Later dispatches never change it.
    #[must_use]
    pub fn get_state(&self) -> ChatState {
        self.state.clone()
    }

    /// Apply an event, commit the new state, and notify listeners.
    pub fn dispatch(&mut self, event: &Event) {
        tracing::trace!(session = %self.session_id, kind = event.kind(), "dispatch");
        let current = std::mem::take(&mut self.state);
        self.state = self.reducer.reduce(current, event);

        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    /// Decode a JSON envelope and dispatch it.
    ///
    /// # Errors
    ///
    /// Returns the decode error; state and listeners are left untouched.
    pub fn dispatch_json(&mut self, raw: &str) -> Result<(), EventError> {
        match Event::from_json(raw) {
            Ok(event) => {
                self.dispatch(&event);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "dropping undecodable event");
                Err(e)
            }
        }
    }

    /// Register a listener called with the new state after every dispatch.
    pub fn subscribe(&mut self, listener: impl FnMut(&ChatState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}
