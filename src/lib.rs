//! # livechat
//!
//! Client-side state for a single live chat session: connection and account
//! status, departments, the visitor, the agent roster, and the transcript.
//!
//! State changes only by applying events through [`reducer::reduce`].
//! [`store::ChatStore`] holds the current state for a session, dispatches
//! events, and notifies listeners. Transport and rendering live elsewhere.

pub mod clock;
pub mod config;
pub mod event;
pub mod identity;
pub mod member;
pub mod reducer;
pub mod state;
pub mod store;
pub mod transcript;
pub mod translate;

pub use event::{ChatEvent, Event, EventError, Intent};
pub use reducer::{Reducer, reduce};
pub use state::ChatState;
pub use store::{ChatStore, SubscriptionId};
