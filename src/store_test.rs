use std::cell::RefCell;
use std::rc::Rc;

use crate::clock::ManualClock;
use crate::config::SessionConfig;
use crate::event::{ChatEvent, Intent};
use crate::state::ConnectionStatus;

use super::*;

fn store_at(ms: i64) -> (ChatStore<ManualClock>, ManualClock) {
    let clock = ManualClock::new(ms);
    let store = ChatStore::with_reducer(Reducer::new(clock.clone(), SessionConfig::default()));
    (store, clock)
}

#[test]
fn new_store_starts_from_default_state() {
    let store = ChatStore::new();
    assert_eq!(store.get_state(), ChatState::default());
}

#[test]
fn stores_get_distinct_session_ids() {
    assert_ne!(ChatStore::new().session_id(), ChatStore::new().session_id());
}

#[test]
fn dispatch_commits_new_state() {
    let (mut store, _) = store_at(0);
    store.dispatch(&Event::ConnectionUpdate(ConnectionStatus::Connecting));
    assert_eq!(store.state().connection, ConnectionStatus::Connecting);
}

#[test]
fn get_state_snapshot_is_stable() {
    let (mut store, clock) = store_at(100);
    store
        .dispatch_json(r#"{"type":"chat","detail":{"type":"chat.msg","nick":"agent:1","timestamp":1,"msg":"a"}}"#)
        .unwrap();
    let snapshot = store.get_state();

    clock.advance(10);
    store
        .dispatch_json(r#"{"type":"chat","detail":{"type":"chat.msg","nick":"agent:1","timestamp":2,"msg":"b"}}"#)
        .unwrap();

    assert_eq!(snapshot.chats.len(), 1);
    assert_eq!(snapshot.last_non_visitor_msg_ts, Some(1));
    assert_eq!(store.state().chats.len(), 2);
    assert_eq!(store.state().last_non_visitor_msg_ts, Some(2));
}

#[test]
fn dispatch_json_error_leaves_state_and_listeners_untouched() {
    let (mut store, _) = store_at(0);
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    store.subscribe(move |_| *counter.borrow_mut() += 1);

    let before = store.get_state();
    assert!(store.dispatch_json("not json").is_err());
    assert!(store.dispatch_json(r#"{"detail":{}}"#).is_err());
    assert!(store.dispatch_json(r#"{"type":"connection_update","detail":7}"#).is_err());

    assert_eq!(store.get_state(), before);
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn malformed_fields_are_dropped_not_the_event() {
    let (mut store, _) = store_at(0);

    store
        .dispatch_json(r#"{"type":"chat","detail":{"type":"chat.msg","nick":"agent:1","msg":null,"timestamp":900}}"#)
        .unwrap();
    store
        .dispatch_json(r#"{"type":"chat","detail":{"type":"chat.msg","nick":"agent:1","msg":"late","timestamp":"1500"}}"#)
        .unwrap();
    store
        .dispatch_json(r#"{"type":"department_update","detail":[{"id":"abc","name":"Sales","status":5}]}"#)
        .unwrap();

    let state = store.get_state();
    assert_eq!(state.chats.len(), 2);
    let ChatEvent::Message(first) = &state.chats.iter().next().unwrap().detail else {
        panic!("expected message");
    };
    assert_eq!(first.msg, None);
    assert_eq!(first.timestamp, Some(900));
    assert_eq!(state.chats.last().unwrap().detail.timestamp(), None);
    assert_eq!(state.last_non_visitor_msg_ts, None);

    assert_eq!(state.departments.len(), 1);
    assert_eq!(state.departments[0].id, None);
    assert_eq!(state.departments[0].name.as_deref(), Some("Sales"));
    assert_eq!(state.departments[0].status, None);
}

#[test]
fn listeners_see_committed_state_in_order() {
    let (mut store, _) = store_at(0);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&seen);
    store.subscribe(move |state| first.borrow_mut().push(("first", state.chats.len())));
    let second = Rc::clone(&seen);
    store.subscribe(move |state| second.borrow_mut().push(("second", state.chats.len())));

    store.dispatch(&Event::Synthetic(Intent::VisitorSendMessage {
        msg: Some("hi".to_owned()),
    }));

    assert_eq!(*seen.borrow(), vec![("first", 1), ("second", 1)]);
}

#[test]
fn unknown_events_still_notify() {
    let (mut store, _) = store_at(0);
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    store.subscribe(move |_| *counter.borrow_mut() += 1);

    store.dispatch_json(r#"{"type":"mystery"}"#).unwrap();
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(store.get_state(), ChatState::default());
}

#[test]
fn unsubscribe_stops_notifications() {
    let (mut store, _) = store_at(0);
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    let id = store.subscribe(move |_| *counter.borrow_mut() += 1);

    store.dispatch(&Event::ConnectionUpdate(ConnectionStatus::Open));
    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.dispatch(&Event::ConnectionUpdate(ConnectionStatus::Closed));

    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn scripted_session_end_to_end() {
    let (mut store, clock) = store_at(1_000);
    let script = [
        r#"{"type":"connection_update","detail":"connected"}"#,
        r#"{"type":"account_status","detail":"online"}"#,
        r#"{"type":"visitor_update","detail":{"nick":"visitor:9","display_name":"Ann"}}"#,
        r#"{"type":"chat","detail":{"type":"chat.memberjoin","nick":"visitor:9"}}"#,
        r#"{"type":"agent_update","detail":{"nick":"agent:1","display_name":"Bob","avatar_path":"/b.png"}}"#,
        r#"{"type":"chat","detail":{"type":"chat.memberjoin","nick":"agent:1"}}"#,
        r#"{"type":"chat","detail":{"type":"typing","nick":"agent:1","typing":true}}"#,
        r#"{"type":"chat","detail":{"type":"chat.msg","nick":"agent:1","display_name":"Bob","timestamp":1500,"msg":"Hi Ann"}}"#,
        r#"{"type":"synthetic","detail":{"type":"visitor_send_msg","msg":"Hello"}}"#,
        r#"{"type":"chat","detail":{"type":"chat.memberleave","nick":"visitor:9"}}"#,
    ];
    for line in script {
        store.dispatch_json(line).unwrap();
        clock.advance(1);
    }

    let state = store.get_state();
    assert_eq!(state.connection, ConnectionStatus::Open);
    assert!(!state.is_chatting);
    assert!(state.agent("agent:1").unwrap().typing);
    assert_eq!(state.last_non_visitor_msg_ts, Some(1500));
    assert_eq!(state.chats.len(), 5);

    let kinds: Vec<&str> = state.chats.iter().map(|e| e.detail.kind()).collect();
    assert_eq!(
        kinds,
        vec!["chat.memberjoin", "chat.memberjoin", "chat.msg", "chat.msg", "chat.memberleave"]
    );

    let local = &state.chats.iter().nth(3).unwrap().detail;
    assert_eq!(local.nick(), Some("visitor:9"));
    assert_eq!(local.display_name(), Some("Ann"));

    let rendered = serde_json::to_value(&state).unwrap();
    assert_eq!(rendered["connection"], "open");
    assert_eq!(rendered["agents"]["agent:1"]["avatar_path"], "/b.png");
    assert_eq!(rendered["chats"][2]["member"]["member_type"], "agent");
}
