use std::sync::Arc;

use super::*;

fn state_with_roster() -> ChatState {
    let mut state = ChatState::default();
    Arc::make_mut(&mut state.agents).insert(
        "agent:1".to_owned(),
        Agent {
            display_name: Some("Bob".to_owned()),
            avatar_path: Some("/bob.png".to_owned()),
            ..Agent::bare("agent:1")
        },
    );
    state.visitor = Arc::new(Visitor {
        nick: Some("visitor:7".to_owned()),
        display_name: Some("Ann".to_owned()),
        ..Visitor::default()
    });
    state
}

#[test]
fn known_agent_resolves_to_roster_record() {
    let state = state_with_roster();
    let member = resolve_member(&state, Some("agent:1"), Some("ignored"));
    assert_eq!(member.role(), Role::Agent);
    assert_eq!(member.display_name(), Some("Bob"));
    let MemberSnapshot::Agent(agent) = member else {
        panic!("expected agent");
    };
    assert_eq!(agent.avatar_path.as_deref(), Some("/bob.png"));
}

#[test]
fn unknown_agent_resolves_to_stub() {
    let state = state_with_roster();
    let member = resolve_member(&state, Some("agent:9"), Some("Trigger"));
    assert_eq!(
        member,
        MemberSnapshot::Agent(Agent {
            nick: "agent:9".to_owned(),
            display_name: Some("Trigger".to_owned()),
            avatar_path: Some(String::new()),
            title: None,
            typing: false,
        })
    );
}

#[test]
fn visitor_and_other_identifiers_resolve_to_visitor() {
    let state = state_with_roster();
    for nick in [Some("visitor:7"), Some("system"), None] {
        let member = resolve_member(&state, nick, None);
        assert_eq!(member.role(), Role::Visitor);
        assert_eq!(member.nick(), Some("visitor:7"));
        assert_eq!(member.display_name(), Some("Ann"));
    }
}

#[test]
fn snapshot_serializes_member_type() {
    let state = state_with_roster();
    let value = serde_json::to_value(resolve_member(&state, Some("agent:1"), None)).unwrap();
    assert_eq!(value["member_type"], "agent");
    assert_eq!(value["nick"], "agent:1");

    let value = serde_json::to_value(resolve_member(&state, Some("visitor:7"), None)).unwrap();
    assert_eq!(value["member_type"], "visitor");
}
