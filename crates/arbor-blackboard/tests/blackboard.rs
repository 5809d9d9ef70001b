use arbor_blackboard::{Access, ActivityType, Blackboard, BlackboardError, RegistrationError};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[test]
fn set_get_unset_roundtrip() {
    let bb = Blackboard::new();
    let mut client = bb.client("writer");
    client.register_key("k", Access::Write).unwrap();

    client.set("k", 42, true).unwrap();
    assert_eq!(client.get("k").unwrap(), json!(42));
    assert_eq!(bb.get("/k"), Some(json!(42)));

    client.unset("k").unwrap();
    assert!(matches!(
        client.get("k"),
        Err(BlackboardError::NoSuchKey { key }) if key == "/k"
    ));
    assert!(bb.metadata("/k").is_none());
}

#[test]
fn exclusive_write_refused_when_another_client_writes() {
    let bb = Blackboard::new();
    let mut writer = bb.client("writer");
    let mut claimant = bb.client("claimant");
    writer.register_key("/shared", Access::Write).unwrap();

    let err = claimant
        .register_key("/shared", Access::ExclusiveWrite)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::WriteConflict { ref writers, .. } if writers == &["writer".to_string()]));
}

#[test]
fn write_refused_when_another_client_holds_exclusive() {
    let bb = Blackboard::new();
    let mut owner = bb.client("owner");
    let mut other = bb.client("other");
    owner
        .register_key("/parameters/default_speed", Access::ExclusiveWrite)
        .unwrap();

    assert!(matches!(
        other.register_key("/parameters/default_speed", Access::Write),
        Err(RegistrationError::ExclusiveWriteConflict { ref holder, .. }) if holder == "owner"
    ));
    assert!(matches!(
        other.register_key("/parameters/default_speed", Access::ExclusiveWrite),
        Err(RegistrationError::ExclusiveWriteConflict { .. })
    ));
    // reading is still fine
    other
        .register_key("/parameters/default_speed", Access::Read)
        .unwrap();
}

#[test]
fn many_clients_may_share_plain_write() {
    let bb = Blackboard::new();
    let mut a = bb.client("a");
    let mut b = bb.client("b");
    a.register_key("count", Access::Write).unwrap();
    b.register_key("count", Access::Write).unwrap();

    a.set("count", 1, true).unwrap();
    b.set("count", 2, true).unwrap();
    assert_eq!(a.get("count").unwrap(), json!(2));
    assert_eq!(bb.metadata("/count").unwrap().write.len(), 2);
}

#[test]
fn read_only_client_cannot_write() {
    let bb = Blackboard::new();
    let mut reader = bb.client("reader");
    reader.register_key("dude", Access::Read).unwrap();

    let err = reader.set("dude", "Bob", true).unwrap_err();
    assert!(err.is_access_denied());
    assert!(matches!(err, BlackboardError::AccessDenied { access: Access::Write, .. }));
    assert!(reader.unset("dude").unwrap_err().is_access_denied());
}

#[test]
fn unregistered_read_is_denied_not_missing() {
    let bb = Blackboard::new();
    bb.set("/dudette", "Jane").unwrap();
    let mut client = bb.client("nosy");
    client.register_key("dude", Access::Read).unwrap();

    assert!(client.get("dudette").unwrap_err().is_access_denied());
    assert!(client.get("dude").unwrap_err().is_no_such_key());
}

#[test]
fn overwrite_false_leaves_value_untouched() {
    let bb = Blackboard::new();
    let mut client = bb.client("writer");
    client.register_key("spaghetti", Access::Write).unwrap();
    client
        .set("spaghetti", json!({"type": "Gnocchi", "quantity": 2}), true)
        .unwrap();

    let err = client
        .set("spaghetti", json!({"type": "Bolognese", "quantity": 3}), false)
        .unwrap_err();
    assert!(matches!(err, BlackboardError::KeyExists { .. }));
    assert_eq!(client.get("spaghetti.type").unwrap(), json!("Gnocchi"));
}

#[test]
fn namespaced_clients_resolve_relative_keys() {
    let bb = Blackboard::new();
    let mut parameters = bb.namespaced_client("parameters", "parameters").unwrap();
    let mut state = bb.namespaced_client("state", "/state/").unwrap();
    parameters.register_key("default_speed", Access::Write).unwrap();
    state.register_key("current_speed", Access::Write).unwrap();

    parameters.set("default_speed", 30.0, true).unwrap();
    state.set("current_speed", 31.0, true).unwrap();

    assert_eq!(bb.get("/parameters/default_speed"), Some(json!(30.0)));
    assert_eq!(bb.get("/state/current_speed"), Some(json!(31.0)));
    // absolute keys inside the namespace are accepted
    assert_eq!(
        state.get("/state/current_speed").unwrap(),
        json!(31.0)
    );
}

#[test]
fn namespaced_clients_may_register_absolute_keys_elsewhere() {
    let bb = Blackboard::new();
    let mut foo = bb.namespaced_client("foo", "foo").unwrap();
    foo.register_key("/brilliant", Access::Write).unwrap();
    foo.set("/brilliant", false, true).unwrap();
    assert_eq!(bb.get("/brilliant"), Some(json!(false)));
    assert!(bb.get("/foo/brilliant").is_none());

    // still nothing outside the registrations
    assert!(foo.get("/elsewhere").unwrap_err().is_access_denied());
}

#[test]
fn relative_keys_cannot_climb_out_of_the_namespace() {
    let bb = Blackboard::new();
    bb.enable_activity_stream(4);
    let mut state = bb.namespaced_client("state", "state").unwrap();

    assert!(matches!(
        state.register_key("../parameters/default_speed", Access::Read),
        Err(RegistrationError::NotInNamespace { .. })
    ));
    assert!(matches!(
        state.get("../parameters/default_speed"),
        Err(BlackboardError::NotInNamespace { .. })
    ));
    let stream = bb.activity_stream().unwrap();
    assert_eq!(stream.len(), 1);
    assert_eq!(stream[0].activity_type, ActivityType::AccessDenied);
}

#[test]
fn malformed_keys_report_the_attempted_access() {
    let bb = Blackboard::new();
    bb.enable_activity_stream(4);
    let client = bb.client("clumsy");

    assert!(matches!(
        client.set("a//b", 1, true),
        Err(BlackboardError::AccessDenied { access: Access::Write, .. })
    ));
    assert!(matches!(
        client.unset("a//b"),
        Err(BlackboardError::AccessDenied { access: Access::Write, .. })
    ));
    assert!(matches!(
        client.get("a//b"),
        Err(BlackboardError::AccessDenied { access: Access::Read, .. })
    ));
    assert_eq!(bb.activity_stream().unwrap().len(), 3);
}

#[test]
fn exclusive_write_survives_an_unset() {
    let bb = Blackboard::new();
    let mut owner = bb.client("owner");
    owner.register_key("k", Access::ExclusiveWrite).unwrap();
    owner.set("k", 1, true).unwrap();
    owner.unset("k").unwrap();
    owner.set("k", 2, true).unwrap();

    let mut rival = bb.client("rival");
    assert!(matches!(
        rival.register_key("k", Access::ExclusiveWrite),
        Err(RegistrationError::ExclusiveWriteConflict { ref holder, .. }) if holder == "owner"
    ));
    assert_eq!(bb.metadata("/k").unwrap().exclusive, Some(owner.id()));
}

#[test]
fn writer_loses_a_key_claimed_while_it_was_unset() {
    let bb = Blackboard::new();
    let mut owner = bb.client("owner");
    owner.register_key("k", Access::ExclusiveWrite).unwrap();
    owner.set("k", 1, true).unwrap();
    owner.unset("k").unwrap();

    let mut rival = bb.client("rival");
    rival.register_key("k", Access::ExclusiveWrite).unwrap();
    rival.set("k", 2, true).unwrap();

    assert!(owner.set("k", 3, true).unwrap_err().is_access_denied());
    assert_eq!(bb.get("/k"), Some(json!(2)));
}

#[test]
fn admin_access_accepts_keys_without_leading_separator() {
    let bb = Blackboard::new();
    bb.set("a", 1).unwrap();
    assert_eq!(bb.get("a"), Some(json!(1)));
    assert_eq!(bb.get("/a"), Some(json!(1)));
    assert!(bb.contains("a"));
    assert_eq!(bb.unset("a"), Some(json!(1)));
    assert!(!bb.contains("/a"));
}

#[test]
fn remapped_writes_land_on_the_target_path() {
    let bb = Blackboard::new();
    bb.enable_activity_stream(10);
    let mut remapper = bb.client("remap");
    remapper
        .register_key_remapped("wow", Access::Write, "/parameters/wow")
        .unwrap();
    remapper.set("wow", "colander", true).unwrap();

    let mut observer = bb.client("observer");
    observer
        .register_key("/parameters/wow", Access::Read)
        .unwrap();
    assert_eq!(observer.get("/parameters/wow").unwrap(), json!("colander"));

    assert!(bb.get("/wow").is_none());
    assert!(bb
        .metadata("/parameters/wow")
        .unwrap()
        .write
        .contains(&remapper.id()));
    let stream = bb.activity_stream().unwrap();
    assert_eq!(stream[0].key, "/parameters/wow");
    assert_eq!(
        remapper.remappings().get("/wow").map(String::as_str),
        Some("/parameters/wow")
    );
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Nested {
    foo: String,
}

#[test]
fn typed_access_through_serde() {
    let bb = Blackboard::new();
    let mut client = bb.client("typed");
    client.register_key("nested", Access::Write).unwrap();
    client
        .set_as("nested", &Nested { foo: "bar".into() }, true)
        .unwrap();

    let nested: Nested = client.get_as("nested").unwrap();
    assert_eq!(nested.foo, "bar");
    assert_eq!(client.get("nested.foo").unwrap(), json!("bar"));
    assert!(client.get("nested.missing").unwrap_err().is_no_such_key());
    assert!(matches!(
        client.get_as::<u32>("nested"),
        Err(BlackboardError::TypeMismatch { .. })
    ));
}

#[test]
fn dropping_a_client_releases_its_claims() {
    let bb = Blackboard::new();
    {
        let mut owner = bb.client("owner");
        owner.register_key("lock", Access::ExclusiveWrite).unwrap();
        owner.set("lock", true, true).unwrap();
    }
    assert!(bb.metadata("/lock").is_none());
    assert_eq!(bb.get("/lock"), Some(json!(true)));

    let mut next = bb.client("next");
    next.register_key("lock", Access::ExclusiveWrite).unwrap();
}

#[test]
fn unregister_with_clear_removes_orphaned_values() {
    let bb = Blackboard::new();
    let mut a = bb.client("a");
    let mut b = bb.client("b");
    a.register_key("mine", Access::Write).unwrap();
    a.register_key("ours", Access::Write).unwrap();
    b.register_key("ours", Access::Read).unwrap();
    a.set("mine", 1, true).unwrap();
    a.set("ours", 2, true).unwrap();

    a.unregister(true);
    assert!(!bb.contains("/mine"));
    assert!(bb.contains("/ours"));
    assert_eq!(b.get("ours").unwrap(), json!(2));
}

#[test]
fn clear_resets_the_store() {
    let bb = Blackboard::new();
    bb.enable_activity_stream(4);
    let mut client = bb.client("c");
    client.register_key("k", Access::Write).unwrap();
    client.set("k", 1, true).unwrap();

    bb.clear();
    assert!(bb.keys().is_empty());
    assert!(bb.clients().is_empty());
    assert!(!bb.activity_stream_enabled());
}

#[test]
fn keys_filtered_by_clients() {
    let bb = Blackboard::new();
    let mut a = bb.client("a");
    let mut b = bb.client("b");
    a.register_key("x", Access::Write).unwrap();
    b.register_key("y", Access::Read).unwrap();

    let ids = [a.id()].into_iter().collect();
    assert_eq!(bb.keys_filtered_by_clients(&ids), vec!["/x".to_string()]);
    assert_eq!(bb.keys(), vec!["/x".to_string(), "/y".to_string()]);
}
