// Command executor tests: toggle and delete against live device state

mod common;

use common::{aggregator_for, sample_source};
use hotspot_monitor::commands::CommandExecutor;
use hotspot_monitor::device_repo::paths;
use hotspot_monitor::error::CommandError;

#[tokio::test]
async fn test_toggle_flips_disabled_flag() {
    let source = sample_source();
    let commands = CommandExecutor::new(source.clone());

    assert!(!commands.toggle_user_disabled("bob").await.expect("toggle bob"));
    let mutations = source.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].0, paths::HOTSPOT_USER_SET);
    assert_eq!(
        mutations[0].1,
        vec![
            (".id".to_string(), "*2".to_string()),
            ("disabled".to_string(), "false".to_string())
        ]
    );

    assert!(commands.toggle_user_disabled("bob").await.expect("toggle back"));
}

#[tokio::test]
async fn test_toggle_reads_live_state_not_snapshot() {
    let source = sample_source();
    let aggregator = aggregator_for(source.clone());
    aggregator.take_snapshot().await;
    let commands = CommandExecutor::new(source.clone());

    // Toggle twice without re-polling: the second toggle must see the first.
    assert!(commands.toggle_user_disabled("alice").await.expect("disable"));
    assert!(!commands.toggle_user_disabled("alice").await.expect("enable"));
    assert!(!aggregator.latest().users[0].disabled);
}

#[tokio::test]
async fn test_toggle_is_visible_in_next_snapshot_only() {
    let source = sample_source();
    let aggregator = aggregator_for(source.clone());
    let before = aggregator.take_snapshot().await;
    let commands = CommandExecutor::new(source);

    commands.toggle_user_disabled("bob").await.expect("toggle");
    assert!(aggregator.latest().users[1].disabled);
    assert!(before.users[1].disabled);

    let after = aggregator.take_snapshot().await;
    assert_eq!(after.users[1].username, "bob");
    assert!(!after.users[1].disabled);
}

#[tokio::test]
async fn test_toggle_unknown_user_is_not_found() {
    let source = sample_source();
    let commands = CommandExecutor::new(source.clone());
    let err = commands.toggle_user_disabled("carol").await.unwrap_err();
    assert!(matches!(err, CommandError::NotFound { ref username } if username == "carol"));
    assert!(source.mutations().is_empty());
}

#[tokio::test]
async fn test_delete_removes_user() {
    let source = sample_source();
    let commands = CommandExecutor::new(source.clone());
    commands.delete_user("alice").await.expect("delete");

    let remaining = source.table(paths::HOTSPOT_USERS);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get("name").map(String::as_str), Some("bob"));
    assert!(matches!(
        commands.delete_user("alice").await,
        Err(CommandError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_rejected_mutation_surfaces_as_mutate_error() {
    let source = sample_source();
    source.fail(paths::HOTSPOT_USER_REMOVE);
    let commands = CommandExecutor::new(source);
    assert!(matches!(
        commands.delete_user("alice").await,
        Err(CommandError::Mutate(_))
    ));
}

#[tokio::test]
async fn test_lookup_failure_surfaces_as_query_error() {
    let source = sample_source();
    source.fail(paths::HOTSPOT_USERS);
    let commands = CommandExecutor::new(source.clone());
    assert!(matches!(
        commands.toggle_user_disabled("alice").await,
        Err(CommandError::Query(_))
    ));
    assert!(source.mutations().is_empty());
}
