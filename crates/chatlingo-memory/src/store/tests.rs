use super::Store;
use chatlingo_core::{
    config::MemoryConfig,
    error::ChatlingoError,
    model::{Mode, Platform, Role, Scenario},
};

async fn test_store() -> Store {
    Store::in_memory().await.unwrap()
}

async fn seeded_user(store: &Store, key: &str) {
    store
        .get_or_create(key, Platform::WhatsApp, "919845012345")
        .await
        .unwrap();
}

fn scenario(id: i64, title: &str) -> Scenario {
    Scenario {
        id,
        title: title.to_string(),
        bot_persona: "Auto driver".to_string(),
        situation_seed: "Meter is broken".to_string(),
        opening_line: "Elli hogbeku?".to_string(),
    }
}

#[tokio::test]
async fn test_new_with_memory_path() {
    let cfg = MemoryConfig {
        db_path: ":memory:".to_string(),
        ..Default::default()
    };
    let store = Store::new(&cfg).await.unwrap();
    assert_eq!(store.user_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let store = test_store().await;
    Store::run_migrations(store.pool()).await.unwrap();
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_get_or_create_is_idempotent() {
    let store = test_store().await;
    let first = store
        .get_or_create("abc", Platform::Telegram, "42")
        .await
        .unwrap();
    let second = store
        .get_or_create("abc", Platform::Telegram, "42")
        .await
        .unwrap();

    assert_eq!(store.user_count().await.unwrap(), 1);
    assert_eq!(first.user_key, second.user_key);
    assert_eq!(first.joined_at, second.joined_at);
    assert!(second.last_active_at >= first.last_active_at);
    assert_eq!(first.current_mode, Mode::Menu);
    assert_eq!(first.current_scenario_id, None);
    assert_eq!(first.current_session_id, None);
    assert_eq!(first.day_number, None);
    assert_eq!(first.platform, Platform::Telegram);
}

#[tokio::test]
async fn test_concurrent_get_or_create_single_row() {
    let store = test_store().await;
    let mut handles = Vec::new();
    for _ in 0..8 {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            s.get_or_create("race", Platform::Sms, "15550001111").await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    assert_eq!(store.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_mode_scenario_sets_pointers() {
    let store = test_store().await;
    seeded_user(&store, "u1").await;

    store
        .update_mode("u1", Mode::PracticeScenario, Some(3), Some("sess-1"))
        .await
        .unwrap();
    let u = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(u.current_mode, Mode::PracticeScenario);
    assert_eq!(u.current_scenario_id, Some(3));
    assert_eq!(u.current_session_id.as_deref(), Some("sess-1"));

    // Leaving the scenario drops both pointers even if the caller passes them.
    store
        .update_mode("u1", Mode::Menu, Some(3), Some("sess-1"))
        .await
        .unwrap();
    let u = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(u.current_mode, Mode::Menu);
    assert_eq!(u.current_scenario_id, None);
    assert_eq!(u.current_session_id, None);
}

#[tokio::test]
async fn test_update_mode_scenario_without_session_rejected() {
    let store = test_store().await;
    seeded_user(&store, "u1").await;
    let err = store
        .update_mode("u1", Mode::PracticeScenario, Some(1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatlingoError::Validation(_)));
    let u = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(u.current_mode, Mode::Menu);
}

#[tokio::test]
async fn test_update_mode_unknown_user_errors() {
    let store = test_store().await;
    assert!(store
        .update_mode("ghost", Mode::RandomChat, None, None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_day_number_round_trip() {
    let store = test_store().await;
    seeded_user(&store, "u1").await;
    store.set_day_number("u1", Some(5)).await.unwrap();
    assert_eq!(
        store.get_user("u1").await.unwrap().unwrap().day_number,
        Some(5)
    );
    store.set_day_number("u1", None).await.unwrap();
    assert_eq!(store.get_user("u1").await.unwrap().unwrap().day_number, None);
}

#[tokio::test]
async fn test_recent_messages_is_bounded_chronological_suffix() {
    let store = test_store().await;
    seeded_user(&store, "u1").await;
    for i in 0..12 {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        store
            .append_message("u1", role, &format!("m{i}"), Mode::RandomChat, None, None)
            .await
            .unwrap();
    }

    let recent = store.recent_messages("u1", 5, None).await.unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m7", "m8", "m9", "m10", "m11"]);
    assert!(recent.windows(2).all(|w| w[0].created_at <= w[1].created_at));

    let all = store.recent_messages("u1", 100, None).await.unwrap();
    assert_eq!(all.len(), 12);
    assert_eq!(all[0].content, "m0");
}

#[tokio::test]
async fn test_recent_messages_session_filter() {
    let store = test_store().await;
    seeded_user(&store, "u1").await;
    store
        .append_message("u1", Role::Assistant, "run one", Mode::PracticeScenario, Some("s1"), Some(1))
        .await
        .unwrap();
    store
        .append_message("u1", Role::Assistant, "run two", Mode::PracticeScenario, Some("s2"), Some(1))
        .await
        .unwrap();
    store
        .append_message("u1", Role::User, "chat", Mode::RandomChat, None, None)
        .await
        .unwrap();

    let s2 = store.recent_messages("u1", 50, Some("s2")).await.unwrap();
    assert_eq!(s2.len(), 1);
    assert_eq!(s2[0].content, "run two");
    assert_eq!(s2[0].scenario_id, Some(1));
    assert_eq!(s2[0].role, Role::Assistant);
}

#[tokio::test]
async fn test_recent_messages_for_mode_excludes_other_modes() {
    let store = test_store().await;
    seeded_user(&store, "u1").await;
    store
        .append_message("u1", Role::Assistant, "roleplay", Mode::PracticeScenario, Some("s1"), Some(1))
        .await
        .unwrap();
    store
        .append_message("u1", Role::User, "lesson", Mode::DayCurriculum, None, None)
        .await
        .unwrap();

    let lessons = store
        .recent_messages_for_mode("u1", Mode::DayCurriculum, 10)
        .await
        .unwrap();
    assert_eq!(lessons.len(), 1);
    assert_eq!(lessons[0].content, "lesson");
}

#[tokio::test]
async fn test_history_is_per_user() {
    let store = test_store().await;
    seeded_user(&store, "u1").await;
    seeded_user(&store, "u2").await;
    store
        .append_message("u1", Role::User, "mine", Mode::RandomChat, None, None)
        .await
        .unwrap();
    assert!(store.recent_messages("u2", 10, None).await.unwrap().is_empty());
    assert_eq!(store.clear_history("u1").await.unwrap(), 1);
    assert_eq!(store.message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_append_for_unknown_user_fails() {
    let store = test_store().await;
    assert!(store
        .append_message("ghost", Role::User, "hi", Mode::Menu, None, None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_scenarios_upsert_and_lookup() {
    let store = test_store().await;
    assert!(store.all_scenarios().await.unwrap().is_empty());

    store
        .upsert_scenarios(&[scenario(2, "Darshini"), scenario(1, "Auto")])
        .await
        .unwrap();
    let all = store.all_scenarios().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, 1);

    store
        .upsert_scenarios(&[scenario(1, "Auto Rickshaw Ride")])
        .await
        .unwrap();
    let one = store.scenario_by_id(1).await.unwrap().unwrap();
    assert_eq!(one.title, "Auto Rickshaw Ride");
    assert_eq!(store.all_scenarios().await.unwrap().len(), 2);
    assert!(store.scenario_by_id(99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_mark_scenario_complete_counts_runs() {
    let store = test_store().await;
    seeded_user(&store, "u1").await;
    store.mark_scenario_complete("u1", 1).await.unwrap();
    store.mark_scenario_complete("u1", 1).await.unwrap();
    store.mark_scenario_complete("u1", 3).await.unwrap();
    assert_eq!(
        store.completed_scenarios("u1").await.unwrap(),
        vec![(1, 2), (3, 1)]
    );
}

#[tokio::test]
async fn test_all_users_lists_everyone() {
    let store = test_store().await;
    for key in ["a", "b", "c"] {
        seeded_user(&store, key).await;
    }
    let users = store.all_users().await.unwrap();
    assert_eq!(users.len(), 3);
}
