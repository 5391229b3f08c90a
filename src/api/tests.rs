use serde_json::json;

use super::facade::{ApiArea, area_url, error_from, topic_lookup_path};
use super::models::{ChallengeUpdate, EventPayload, Leaderboard};
use super::paging::{DEFAULT_PAGE_SIZE, PageCursor};
use crate::config::{ApiSettings, Environment};
use crate::registry::MonitorId;
use crate::utils::error::QuestlineError;

fn api_settings(environment: Environment) -> ApiSettings {
    ApiSettings {
        api_key: "key".to_string(),
        app_id: "app-1".to_string(),
        user_id: "user-42".to_string(),
        domain: "questline.gg".to_string(),
        environment,
        language: "en".to_string(),
        request_timeout_secs: 10,
    }
}

#[test]
fn area_urls_carry_the_environment_suffix() {
    let prod = api_settings(Environment::Production);
    assert_eq!(
        area_url(&prod, ApiArea::Challenges),
        "https://challenges.questline.gg"
    );
    assert_eq!(area_url(&prod, ApiArea::Authentication), "https://auth.questline.gg");

    let staging = api_settings(Environment::Staging);
    assert_eq!(
        area_url(&staging, ApiArea::Leaderboards),
        "https://leaderboards-staging.questline.gg"
    );

    let dev = api_settings(Environment::Development);
    assert_eq!(
        area_url(&dev, ApiArea::BattlePasses),
        "https://battle-passes-dev.questline.gg"
    );
}

#[test]
fn topic_lookup_paths_per_monitor_kind() {
    assert_eq!(
        topic_lookup_path(&MonitorId::Challenges("user-42".to_string())),
        "/api/v1/notification-topics/user-challenges"
    );
    assert_eq!(
        topic_lookup_path(&MonitorId::BattlePass("season-3".to_string())),
        "/api/v1/notification-topics/battle-passes/season-3"
    );
    assert_eq!(
        topic_lookup_path(&MonitorId::Leaderboard("weekly".to_string())),
        "/api/v1/notification-topics/leaderboards/weekly"
    );
}

#[test]
fn error_mapping_prefers_the_backend_message() {
    let err = error_from(404, r#"{"message": "challenge not found"}"#);
    match err {
        QuestlineError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "challenge not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    // non-JSON bodies come through verbatim
    let err = error_from(502, "bad gateway");
    match err {
        QuestlineError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn page_cursor_stops_after_a_short_page() {
    let mut cursor = PageCursor::default();
    assert_eq!(cursor.page_size(), DEFAULT_PAGE_SIZE);
    assert_eq!(cursor.next_page(), Some(1));

    // a full page keeps the cursor going
    cursor.record(25);
    assert_eq!(cursor.next_page(), Some(2));

    // a short page means all content is loaded
    cursor.record(10);
    assert!(cursor.exhausted());
    assert_eq!(cursor.next_page(), None);
}

#[test]
fn page_cursor_clamps_the_page_size() {
    let cursor = PageCursor::new(0);
    assert_eq!(cursor.page_size(), 1);
}

#[test]
fn challenge_webhook_payload_decodes() {
    let update: ChallengeUpdate = serde_json::from_value(json!({
        "new_challenge": { "challenge_id": "c1", "type": "finished" }
    }))
    .unwrap();
    let changed = update.new_challenge.unwrap();
    assert_eq!(changed.challenge_id, "c1");
    assert_eq!(changed.kind.as_deref(), Some("finished"));
    assert!(update.old_challenge.is_none());
}

#[test]
fn leaderboard_rankings_default_to_empty() {
    let board: Leaderboard =
        serde_json::from_value(json!({ "leaderboard_id": "weekly", "name": "Weekly" })).unwrap();
    assert!(board.grouped_by_users.is_empty());
}

#[test]
fn single_events_get_fresh_sessions() {
    let a = EventPayload::single("kill-enemy", "user-42");
    let b = EventPayload::single("kill-enemy", "user-42");
    assert_eq!(a.event_type, "single");
    assert_ne!(a.session_id, b.session_id);
    assert!(a.timestamp > 0);

    let tagged = a.with_meta_data(json!({ "amount": 3 }));
    assert_eq!(tagged.meta_data["amount"], 3);
}
