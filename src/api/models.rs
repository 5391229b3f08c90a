use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Access credential returned by the authentication area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
}

/// Broker topic name for one notification stream, issued by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTopic {
    pub topic: String,
}

/// Generic acknowledgement body returned by state-changing operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: Option<u16>,
    pub message: Option<String>,
}

/// A single challenge as tracked for the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub challenge_id: String,
    pub challenge_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub challenge_goal: Option<i64>,
    pub user_challenge_current_score: Option<i64>,
    pub challenge_reward: Option<String>,
    pub challenge_duration_time: Option<i64>,
}

/// Challenges are delivered grouped into categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeCategory {
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

/// Webhook-style payload pushed on the challenge notification topic.
///
/// Carries the state of the changed challenge before and after the change;
/// either side may be absent depending on the webhook type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeUpdate {
    pub webhook_type: Option<String>,
    pub new_challenge: Option<ChallengeEvent>,
    pub old_challenge: Option<ChallengeEvent>,
}

/// Challenge state embedded in a [`ChallengeUpdate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeEvent {
    pub challenge_id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A battle pass the app offers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattlePass {
    pub battle_pass_id: String,
    pub battle_pass_name: Option<String>,
    pub image: Option<String>,
    pub unlocked_at: Option<String>,
    pub can_purchase: Option<bool>,
}

/// One level of a battle pass, with its gating challenges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattlePassLevel {
    pub level_id: String,
    pub battle_pass_id: Option<String>,
    pub reward_amount: Option<String>,
    pub level_completed: Option<bool>,
    pub reward_claimed: Option<bool>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

/// A leaderboard page: metadata plus the rankings it contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub leaderboard_id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub grouped_by_users: Vec<LeaderboardRanking>,
}

/// One member's position on a leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRanking {
    pub member_id: String,
    pub member_type: Option<String>,
    pub rank: u32,
    pub score: i64,
    pub additional_info: Option<Value>,
}

/// An ingestion event sent to the events area on behalf of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub event_name: String,
    pub event_type: String,
    pub user_id: String,
    pub session_id: String,
    pub timestamp: i64,
    #[serde(default)]
    pub meta_data: Value,
}

impl EventPayload {
    /// Build a one-off ("single") event with a fresh session id.
    pub fn single(event_name: &str, user_id: &str) -> Self {
        Self {
            event_name: event_name.to_string(),
            event_type: "single".to_string(),
            user_id: user_id.to_string(),
            session_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            meta_data: Value::Null,
        }
    }

    /// Attach metadata counters/properties to the event.
    #[must_use]
    pub fn with_meta_data(mut self, meta_data: Value) -> Self {
        self.meta_data = meta_data;
        self
    }
}
