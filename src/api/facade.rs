//! Authenticated HTTP facade over the backend's capability areas.
//!
//! Each capability area (authentication, events, challenges, battle passes,
//! leaderboards) lives on its own subdomain; the environment selects a suffix
//! (`-staging`, `-dev`) on top of it. All domain operations are one-shot
//! request/response calls with no retry policy; callers decide what to do
//! with a failure.

use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use crate::api::models::{
    AccessToken, ActionResponse, BattlePass, BattlePassLevel, Challenge, ChallengeCategory,
    EventPayload, Leaderboard, LeaderboardRanking, NotificationTopic,
};
use crate::api::paging::PageCursor;
use crate::config::ApiSettings;
use crate::registry::MonitorId;
use crate::utils::error::QuestlineError;

/// Capability areas of the backend, each on its own base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiArea {
    Authentication,
    Events,
    Challenges,
    BattlePasses,
    Leaderboards,
}

impl ApiArea {
    pub(crate) fn subdomain(self) -> &'static str {
        match self {
            ApiArea::Authentication => "auth",
            ApiArea::Events => "events",
            ApiArea::Challenges => "challenges",
            ApiArea::BattlePasses => "battle-passes",
            ApiArea::Leaderboards => "leaderboards",
        }
    }
}

/// Base URL of a capability area for the configured environment.
pub(crate) fn area_url(settings: &ApiSettings, area: ApiArea) -> String {
    format!(
        "https://{}{}.{}",
        area.subdomain(),
        settings.environment.subdomain_suffix(),
        settings.domain
    )
}

/// Lookup path for the notification topic of one monitored entity.
pub(crate) fn topic_lookup_path(id: &MonitorId) -> String {
    match id {
        MonitorId::Challenges(_) => "/api/v1/notification-topics/user-challenges".to_string(),
        MonitorId::BattlePass(bp) => format!("/api/v1/notification-topics/battle-passes/{bp}"),
        MonitorId::Leaderboard(lb) => format!("/api/v1/notification-topics/leaderboards/{lb}"),
    }
}

/// Map a non-2xx response to an API error, preferring the backend's own
/// `message` field when the body carries one.
pub(crate) fn error_from(status: u16, body: &str) -> QuestlineError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());
    QuestlineError::Api { status, message }
}

/// The authenticated API client.
///
/// Owns the access credential exclusively. Regenerating the credential (e.g.
/// on a language change) means building a fresh facade and swapping it in;
/// requests in flight against the old instance are not cancelled.
pub struct ApiFacade {
    http: Client,
    settings: ApiSettings,
    access_token: String,
}

impl ApiFacade {
    /// Generate an access token for the configured user and return a ready
    /// facade. A rejected credential is fatal; there is no automatic retry.
    pub async fn authenticate(settings: ApiSettings) -> Result<Self, QuestlineError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        let url = format!(
            "{}/api/v1/access-tokens",
            area_url(&settings, ApiArea::Authentication)
        );
        let response = http
            .post(&url)
            .bearer_auth(&settings.api_key)
            .json(&json!({ "user_id": settings.user_id }))
            .send()
            .await
            .map_err(|e| QuestlineError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuestlineError::Auth(format!("status {status}: {body}")));
        }
        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| QuestlineError::Auth(e.to_string()))?;

        info!(user = %settings.user_id, "access token generated");
        Ok(Self {
            http,
            settings,
            access_token: token.token,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.settings.user_id
    }

    pub fn language(&self) -> &str {
        &self.settings.language
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, QuestlineError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(error_from(status.as_u16(), &body))
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        area: ApiArea,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, QuestlineError> {
        let url = format!("{}{}", area_url(&self.settings, area), path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        area: ApiArea,
        path: &str,
        body: &B,
    ) -> Result<T, QuestlineError> {
        let url = format!("{}{}", area_url(&self.settings, area), path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        Self::parse(response).await
    }

    fn language_query(&self) -> [(&'static str, String); 1] {
        [("language", self.settings.language.clone())]
    }

    /// Broker topic carrying push notifications for `id`.
    pub async fn notification_topic(&self, id: &MonitorId) -> Result<String, QuestlineError> {
        let topic: NotificationTopic = self
            .get(ApiArea::Authentication, &topic_lookup_path(id), &[])
            .await?;
        Ok(topic.topic)
    }

    /// All personal challenges of the authenticated user, grouped by category.
    pub async fn personal_challenges(&self) -> Result<Vec<ChallengeCategory>, QuestlineError> {
        let path = format!("/api/v1/challenges/{}", self.settings.app_id);
        self.get(ApiArea::Challenges, &path, &self.language_query())
            .await
    }

    /// One challenge by id.
    pub async fn challenge(&self, challenge_id: &str) -> Result<Challenge, QuestlineError> {
        let path = format!("/api/v1/challenges/{}/{challenge_id}", self.settings.app_id);
        self.get(ApiArea::Challenges, &path, &self.language_query())
            .await
    }

    async fn challenge_action(
        &self,
        challenge_id: &str,
        action: &str,
    ) -> Result<Challenge, QuestlineError> {
        let path = format!(
            "/api/v1/challenges/{}/{challenge_id}/{action}",
            self.settings.app_id
        );
        self.post(ApiArea::Challenges, &path, &json!({})).await
    }

    pub async fn unlock_challenge(&self, challenge_id: &str) -> Result<Challenge, QuestlineError> {
        self.challenge_action(challenge_id, "unlock").await
    }

    pub async fn activate_challenge(
        &self,
        challenge_id: &str,
    ) -> Result<Challenge, QuestlineError> {
        self.challenge_action(challenge_id, "activate").await
    }

    pub async fn claim_challenge_reward(
        &self,
        challenge_id: &str,
    ) -> Result<Challenge, QuestlineError> {
        self.challenge_action(challenge_id, "claim-reward").await
    }

    pub async fn cancel_challenge(&self, challenge_id: &str) -> Result<Challenge, QuestlineError> {
        self.challenge_action(challenge_id, "cancel").await
    }

    /// All battle passes of the app.
    pub async fn battle_passes(&self) -> Result<Vec<BattlePass>, QuestlineError> {
        let path = format!("/api/v1/battle-passes/{}", self.settings.app_id);
        self.get(ApiArea::BattlePasses, &path, &self.language_query())
            .await
    }

    /// One battle pass by id.
    pub async fn battle_pass(&self, battle_pass_id: &str) -> Result<BattlePass, QuestlineError> {
        let path = format!(
            "/api/v1/battle-passes/{}/{battle_pass_id}",
            self.settings.app_id
        );
        self.get(ApiArea::BattlePasses, &path, &self.language_query())
            .await
    }

    pub async fn unlock_battle_pass(
        &self,
        battle_pass_id: &str,
    ) -> Result<BattlePass, QuestlineError> {
        let path = format!(
            "/api/v1/battle-passes/{}/{battle_pass_id}/unlock",
            self.settings.app_id
        );
        self.post(ApiArea::BattlePasses, &path, &json!({})).await
    }

    /// Levels of a battle pass, including their gating challenges.
    pub async fn battle_pass_levels(
        &self,
        battle_pass_id: &str,
    ) -> Result<Vec<BattlePassLevel>, QuestlineError> {
        let path = format!(
            "/api/v1/battle-passes/{}/{battle_pass_id}/levels",
            self.settings.app_id
        );
        self.get(ApiArea::BattlePasses, &path, &self.language_query())
            .await
    }

    pub async fn claim_battle_pass_level(
        &self,
        level_id: &str,
    ) -> Result<ActionResponse, QuestlineError> {
        let path = format!("/api/v1/battle-pass-levels/{level_id}/claim-reward");
        self.post(ApiArea::BattlePasses, &path, &json!({})).await
    }

    /// All leaderboards visible to the app.
    pub async fn leaderboards(&self) -> Result<Vec<Leaderboard>, QuestlineError> {
        self.get(ApiArea::Leaderboards, "/api/v1/leaderboards", &[])
            .await
    }

    /// One page of a leaderboard. Pages start at 1.
    pub async fn leaderboard_page(
        &self,
        leaderboard_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Leaderboard, QuestlineError> {
        let path = format!("/api/v1/leaderboards/{leaderboard_id}");
        let query = [
            ("currentPage", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        self.get(ApiArea::Leaderboards, &path, &query).await
    }

    /// Fetch the next page behind `cursor`, or `Ok(None)` once a short page
    /// has marked the leaderboard as fully loaded.
    pub async fn next_leaderboard_page(
        &self,
        leaderboard_id: &str,
        cursor: &mut PageCursor,
    ) -> Result<Option<Leaderboard>, QuestlineError> {
        let Some(page) = cursor.next_page() else {
            return Ok(None);
        };
        let board = self
            .leaderboard_page(leaderboard_id, page, cursor.page_size())
            .await?;
        cursor.record(board.grouped_by_users.len());
        Ok(Some(board))
    }

    /// The authenticated user's ranking on one leaderboard.
    pub async fn leaderboard_ranking(
        &self,
        leaderboard_id: &str,
    ) -> Result<LeaderboardRanking, QuestlineError> {
        let path = format!(
            "/api/v1/leaderboards/{leaderboard_id}/rankings/user/{}",
            self.settings.user_id
        );
        self.get(ApiArea::Leaderboards, &path, &[]).await
    }

    /// Send an ingestion event. This is the one trusted-backend call: it
    /// authenticates with the API key instead of the user's access token.
    pub async fn send_event(&self, event: &EventPayload) -> Result<(), QuestlineError> {
        let url = format!(
            "{}/api/v1/events",
            area_url(&self.settings, ApiArea::Events)
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(event)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(error_from(status.as_u16(), &body))
        }
    }
}
