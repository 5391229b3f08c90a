use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::ApiFacade;
use crate::api::models::{
    ActionResponse, BattlePass, BattlePassLevel, Challenge, ChallengeCategory, EventPayload,
    Leaderboard, LeaderboardRanking,
};
use crate::api::paging::PageCursor;
use crate::config::Settings;
use crate::registry::{HandlerId, MonitorId, NotificationHandler, NotificationRegistry};
use crate::transport::{LinkEvent, LinkHandle, LinkState, run_realtime_link};
use crate::utils::error::QuestlineError;

/// Shared slot holding the current facade; swapped when the credential is
/// regenerated (language change), leaving in-flight requests untouched.
type SharedFacade = Arc<Mutex<Arc<ApiFacade>>>;

/// The process-wide gamification client.
///
/// Constructed once at startup via [`QuestlineClient::connect`], injected into
/// consumers, and torn down with [`QuestlineClient::shutdown`]. Owns the
/// authenticated API facade, the notification registry and the background
/// task driving the realtime link.
pub struct QuestlineClient {
    settings: Settings,
    api: SharedFacade,
    registry: Arc<Mutex<NotificationRegistry>>,
    link: LinkHandle,
    link_task: JoinHandle<()>,
    event_task: JoinHandle<()>,
}

impl QuestlineClient {
    /// Generate the access credential and bring up the realtime link.
    ///
    /// A rejected credential fails construction; nothing is spawned in that
    /// case. The link itself connects in the background and keeps retrying,
    /// so a broker outage does not block startup.
    pub async fn connect(settings: Settings) -> Result<Self, QuestlineError> {
        let facade = Arc::new(ApiFacade::authenticate(settings.api.clone()).await?);
        let api: SharedFacade = Arc::new(Mutex::new(facade));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(LinkState::Disconnected));
        let link = LinkHandle::new(command_tx, state.clone());
        let registry = Arc::new(Mutex::new(NotificationRegistry::new(Box::new(link.clone()))));

        let link_task = tokio::spawn(run_realtime_link(
            settings.realtime_endpoint(),
            settings.realtime.clone(),
            registry.clone(),
            state,
            command_rx,
            event_tx,
        ));
        let event_task = tokio::spawn(drive_link_events(event_rx, registry.clone(), api.clone()));

        info!(user = %settings.api.user_id, "gamification client ready");
        Ok(Self {
            settings,
            api,
            registry,
            link,
            link_task,
            event_task,
        })
    }

    fn current_api(&self) -> Arc<ApiFacade> {
        self.api.lock().unwrap().clone()
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Regenerate the credential with a new content language and swap the
    /// facade. Calls already in flight finish against the old instance.
    pub async fn set_language(&self, language: &str) -> Result<(), QuestlineError> {
        let mut api_settings = self.settings.api.clone();
        api_settings.language = language.to_string();
        let facade = Arc::new(ApiFacade::authenticate(api_settings).await?);
        *self.api.lock().unwrap() = facade;
        info!(%language, "facade replaced for new language");
        Ok(())
    }

    fn start_monitor(&self, id: MonitorId, handler: NotificationHandler) -> HandlerId {
        let (handler_id, needs_fetch) = self.registry.lock().unwrap().start(id.clone(), handler);
        if needs_fetch {
            tokio::spawn(resolve_topic(
                self.current_api(),
                self.registry.clone(),
                id,
            ));
        }
        handler_id
    }

    fn challenges_monitor(&self) -> MonitorId {
        MonitorId::Challenges(self.settings.api.user_id.clone())
    }

    /// Receive push updates for the user's personal challenges.
    pub fn start_challenge_notifications(
        &self,
        handler: impl Fn(&Value) + Send + 'static,
    ) -> HandlerId {
        self.start_monitor(self.challenges_monitor(), Box::new(handler))
    }

    pub fn stop_challenge_notifications(&self, handler_id: &HandlerId) -> bool {
        self.registry
            .lock()
            .unwrap()
            .stop(&self.challenges_monitor(), handler_id)
    }

    /// Receive push updates for one battle pass.
    pub fn start_battle_pass_notifications(
        &self,
        battle_pass_id: &str,
        handler: impl Fn(&Value) + Send + 'static,
    ) -> HandlerId {
        self.start_monitor(
            MonitorId::BattlePass(battle_pass_id.to_string()),
            Box::new(handler),
        )
    }

    pub fn stop_battle_pass_notifications(
        &self,
        battle_pass_id: &str,
        handler_id: &HandlerId,
    ) -> bool {
        self.registry.lock().unwrap().stop(
            &MonitorId::BattlePass(battle_pass_id.to_string()),
            handler_id,
        )
    }

    /// Receive push updates for one leaderboard.
    pub fn start_leaderboard_notifications(
        &self,
        leaderboard_id: &str,
        handler: impl Fn(&Value) + Send + 'static,
    ) -> HandlerId {
        self.start_monitor(
            MonitorId::Leaderboard(leaderboard_id.to_string()),
            Box::new(handler),
        )
    }

    pub fn stop_leaderboard_notifications(
        &self,
        leaderboard_id: &str,
        handler_id: &HandlerId,
    ) -> bool {
        self.registry.lock().unwrap().stop(
            &MonitorId::Leaderboard(leaderboard_id.to_string()),
            handler_id,
        )
    }

    pub async fn personal_challenges(&self) -> Result<Vec<ChallengeCategory>, QuestlineError> {
        self.current_api().personal_challenges().await
    }

    pub async fn challenge(&self, challenge_id: &str) -> Result<Challenge, QuestlineError> {
        self.current_api().challenge(challenge_id).await
    }

    pub async fn unlock_challenge(&self, challenge_id: &str) -> Result<Challenge, QuestlineError> {
        self.current_api().unlock_challenge(challenge_id).await
    }

    pub async fn activate_challenge(
        &self,
        challenge_id: &str,
    ) -> Result<Challenge, QuestlineError> {
        self.current_api().activate_challenge(challenge_id).await
    }

    pub async fn claim_challenge_reward(
        &self,
        challenge_id: &str,
    ) -> Result<Challenge, QuestlineError> {
        self.current_api().claim_challenge_reward(challenge_id).await
    }

    pub async fn cancel_challenge(&self, challenge_id: &str) -> Result<Challenge, QuestlineError> {
        self.current_api().cancel_challenge(challenge_id).await
    }

    pub async fn battle_passes(&self) -> Result<Vec<BattlePass>, QuestlineError> {
        self.current_api().battle_passes().await
    }

    pub async fn battle_pass(&self, battle_pass_id: &str) -> Result<BattlePass, QuestlineError> {
        self.current_api().battle_pass(battle_pass_id).await
    }

    pub async fn unlock_battle_pass(
        &self,
        battle_pass_id: &str,
    ) -> Result<BattlePass, QuestlineError> {
        self.current_api().unlock_battle_pass(battle_pass_id).await
    }

    pub async fn battle_pass_levels(
        &self,
        battle_pass_id: &str,
    ) -> Result<Vec<BattlePassLevel>, QuestlineError> {
        self.current_api().battle_pass_levels(battle_pass_id).await
    }

    pub async fn claim_battle_pass_level(
        &self,
        level_id: &str,
    ) -> Result<ActionResponse, QuestlineError> {
        self.current_api().claim_battle_pass_level(level_id).await
    }

    pub async fn leaderboards(&self) -> Result<Vec<Leaderboard>, QuestlineError> {
        self.current_api().leaderboards().await
    }

    pub async fn leaderboard_page(
        &self,
        leaderboard_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Leaderboard, QuestlineError> {
        self.current_api()
            .leaderboard_page(leaderboard_id, page, page_size)
            .await
    }

    pub async fn next_leaderboard_page(
        &self,
        leaderboard_id: &str,
        cursor: &mut PageCursor,
    ) -> Result<Option<Leaderboard>, QuestlineError> {
        self.current_api()
            .next_leaderboard_page(leaderboard_id, cursor)
            .await
    }

    pub async fn leaderboard_ranking(
        &self,
        leaderboard_id: &str,
    ) -> Result<LeaderboardRanking, QuestlineError> {
        self.current_api().leaderboard_ranking(leaderboard_id).await
    }

    pub async fn send_event(&self, event: &EventPayload) -> Result<(), QuestlineError> {
        self.current_api().send_event(event).await
    }

    /// Detach every handler, close the realtime link and join the background
    /// tasks.
    pub async fn shutdown(self) {
        self.registry.lock().unwrap().clear();
        self.link.shutdown();
        if let Err(e) = self.link_task.await {
            warn!(error = %e, "realtime link task aborted");
        }
        if let Err(e) = self.event_task.await {
            warn!(error = %e, "link event task aborted");
        }
        info!("gamification client stopped");
    }
}

/// React to link events: every (re)connect hands back the monitors whose
/// topic lookup never completed, each of which gets a fresh lookup.
async fn drive_link_events(
    mut events: UnboundedReceiver<LinkEvent>,
    registry: Arc<Mutex<NotificationRegistry>>,
    api: SharedFacade,
) {
    while let Some(event) = events.recv().await {
        match event {
            LinkEvent::Connected { pending_topics } => {
                for id in pending_topics {
                    let facade = api.lock().unwrap().clone();
                    tokio::spawn(resolve_topic(facade, registry.clone(), id));
                }
            }
        }
    }
}

/// Look up the broker topic for one monitor and record the result.
async fn resolve_topic(
    api: Arc<ApiFacade>,
    registry: Arc<Mutex<NotificationRegistry>>,
    id: MonitorId,
) {
    match api.notification_topic(&id).await {
        Ok(topic) => registry.lock().unwrap().complete_topic_fetch(&id, topic),
        Err(e) => {
            warn!(monitor = %id, error = %e, "notification topic lookup failed");
            registry.lock().unwrap().abort_topic_fetch(&id);
        }
    }
}
