//! Application state for the HTTP server.

use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::config::ClubConfig;
use crate::db::repository::FullRepository;
use crate::models::{Clock, ClubTimezone, SystemClock};
use crate::services::{build_system_prompt, AssistantError, AuthService, AvailabilityResolver, ChatProxy};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    pub resolver: Arc<AvailabilityResolver>,
    pub auth: Arc<AuthService>,
    pub assistant: Arc<ChatProxy>,
    /// Source of "now"; swapped for a fixed clock in tests
    pub clock: Arc<dyn Clock>,
    pub timezone: ClubTimezone,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        resolver: AvailabilityResolver,
        auth: AuthService,
        assistant: ChatProxy,
        timezone: ClubTimezone,
    ) -> Self {
        Self {
            repository,
            resolver: Arc::new(resolver),
            auth: Arc::new(auth),
            assistant: Arc::new(assistant),
            clock: Arc::new(SystemClock),
            timezone,
        }
    }

    /// Assemble the state from configuration around an existing repository.
    pub fn from_config(
        config: &ClubConfig,
        repository: Arc<dyn FullRepository>,
    ) -> Result<Self, AssistantError> {
        let resolver = config.resolver();
        let prompt = build_system_prompt(
            &config.assistant,
            resolver.grid(),
            resolver.policy(),
            &config.courts,
        );
        let assistant = ChatProxy::new(config.assistant.clone(), prompt)?;
        Ok(Self::new(
            repository,
            resolver,
            AuthService::new(config.auth.clone()),
            assistant,
            config.schedule.timezone(),
        ))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current club-local wall-clock time.
    pub fn now(&self) -> NaiveDateTime {
        self.timezone.local(self.clock.now())
    }
}
