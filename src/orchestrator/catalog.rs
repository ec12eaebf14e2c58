//! Lazily constructed domain agents.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::agent::AgentRuntime;
use crate::config::{ArtistProfile, RuntimeSettings};
use crate::domains::{build_agent, Backends, Domain};
use crate::error::MuseError;
use crate::provider::ModelProvider;

/// Owns at most one [`AgentRuntime`] per domain. An agent is built the first
/// time its domain is requested and reused afterwards, history included.
pub struct AgentCatalog {
    provider: Arc<dyn ModelProvider>,
    profile: ArtistProfile,
    settings: RuntimeSettings,
    backends: Backends,
    today: Option<NaiveDate>,
    agents: HashMap<Domain, AgentRuntime>,
}

impl AgentCatalog {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        profile: ArtistProfile,
        settings: RuntimeSettings,
        backends: Backends,
    ) -> Self {
        Self {
            provider,
            profile,
            settings,
            backends,
            today: None,
            agents: HashMap::new(),
        }
    }

    /// Render persona prompts with a fixed date instead of the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn get_or_create(&mut self, domain: Domain) -> Result<&mut AgentRuntime, MuseError> {
        if !self.agents.contains_key(&domain) {
            let today = self.today.unwrap_or_else(|| Local::now().date_naive());
            let (identity, tools) = build_agent(domain, &self.profile, &self.backends, today)?;
            info!(
                agent = %identity.name,
                tools = tools.len(),
                connected = self.backends.is_connected(domain),
                "constructing agent"
            );
            let runtime = AgentRuntime::new(
                identity,
                tools,
                Arc::clone(&self.provider),
                self.settings.clone(),
            );
            self.agents.insert(domain, runtime);
        }
        self.agents
            .get_mut(&domain)
            .ok_or_else(|| MuseError::InvalidState(format!("{domain} agent missing after construction")))
    }

    pub fn get(&self, domain: Domain) -> Option<&AgentRuntime> {
        self.agents.get(&domain)
    }

    pub fn is_constructed(&self, domain: Domain) -> bool {
        self.agents.contains_key(&domain)
    }

    /// Domains whose agent has been built so far.
    pub fn constructed(&self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self.agents.keys().copied().collect();
        domains.sort_by_key(|domain| domain.agent_name());
        domains
    }

    /// Reset history on every constructed agent. Never constructs one.
    pub fn reset_all(&mut self) {
        for (domain, agent) in &mut self.agents {
            debug!(%domain, "resetting agent");
            agent.reset();
        }
    }

    pub fn profile(&self) -> &ArtistProfile {
        &self.profile
    }
}

impl std::fmt::Debug for AgentCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCatalog")
            .field("provider", &self.provider.provider_name())
            .field("backends", &self.backends)
            .field("constructed", &self.constructed())
            .finish()
    }
}
