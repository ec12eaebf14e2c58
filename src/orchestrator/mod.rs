//! Routes each user message to the agent that owns its domain.

mod catalog;
mod session;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::MuseConfig;
use crate::domains::Backends;
use crate::error::MuseError;
use crate::provider::{create_provider, ModelProvider};
use crate::router::{Classifier, RoutingLabel};

pub use crate::domains::Domain;
pub use catalog::AgentCatalog;
pub use session::SessionManager;

/// Reply for messages that belong to no domain.
pub const CAPABILITY_SUMMARY: &str = "\
Hey! I'm Muse, the business side of your music career. I can help with:

- Calendar: schedule gigs, sessions, rehearsals and lessons, check availability and conflicts
- Email: triage the inbox, draft replies, pull gig details out of booking emails
- Invoicing: create invoices, generate PDFs, track payments and income
- Social: draft posts in your voice, manage drafts, suggest hashtags
- CRM: keep venue and studio contacts, log meeting notes, track relationships

What can I help you with?";

/// The outcome of routing one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub label: RoutingLabel,
    pub text: String,
}

/// Classifier plus the lazily built domain agents of one session.
#[derive(Debug)]
pub struct Orchestrator {
    classifier: Classifier,
    catalog: AgentCatalog,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ModelProvider>, config: &MuseConfig, backends: Backends) -> Self {
        Self::with_catalog(
            Classifier::new(Arc::clone(&provider), config.classifier_max_tokens),
            AgentCatalog::new(provider, config.profile.clone(), config.runtime.clone(), backends),
        )
    }

    pub fn with_catalog(classifier: Classifier, catalog: AgentCatalog) -> Self {
        Self {
            classifier,
            catalog,
        }
    }

    /// Build the model provider from `config` and wire it up.
    pub fn from_config(config: &MuseConfig, backends: Backends) -> Result<Self, MuseError> {
        let provider = create_provider(config)?;
        Ok(Self::new(provider, config, backends))
    }

    /// Classify `message` and hand it to the owning agent.
    ///
    /// Tool faults never surface here; only model-service failures do.
    pub async fn route(&mut self, message: &str) -> Result<RouteResponse, MuseError> {
        let label = self.classifier.classify(message).await?;
        info!(%label, "routed message");

        let Some(domain) = label.domain() else {
            return Ok(RouteResponse {
                label,
                text: Self::capability_summary().to_string(),
            });
        };

        let agent = self.catalog.get_or_create(domain)?;
        let text = agent.run(message).await?;
        Ok(RouteResponse { label, text })
    }

    /// Clear history of every agent built so far.
    pub fn reset(&mut self) {
        info!(agents = ?self.catalog.constructed(), "resetting session");
        self.catalog.reset_all();
    }

    pub fn capability_summary() -> &'static str {
        CAPABILITY_SUMMARY
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }
}
