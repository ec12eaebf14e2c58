//! The five domain agents: persona prompts, tool schemas and the service
//! traits their tools call into.
//!
//! Storage and external APIs live behind the service traits. A domain whose
//! backend is not wired up still advertises its tools; calling one yields a
//! tool fault the model can explain to the user.

pub mod calendar;
pub mod crm;
pub mod email;
pub mod invoice;
pub mod social;

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter};

use crate::agent::AgentIdentity;
use crate::config::ArtistProfile;
use crate::error::MuseError;
use crate::tools::{AgentTool, AgentToolParameters, ToolRegistry};

pub use calendar::CalendarService;
pub use crm::CrmService;
pub use email::EmailService;
pub use invoice::InvoiceService;
pub use social::SocialService;

/// A domain with a dedicated agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum Domain {
    Calendar,
    Email,
    Invoice,
    Social,
    #[strum(serialize = "CRM")]
    Crm,
}

impl Domain {
    /// Agent name used in logs and identities.
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::Calendar => calendar::AGENT_NAME,
            Self::Email => email::AGENT_NAME,
            Self::Invoice => invoice::AGENT_NAME,
            Self::Social => social::AGENT_NAME,
            Self::Crm => crm::AGENT_NAME,
        }
    }
}

/// Service implementations handed to the agents. `None` means not connected.
#[derive(Clone, Default)]
pub struct Backends {
    pub calendar: Option<Arc<dyn CalendarService>>,
    pub email: Option<Arc<dyn EmailService>>,
    pub invoice: Option<Arc<dyn InvoiceService>>,
    pub social: Option<Arc<dyn SocialService>>,
    pub crm: Option<Arc<dyn CrmService>>,
}

impl Backends {
    pub fn with_calendar(mut self, service: Arc<dyn CalendarService>) -> Self {
        self.calendar = Some(service);
        self
    }

    pub fn with_email(mut self, service: Arc<dyn EmailService>) -> Self {
        self.email = Some(service);
        self
    }

    pub fn with_invoice(mut self, service: Arc<dyn InvoiceService>) -> Self {
        self.invoice = Some(service);
        self
    }

    pub fn with_social(mut self, service: Arc<dyn SocialService>) -> Self {
        self.social = Some(service);
        self
    }

    pub fn with_crm(mut self, service: Arc<dyn CrmService>) -> Self {
        self.crm = Some(service);
        self
    }

    pub fn is_connected(&self, domain: Domain) -> bool {
        match domain {
            Domain::Calendar => self.calendar.is_some(),
            Domain::Email => self.email.is_some(),
            Domain::Invoice => self.invoice.is_some(),
            Domain::Social => self.social.is_some(),
            Domain::Crm => self.crm.is_some(),
        }
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends")
            .field("calendar", &self.calendar.is_some())
            .field("email", &self.email.is_some())
            .field("invoice", &self.invoice.is_some())
            .field("social", &self.social.is_some())
            .field("crm", &self.crm.is_some())
            .finish()
    }
}

/// Identity and tools for one domain agent.
pub fn build_agent(
    domain: Domain,
    profile: &ArtistProfile,
    backends: &Backends,
    today: NaiveDate,
) -> Result<(AgentIdentity, ToolRegistry), MuseError> {
    let (prompt, tools) = match domain {
        Domain::Calendar => (
            calendar::persona_prompt(profile, today),
            calendar::tools(backends.calendar.clone())?,
        ),
        Domain::Email => (
            email::persona_prompt(profile, today),
            email::tools(backends.email.clone())?,
        ),
        Domain::Invoice => (
            invoice::persona_prompt(profile, today),
            invoice::tools_with_terms(backends.invoice.clone(), profile.payment_terms.clone())?,
        ),
        Domain::Social => (
            social::persona_prompt(profile, today),
            social::tools_with_platform(backends.social.clone(), profile.social_platform.clone())?,
        ),
        Domain::Crm => (
            crm::persona_prompt(profile, today),
            crm::tools(backends.crm.clone())?,
        ),
    };
    Ok((AgentIdentity::new(domain.agent_name(), prompt), tools))
}

/// Human-readable date used in persona prompts.
pub(crate) fn prompt_date(today: NaiveDate) -> String {
    today.format("%A, %B %d, %Y").to_string()
}

/// A typed tool that forwards to a (possibly missing) service.
pub(crate) fn service_tool<S, I, F, Fut>(
    service: &Option<Arc<S>>,
    domain: Domain,
    name: &'static str,
    description: &'static str,
    parameters: AgentToolParameters,
    call: F,
) -> AgentTool
where
    S: ?Sized + Send + Sync + 'static,
    I: DeserializeOwned + Send + 'static,
    F: Fn(Arc<S>, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, MuseError>> + Send + 'static,
{
    let service = service.clone();
    let call = Arc::new(call);
    AgentTool::typed(name, description, parameters, move |input: I, _ctx| {
        let service = service.clone();
        let call = Arc::clone(&call);
        async move {
            let service = service
                .ok_or_else(|| MuseError::Unavailable(format!("{domain} service is not connected")))?;
            call(service, input).await
        }
    })
}

/// Build a registry from tools in advertised order.
pub(crate) fn registry(tools: Vec<AgentTool>) -> Result<ToolRegistry, MuseError> {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(Arc::new(tool))?;
    }
    Ok(registry)
}
