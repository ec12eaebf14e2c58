//! Single-shot, tool-free message classification.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use super::label::RoutingLabel;
use crate::error::MuseError;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::types::{GenerationSettings, ModelMessage};

/// System prompt for classification.
pub const ROUTER_PROMPT: &str = "\
You are the router for Muse, an assistant that manages the business side of an independent musician's career.
Assign the user's message to exactly ONE category:

- CALENDAR: gigs, recording sessions, rehearsals, lessons, scheduling, availability, conflicts, bookings
- SOCIAL: social media posts, captions, content ideas, hashtags, promotion
- INVOICE: invoices, billing, payments, money owed, rates, income
- EMAIL: the inbox, reading or answering email, drafts, forwarding
- CRM: contacts, venues, studios, promoters, relationships, meeting notes, follow-ups
- GENERAL: greetings, questions about Muse itself, anything that fits none of the above

Reply with the category name only.";

/// Maps free text to a [`RoutingLabel`]. Stateless: nothing is retained
/// between calls.
#[derive(Clone)]
pub struct Classifier {
    provider: Arc<dyn ModelProvider>,
    max_tokens: u32,
}

impl Classifier {
    pub fn new(provider: Arc<dyn ModelProvider>, max_tokens: u32) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }

    /// Classify one message.
    ///
    /// Only model-service failures are returned as errors; any unexpected
    /// reply falls back to [`RoutingLabel::General`].
    pub async fn classify(&self, message: &str) -> Result<RoutingLabel, MuseError> {
        let request = ProviderRequest {
            system: Some(ROUTER_PROMPT.to_string()),
            messages: vec![ModelMessage::user(message)],
            settings: GenerationSettings::builder()
                .max_tokens(self.max_tokens)
                .build(),
            tools: None,
        };
        let response = self.provider.generate_text(&request).await?;
        let raw = response.text_segments().join("");
        let label = parse_label(&raw);
        debug!(raw = %raw.trim(), %label, "classified message");
        Ok(label)
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("provider", &self.provider.provider_name())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Parse a raw model reply. Anything that is not exactly one label, after
/// trimming and upper-casing, is `General`.
pub fn parse_label(raw: &str) -> RoutingLabel {
    let token = raw.trim().to_uppercase();
    match RoutingLabel::from_str(&token) {
        Ok(label) => label,
        Err(_) => {
            warn!(raw = %token, "unexpected routing label, defaulting to GENERAL");
            RoutingLabel::General
        }
    }
}
