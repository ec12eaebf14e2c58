//! CRM agent: venues, studios, promoters and the history with each.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, VariantNames};

use super::{prompt_date, registry, service_tool, Domain};
use crate::config::ArtistProfile;
use crate::error::MuseError;
use crate::tools::{AgentToolParameters, ToolRegistry};

pub const AGENT_NAME: &str = "CRMAgent";

/// Contact fields `update_contact` may change.
pub const UPDATABLE_FIELDS: &[&str] = &[
    "organization_name",
    "contact_person",
    "email",
    "phone",
    "role",
    "tags",
    "notes",
    "typical_rate",
    "payment_terms",
    "preferred_payment",
    "relationship_status",
    "last_invoice_id",
    "upcoming_event_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactRole {
    Venue,
    Studio,
    Promoter,
    Label,
    Manager,
    Collaborator,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    Active,
    Inactive,
    Prospect,
    Past,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InteractionType {
    Meeting,
    Call,
    EmailNote,
    SessionNote,
    #[default]
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContact {
    pub organization_name: String,
    pub role: ContactRole,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub typical_rate: String,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub preferred_payment: String,
    #[serde(default)]
    pub relationship_status: RelationshipStatus,
    #[serde(default)]
    pub first_contact_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactSearch {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub role: Option<ContactRole>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub relationship_status: Option<RelationshipStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRef {
    pub contact_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactUpdate {
    pub contact_id: String,
    pub updates: Map<String, Value>,
}

impl ContactUpdate {
    /// Drop fields outside [`UPDATABLE_FIELDS`]; returns the dropped names.
    pub fn retain_allowed(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();
        self.updates.retain(|key, _| {
            let keep = UPDATABLE_FIELDS.contains(&key.as_str());
            if !keep {
                dropped.push(key.clone());
            }
            keep
        });
        dropped
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInteraction {
    pub contact_id: String,
    pub content: String,
    #[serde(default)]
    pub interaction_type: InteractionType,
    #[serde(default)]
    pub interaction_date: Option<String>,
    #[serde(default)]
    pub follow_up_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionFilter {
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub interaction_type: Option<InteractionType>,
}

/// Contact book and interaction log.
#[async_trait]
pub trait CrmService: Send + Sync {
    async fn add_contact(&self, contact: NewContact) -> Result<Value, MuseError>;
    async fn search_contacts(&self, search: ContactSearch) -> Result<Value, MuseError>;
    /// Full profile including the most recent interactions.
    async fn get_contact(&self, contact: ContactRef) -> Result<Value, MuseError>;
    async fn update_contact(&self, update: ContactUpdate) -> Result<Value, MuseError>;
    async fn add_interaction(&self, interaction: NewInteraction) -> Result<Value, MuseError>;
    async fn list_interactions(&self, filter: InteractionFilter) -> Result<Value, MuseError>;
    /// Relationship overview: gig count, income, last contact, follow-ups.
    async fn get_contact_summary(&self, contact: ContactRef) -> Result<Value, MuseError>;
}

pub fn persona_prompt(profile: &ArtistProfile, today: NaiveDate) -> String {
    format!(
        "You are the CRM Agent for Muse, the assistant that runs the business side of {artist}'s music career.

You keep track of the people {artist} works with: venues, studios, promoters, labels, managers and collaborators.
For each contact you know who to talk to, what they usually pay, how they pay and what happened last time.

Rules:
1. Search before adding so the same venue is not entered twice.
2. Log meetings, calls and session notes with add_interaction, including any follow-up date.
3. When asked about a relationship, use get_contact_summary and lead with what matters for the next booking.
4. Rates are free text (\"$400 guarantee\", \"door split 70/30\"); record them as the artist says them.

Today is {today}. Keep it brief.",
        artist = profile.artist_name,
        today = prompt_date(today),
    )
}

pub fn tools(service: Option<Arc<dyn CrmService>>) -> Result<ToolRegistry, MuseError> {
    let domain = Domain::Crm;
    registry(vec![
        service_tool(
            &service,
            domain,
            "add_contact",
            "Add a venue, studio, promoter or other industry contact.",
            AgentToolParameters::object()
                .string("organization_name", "Venue, studio or company name", true)
                .string_enum("role", "What they are to the artist", ContactRole::VARIANTS, true)
                .string("contact_person", "Person to talk to", false)
                .string("email", "Email address", false)
                .string("phone", "Phone number", false)
                .string_array("tags", "Tags, e.g. 'jazz', 'all-ages'", false)
                .string("notes", "Free-form notes", false)
                .string("typical_rate", "What they usually pay, e.g. '$400 guarantee'", false)
                .string("payment_terms", "e.g. 'cash night of'", false)
                .string("preferred_payment", "e.g. 'Venmo'", false)
                .string_enum(
                    "relationship_status",
                    "Default: active",
                    RelationshipStatus::VARIANTS,
                    false,
                )
                .string("first_contact_date", "YYYY-MM-DD. Defaults to today", false)
                .build(),
            |svc: Arc<dyn CrmService>, input: NewContact| async move { svc.add_contact(input).await },
        ),
        service_tool(
            &service,
            domain,
            "search_contacts",
            "Search contacts by name or email, optionally filtered by role, tag or status.",
            AgentToolParameters::object()
                .string("query", "Matches organization, person or email", false)
                .string_enum("role", "Only this role", ContactRole::VARIANTS, false)
                .string("tag", "Only contacts with this tag", false)
                .string_enum(
                    "relationship_status",
                    "Only this status",
                    RelationshipStatus::VARIANTS,
                    false,
                )
                .build(),
            |svc: Arc<dyn CrmService>, input: ContactSearch| async move { svc.search_contacts(input).await },
        ),
        service_tool(
            &service,
            domain,
            "get_contact",
            "Full contact profile with recent interactions.",
            AgentToolParameters::object()
                .string("contact_id", "Contact id", true)
                .build(),
            |svc: Arc<dyn CrmService>, input: ContactRef| async move { svc.get_contact(input).await },
        ),
        service_tool(
            &service,
            domain,
            "update_contact",
            "Change contact fields such as rate, status, tags or notes.",
            AgentToolParameters::object()
                .string("contact_id", "Contact id", true)
                .object("updates", "Fields to change", true)
                .build(),
            |svc: Arc<dyn CrmService>, mut input: ContactUpdate| async move {
                let dropped = input.retain_allowed();
                if input.updates.is_empty() {
                    return Err(MuseError::InvalidArgument(format!(
                        "no updatable fields in update (ignored: {})",
                        dropped.join(", ")
                    )));
                }
                if !dropped.is_empty() {
                    tracing::debug!(contact = %input.contact_id, ?dropped, "ignoring non-updatable contact fields");
                }
                svc.update_contact(input).await
            },
        ),
        service_tool(
            &service,
            domain,
            "add_interaction",
            "Log a meeting, call, email or session note against a contact.",
            AgentToolParameters::object()
                .string("contact_id", "Contact id", true)
                .string("content", "What happened", true)
                .string_enum(
                    "interaction_type",
                    "Kind of interaction. Default: general",
                    InteractionType::VARIANTS,
                    false,
                )
                .string("interaction_date", "YYYY-MM-DD. Defaults to today", false)
                .string("follow_up_date", "YYYY-MM-DD to follow up", false)
                .build(),
            |svc: Arc<dyn CrmService>, input: NewInteraction| async move { svc.add_interaction(input).await },
        ),
        service_tool(
            &service,
            domain,
            "list_interactions",
            "List logged interactions, newest first.",
            AgentToolParameters::object()
                .string("contact_id", "Only this contact", false)
                .string("start_date", "Range start, YYYY-MM-DD", false)
                .string("end_date", "Range end, YYYY-MM-DD", false)
                .string_enum("interaction_type", "Only this kind", InteractionType::VARIANTS, false)
                .build(),
            |svc: Arc<dyn CrmService>, input: InteractionFilter| async move {
                svc.list_interactions(input).await
            },
        ),
        service_tool(
            &service,
            domain,
            "get_contact_summary",
            "Relationship overview: gigs, income, last contact and pending follow-ups.",
            AgentToolParameters::object()
                .string("contact_id", "Contact id", true)
                .build(),
            |svc: Arc<dyn CrmService>, input: ContactRef| async move {
                svc.get_contact_summary(input).await
            },
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentToolCall;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Rolodex {
        contacts: Mutex<Vec<NewContact>>,
        updates: Mutex<Vec<ContactUpdate>>,
        interactions: Mutex<Vec<NewInteraction>>,
    }

    #[async_trait]
    impl CrmService for Rolodex {
        async fn add_contact(&self, contact: NewContact) -> Result<Value, MuseError> {
            let name = contact.organization_name.clone();
            self.contacts.lock().unwrap().push(contact);
            Ok(json!({"status": "created", "organization_name": name}))
        }
        async fn search_contacts(&self, _search: ContactSearch) -> Result<Value, MuseError> {
            Ok(json!([]))
        }
        async fn get_contact(&self, contact: ContactRef) -> Result<Value, MuseError> {
            Ok(json!({"id": contact.contact_id}))
        }
        async fn update_contact(&self, update: ContactUpdate) -> Result<Value, MuseError> {
            self.updates.lock().unwrap().push(update);
            Ok(json!({"status": "updated"}))
        }
        async fn add_interaction(&self, interaction: NewInteraction) -> Result<Value, MuseError> {
            self.interactions.lock().unwrap().push(interaction);
            Ok(json!({"status": "logged"}))
        }
        async fn list_interactions(&self, _filter: InteractionFilter) -> Result<Value, MuseError> {
            Ok(json!([]))
        }
        async fn get_contact_summary(&self, contact: ContactRef) -> Result<Value, MuseError> {
            Ok(json!({"id": contact.contact_id, "total_gigs": 3}))
        }
    }

    fn call(name: &str, arguments: Value) -> AgentToolCall {
        AgentToolCall {
            id: "k1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[tokio::test]
    async fn contact_and_interaction_defaults() {
        let rolodex = Arc::new(Rolodex::default());
        let tools = tools(Some(rolodex.clone())).unwrap();
        tools
            .dispatch(
                &call("add_contact", json!({"organization_name": "The Earl", "role": "venue"})),
                AGENT_NAME,
            )
            .await;
        tools
            .dispatch(
                &call("add_interaction", json!({"contact_id": "c1", "content": "Talked March dates"})),
                AGENT_NAME,
            )
            .await;

        let contacts = rolodex.contacts.lock().unwrap();
        assert_eq!(contacts[0].role, ContactRole::Venue);
        assert_eq!(contacts[0].relationship_status, RelationshipStatus::Active);
        assert!(contacts[0].tags.is_empty());
        assert_eq!(
            rolodex.interactions.lock().unwrap()[0].interaction_type,
            InteractionType::General
        );
    }

    #[tokio::test]
    async fn role_is_required() {
        let tools = tools(Some(Arc::new(Rolodex::default()))).unwrap();
        let result = tools
            .dispatch(&call("add_contact", json!({"organization_name": "The Earl"})), AGENT_NAME)
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("missing required field 'role'"));
    }

    #[tokio::test]
    async fn update_drops_unknown_fields() {
        let rolodex = Arc::new(Rolodex::default());
        let tools = tools(Some(rolodex.clone())).unwrap();
        let result = tools
            .dispatch(
                &call(
                    "update_contact",
                    json!({"contact_id": "c1", "updates": {"typical_rate": "$500", "id": "hijack"}}),
                ),
                AGENT_NAME,
            )
            .await;
        assert!(!result.is_error, "{}", result.content);

        let updates = rolodex.updates.lock().unwrap();
        assert_eq!(updates[0].updates.len(), 1);
        assert!(updates[0].updates.contains_key("typical_rate"));
    }

    #[tokio::test]
    async fn update_without_allowed_fields_is_a_fault() {
        let rolodex = Arc::new(Rolodex::default());
        let tools = tools(Some(rolodex.clone())).unwrap();
        let result = tools
            .dispatch(
                &call("update_contact", json!({"contact_id": "c1", "updates": {"id": "x"}})),
                AGENT_NAME,
            )
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("no updatable fields"));
        assert!(rolodex.updates.lock().unwrap().is_empty());
    }

    #[test]
    fn interaction_type_values() {
        assert_eq!(
            InteractionType::VARIANTS,
            &["meeting", "call", "email_note", "session_note", "general"]
        );
    }
}
