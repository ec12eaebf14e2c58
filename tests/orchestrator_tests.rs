//! Routing, lazy agent construction and session isolation.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{settings, RuleProvider, ScriptedProvider};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use muse::config::MuseConfig;
use muse::domains::crm::{
    ContactRef, ContactSearch, ContactUpdate, CrmService, InteractionFilter, NewContact,
    NewInteraction,
};
use muse::domains::{Backends, Domain};
use muse::error::MuseError;
use muse::orchestrator::{AgentCatalog, Orchestrator, SessionManager, CAPABILITY_SUMMARY};
use muse::provider::{ModelProvider, ProviderResponse};
use muse::router::{Classifier, RoutingLabel, ROUTER_PROMPT};
use muse::types::ContentPart;

fn config() -> MuseConfig {
    MuseConfig {
        runtime: settings(5),
        ..MuseConfig::default()
    }
}

fn orchestrator(provider: Arc<ScriptedProvider>, backends: Backends) -> Orchestrator {
    let provider: Arc<dyn ModelProvider> = provider;
    let config = config();
    Orchestrator::with_catalog(
        Classifier::new(Arc::clone(&provider), config.classifier_max_tokens),
        AgentCatalog::new(provider, config.profile, config.runtime, backends)
            .with_today(NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()),
    )
}

#[tokio::test]
async fn unknown_label_falls_back_to_capability_summary() {
    let provider = ScriptedProvider::new().text("UNSURE");
    let mut muse = orchestrator(provider.clone(), Backends::default());

    let reply = muse.route("What can you help me with?").await.unwrap();

    assert_eq!(reply.label, RoutingLabel::General);
    assert_eq!(reply.text, CAPABILITY_SUMMARY);
    assert_eq!(provider.request_count(), 1);
    assert!(muse.catalog().constructed().is_empty());
}

#[tokio::test]
async fn classifier_request_is_tool_free_and_short() {
    let provider = ScriptedProvider::new().text("general");
    let mut muse = orchestrator(provider.clone(), Backends::default());
    muse.route("hey").await.unwrap();

    let request = &provider.requests()[0];
    assert_eq!(request.system.as_deref(), Some(ROUTER_PROMPT));
    assert!(request.tools.is_none());
    assert_eq!(request.settings.max_tokens, Some(20));
    assert_eq!(request.messages.len(), 1);
}

#[tokio::test]
async fn agents_are_built_lazily_and_reused() {
    let provider = ScriptedProvider::new()
        .text("CALENDAR")
        .text("You're free Saturday.")
        .text(" calendar \n")
        .text("Still free.");
    let mut muse = orchestrator(provider.clone(), Backends::default());
    assert!(!muse.catalog().is_constructed(Domain::Calendar));

    let first = muse.route("Am I free Saturday?").await.unwrap();
    assert_eq!(first.label, RoutingLabel::Calendar);
    assert_eq!(first.text, "You're free Saturday.");
    assert_eq!(muse.catalog().constructed(), vec![Domain::Calendar]);

    let second = muse.route("And now?").await.unwrap();
    assert_eq!(second.text, "Still free.");

    let calendar = muse.catalog().get(Domain::Calendar).unwrap();
    assert_eq!(calendar.identity().name, "CalendarAgent");
    assert!(calendar.identity().persona_prompt.contains("Friday, March 06, 2026"));
    assert_eq!(calendar.history().len(), 4);

    // The agent's second request saw the first exchange.
    assert_eq!(provider.requests()[3].messages.len(), 3);
}

#[tokio::test]
async fn reset_touches_only_constructed_agents() {
    let provider = ScriptedProvider::new().text("SOCIAL").text("Drafted.");
    let mut muse = orchestrator(provider, Backends::default());

    muse.reset();
    assert!(muse.catalog().constructed().is_empty());

    muse.route("Write a post about Friday").await.unwrap();
    assert_eq!(muse.catalog().get(Domain::Social).unwrap().history().len(), 2);

    muse.reset();
    assert_eq!(muse.catalog().constructed(), vec![Domain::Social]);
    assert!(muse.catalog().get(Domain::Social).unwrap().history().is_empty());
    assert!(!muse.catalog().is_constructed(Domain::Invoice));
}

#[tokio::test]
async fn disconnected_backend_surfaces_as_reply_text() {
    let provider = ScriptedProvider::new()
        .text("CRM")
        .tool_use(&[("c1", "get_contact", json!({"contact_id": "venue-1"}))])
        .text("I can't reach your contacts right now.");
    let mut muse = orchestrator(provider.clone(), Backends::default());

    let reply = muse.route("Who runs the Earl?").await.unwrap();
    assert_eq!(reply.label, RoutingLabel::Crm);
    assert_eq!(reply.text, "I can't reach your contacts right now.");

    let last = provider.requests()[2].messages.last().cloned().unwrap();
    match &last.content[0] {
        ContentPart::ToolResult(result) => {
            assert!(result.is_error);
            assert_eq!(result.content, "Error executing tool: CRM service is not connected");
        }
        other => panic!("expected a tool result, got {other:?}"),
    }
}

#[derive(Default)]
struct Contacts {
    lookups: Mutex<Vec<String>>,
}

#[async_trait]
impl CrmService for Contacts {
    async fn add_contact(&self, _contact: NewContact) -> Result<Value, MuseError> {
        Ok(json!({"status": "created"}))
    }
    async fn search_contacts(&self, _search: ContactSearch) -> Result<Value, MuseError> {
        Ok(json!([]))
    }
    async fn get_contact(&self, contact: ContactRef) -> Result<Value, MuseError> {
        self.lookups.lock().unwrap().push(contact.contact_id.clone());
        Ok(json!({"id": contact.contact_id, "contact_person": "Dana", "typical_rate": "$400"}))
    }
    async fn update_contact(&self, _update: ContactUpdate) -> Result<Value, MuseError> {
        Ok(json!({"status": "updated"}))
    }
    async fn add_interaction(&self, _interaction: NewInteraction) -> Result<Value, MuseError> {
        Ok(json!({"status": "logged"}))
    }
    async fn list_interactions(&self, _filter: InteractionFilter) -> Result<Value, MuseError> {
        Ok(json!([]))
    }
    async fn get_contact_summary(&self, contact: ContactRef) -> Result<Value, MuseError> {
        Ok(json!({"id": contact.contact_id}))
    }
}

#[tokio::test]
async fn connected_backend_results_reach_the_model() {
    let contacts = Arc::new(Contacts::default());
    let provider = ScriptedProvider::new()
        .text("CRM")
        .tool_use(&[("c1", "get_contact", json!({"contact_id": "venue-1"}))])
        .text("Dana books the Earl and usually pays $400.");
    let mut muse = orchestrator(provider.clone(), Backends::default().with_crm(contacts.clone()));

    let reply = muse.route("Who runs the Earl?").await.unwrap();
    assert_eq!(reply.text, "Dana books the Earl and usually pays $400.");
    assert_eq!(*contacts.lookups.lock().unwrap(), vec!["venue-1".to_string()]);

    let last = provider.requests()[2].messages.last().cloned().unwrap();
    match &last.content[0] {
        ContentPart::ToolResult(result) => {
            assert!(!result.is_error);
            assert!(result.content.contains("Dana"));
        }
        other => panic!("expected a tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn classifier_failure_propagates() {
    let provider = ScriptedProvider::new().error(MuseError::Authentication("bad key".into()));
    let mut muse = orchestrator(provider, Backends::default());

    let err = muse.route("hello").await.unwrap_err();
    assert!(matches!(err, MuseError::Authentication(_)));
}

fn echo_turns() -> Arc<RuleProvider> {
    RuleProvider::new(|request| {
        if request.system.as_deref() == Some(ROUTER_PROMPT) {
            ProviderResponse::text("EMAIL")
        } else {
            ProviderResponse::text(format!("turns={}", request.messages.len()))
        }
    })
}

#[tokio::test]
async fn sessions_do_not_share_history() {
    let provider = echo_turns();
    let sessions = SessionManager::new(move || {
        let provider: Arc<dyn ModelProvider> = provider.clone();
        Ok(Orchestrator::new(provider, &config(), Backends::default()))
    });

    assert_eq!(sessions.route("alice", "any mail?").await.unwrap().text, "turns=1");
    assert_eq!(sessions.route("alice", "and now?").await.unwrap().text, "turns=3");
    assert_eq!(sessions.route("bob", "any mail?").await.unwrap().text, "turns=1");
    assert_eq!(sessions.session_ids().await, vec!["alice", "bob"]);

    assert!(sessions.reset("alice").await);
    assert_eq!(sessions.route("alice", "fresh").await.unwrap().text, "turns=1");
    assert_eq!(sessions.route("bob", "again").await.unwrap().text, "turns=3");

    assert!(!sessions.reset("carol").await);
    assert!(sessions.remove("bob").await);
    assert_eq!(sessions.session_ids().await, vec!["alice"]);
}

#[tokio::test]
async fn sessions_run_concurrently() {
    let provider = echo_turns();
    let sessions = Arc::new(SessionManager::new(move || {
        let provider: Arc<dyn ModelProvider> = provider.clone();
        Ok(Orchestrator::new(provider, &config(), Backends::default()))
    }));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let sessions = Arc::clone(&sessions);
            tokio::spawn(async move { sessions.route(&format!("user-{i}"), "inbox?").await })
        })
        .collect();
    for handle in handles {
        let reply = handle.await.unwrap().unwrap();
        assert_eq!(reply.label, RoutingLabel::Email);
        assert_eq!(reply.text, "turns=1");
    }
    assert_eq!(sessions.session_ids().await.len(), 8);
}
