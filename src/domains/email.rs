//! Email agent: inbox triage, drafts and booking-detail extraction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, VariantNames};

use super::{prompt_date, registry, service_tool, Domain};
use crate::config::ArtistProfile;
use crate::error::MuseError;
use crate::tools::{AgentToolParameters, ToolRegistry};

pub const AGENT_NAME: &str = "EmailAgent";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MailLabel {
    #[default]
    Inbox,
    Sent,
    Draft,
    Trash,
    Starred,
    Important,
    Spam,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEmails {
    #[serde(default = "default_list_max")]
    pub max_results: u32,
    #[serde(default)]
    pub label: MailLabel,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSearch {
    pub query: String,
    #[serde(default = "default_search_max")]
    pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRef {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyDraft {
    pub message_id: String,
    pub body: String,
    #[serde(default)]
    pub cc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDraft {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRef {
    pub draft_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelChange {
    pub message_id: String,
    #[serde(default)]
    pub add_labels: Vec<String>,
    #[serde(default)]
    pub remove_labels: Vec<String>,
}

fn default_list_max() -> u32 {
    20
}

fn default_search_max() -> u32 {
    10
}

/// Mailbox access for the email agent's tools.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn list_emails(&self, query: ListEmails) -> Result<Value, MuseError>;
    async fn read_email(&self, message: MessageRef) -> Result<Value, MuseError>;
    async fn search_emails(&self, search: EmailSearch) -> Result<Value, MuseError>;
    async fn draft_reply(&self, draft: ReplyDraft) -> Result<Value, MuseError>;
    async fn create_draft(&self, draft: NewDraft) -> Result<Value, MuseError>;
    async fn send_draft(&self, draft: DraftRef) -> Result<Value, MuseError>;
    async fn modify_labels(&self, change: LabelChange) -> Result<Value, MuseError>;

    /// Full message content for the model to pull gig details from. Reads
    /// the message and tags it for extraction unless overridden.
    async fn extract_gig_details(&self, message: MessageRef) -> Result<Value, MuseError> {
        let email = self.read_email(message).await?;
        Ok(json!({
            "email": email,
            "instruction": "Extract venue, date, times, pay, contact, backline and hospitality from this email.",
        }))
    }
}

pub fn persona_prompt(profile: &ArtistProfile, today: NaiveDate) -> String {
    let email = if profile.artist_email.is_empty() {
        "not configured"
    } else {
        profile.artist_email.as_str()
    };
    format!(
        "You are the Email Agent for Muse, the assistant that runs the business side of {artist}'s music career.

You work the artist's inbox: reading and searching mail, drafting replies and pulling gig details out of booking emails.
Expect booking inquiries, session offers, label and publishing business, fan and press mail, and spam.

Rules:
1. Never send on your own. Create a draft, show it, and call send_draft only after the artist explicitly says to send.
2. Replies should be warm, professional and short, signed {artist}.
3. When a message looks like a booking, offer to extract the gig details and to put the date on the calendar.
4. List mail newest first with subject, sender, date and a one-line snippet.
5. Search with Gmail query syntax (from:, subject:, is:unread, after:).
6. Archive by removing INBOX, star by adding STARRED, mark read by removing UNREAD.

Today is {today}. The artist's email is {email}; timezone {timezone}. Keep it brief.",
        artist = profile.artist_name,
        today = prompt_date(today),
        timezone = profile.timezone,
    )
}

pub fn tools(service: Option<Arc<dyn EmailService>>) -> Result<ToolRegistry, MuseError> {
    let domain = Domain::Email;
    registry(vec![
        service_tool(
            &service,
            domain,
            "list_emails",
            "List messages in a mailbox label with subject, sender, date and snippet.",
            AgentToolParameters::object()
                .integer("max_results", "Maximum messages. Default: 20", false)
                .string_enum("label", "Label to list. Default: INBOX", MailLabel::VARIANTS, false)
                .boolean("unread_only", "Only unread messages. Default: false", false)
                .build(),
            |svc: Arc<dyn EmailService>, input: ListEmails| async move { svc.list_emails(input).await },
        ),
        service_tool(
            &service,
            domain,
            "read_email",
            "Read the full body of one message.",
            AgentToolParameters::object()
                .string("message_id", "Message id", true)
                .build(),
            |svc: Arc<dyn EmailService>, input: MessageRef| async move { svc.read_email(input).await },
        ),
        service_tool(
            &service,
            domain,
            "search_emails",
            "Search with Gmail query syntax, e.g. 'from:booker@venue.com is:unread'.",
            AgentToolParameters::object()
                .string("query", "Gmail search query", true)
                .integer("max_results", "Maximum results. Default: 10", false)
                .build(),
            |svc: Arc<dyn EmailService>, input: EmailSearch| async move { svc.search_emails(input).await },
        ),
        service_tool(
            &service,
            domain,
            "draft_reply",
            "Draft a reply to a message. Does not send.",
            AgentToolParameters::object()
                .string("message_id", "Message being answered", true)
                .string("body", "Reply text", true)
                .string_array("cc", "CC addresses", false)
                .build(),
            |svc: Arc<dyn EmailService>, input: ReplyDraft| async move { svc.draft_reply(input).await },
        ),
        service_tool(
            &service,
            domain,
            "create_draft",
            "Draft a new message. Does not send.",
            AgentToolParameters::object()
                .string_array("to", "Recipient addresses", true)
                .string("subject", "Subject line", true)
                .string("body", "Message text", true)
                .string_array("cc", "CC addresses", false)
                .build(),
            |svc: Arc<dyn EmailService>, input: NewDraft| async move { svc.create_draft(input).await },
        ),
        service_tool(
            &service,
            domain,
            "send_draft",
            "Send a draft. Only after the artist explicitly approved it.",
            AgentToolParameters::object()
                .string("draft_id", "Draft id", true)
                .build(),
            |svc: Arc<dyn EmailService>, input: DraftRef| async move { svc.send_draft(input).await },
        ),
        service_tool(
            &service,
            domain,
            "modify_labels",
            "Add or remove labels: archive (remove INBOX), star (add STARRED), mark read (remove UNREAD).",
            AgentToolParameters::object()
                .string("message_id", "Message id", true)
                .string_array("add_labels", "Labels to add", false)
                .string_array("remove_labels", "Labels to remove", false)
                .build(),
            |svc: Arc<dyn EmailService>, input: LabelChange| async move { svc.modify_labels(input).await },
        ),
        service_tool(
            &service,
            domain,
            "extract_gig_details",
            "Fetch a booking email so its gig details can be extracted and offered for the calendar.",
            AgentToolParameters::object()
                .string("message_id", "Booking email id", true)
                .build(),
            |svc: Arc<dyn EmailService>, input: MessageRef| async move {
                svc.extract_gig_details(input).await
            },
        ),
    ])
}
