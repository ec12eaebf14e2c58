//! Invoice agent: billing, payment tracking and income summaries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{Display, VariantNames};

use super::{prompt_date, registry, service_tool, Domain};
use crate::config::ArtistProfile;
use crate::error::MuseError;
use crate::tools::{AgentToolParameters, ToolRegistry};

pub const AGENT_NAME: &str = "InvoiceAgent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

/// Input of `create_invoice`. A missing `payment_terms` is filled from the
/// artist profile before the service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub client_name: String,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl NewInvoice {
    pub fn total(&self) -> f64 {
        self.line_items.iter().map(|item| item.amount).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRef {
    pub invoice_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    pub invoice_id: String,
    pub updates: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub invoice_id: String,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub payment_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Invoice storage and rendering.
#[async_trait]
pub trait InvoiceService: Send + Sync {
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Value, MuseError>;
    async fn list_invoices(&self, filter: InvoiceFilter) -> Result<Value, MuseError>;
    async fn get_invoice(&self, invoice: InvoiceRef) -> Result<Value, MuseError>;
    async fn update_invoice(&self, update: InvoiceUpdate) -> Result<Value, MuseError>;
    async fn mark_paid(&self, payment: Payment) -> Result<Value, MuseError>;
    /// Render a PDF; the result carries the file path.
    async fn generate_pdf(&self, invoice: InvoiceRef) -> Result<Value, MuseError>;
    async fn get_income_summary(&self, range: DateRange) -> Result<Value, MuseError>;
}

pub fn persona_prompt(profile: &ArtistProfile, today: NaiveDate) -> String {
    format!(
        "You are the Invoice Agent for Muse, the assistant that runs the business side of {artist}'s music career.

You create invoices, track payments, produce PDFs and explain where the money stands.
Musicians get paid as guarantees, door splits, session rates, lesson rates, deposits and flat fees; describe line items with the event type, venue and date.

Rules:
1. Create invoices as drafts and show a preview. Generate the PDF only once the artist approves.
2. Invoice numbers are sequential (INV-YYYY-NNN) and assigned by the system.
3. Default payment terms are \"{terms}\" unless the artist says otherwise.
4. Income summaries split paid from outstanding and call out anything overdue.
5. When marking an invoice paid, ask how it was paid (Venmo, Zelle, cash, check).

Today is {today}. Keep it brief.",
        artist = profile.artist_name,
        terms = profile.payment_terms,
        today = prompt_date(today),
    )
}

pub fn tools(service: Option<Arc<dyn InvoiceService>>) -> Result<ToolRegistry, MuseError> {
    tools_with_terms(service, ArtistProfile::default().payment_terms)
}

/// Tools whose `create_invoice` falls back to `default_terms`.
pub fn tools_with_terms(
    service: Option<Arc<dyn InvoiceService>>,
    default_terms: String,
) -> Result<ToolRegistry, MuseError> {
    let domain = Domain::Invoice;
    let line_items = json!({
        "type": "array",
        "description": "Line items with descriptions and amounts",
        "items": {
            "type": "object",
            "properties": {
                "description": {"type": "string", "description": "e.g. 'Live performance - Saturday showcase'"},
                "amount": {"type": "number", "description": "Amount in USD"},
                "event_date": {"type": "string", "description": "Event date, YYYY-MM-DD"},
                "event_type": {"type": "string", "description": "gig, session, rehearsal, lesson or other"},
                "venue": {"type": "string", "description": "Venue or studio"}
            },
            "required": ["description", "amount"]
        }
    });
    let default_terms = Arc::new(default_terms);

    registry(vec![
        service_tool(
            &service,
            domain,
            "create_invoice",
            "Create a draft invoice. Show the preview before generating a PDF.",
            AgentToolParameters::object()
                .string("client_name", "Who pays", true)
                .property("line_items", line_items, true)
                .string("client_email", "Client email", false)
                .string("notes", "Notes printed on the invoice", false)
                .string("payment_terms", "e.g. 'Net 15'. Defaults to the artist's terms", false)
                .string("due_date", "Due date, YYYY-MM-DD", false)
                .build(),
            move |svc: Arc<dyn InvoiceService>, mut input: NewInvoice| {
                let default_terms = Arc::clone(&default_terms);
                async move {
                    if input.payment_terms.as_deref().map_or(true, str::is_empty) {
                        input.payment_terms = Some(default_terms.as_ref().clone());
                    }
                    svc.create_invoice(input).await
                }
            },
        ),
        service_tool(
            &service,
            domain,
            "list_invoices",
            "List invoices, optionally by date range and status.",
            AgentToolParameters::object()
                .string("start_date", "Range start, YYYY-MM-DD", false)
                .string("end_date", "Range end, YYYY-MM-DD", false)
                .string_enum("status", "Only this status", InvoiceStatus::VARIANTS, false)
                .build(),
            |svc: Arc<dyn InvoiceService>, input: InvoiceFilter| async move { svc.list_invoices(input).await },
        ),
        service_tool(
            &service,
            domain,
            "get_invoice",
            "Full details of one invoice, including line items.",
            AgentToolParameters::object()
                .string("invoice_id", "Invoice id", true)
                .build(),
            |svc: Arc<dyn InvoiceService>, input: InvoiceRef| async move { svc.get_invoice(input).await },
        ),
        service_tool(
            &service,
            domain,
            "update_invoice",
            "Change client info, status, due date, terms or notes on an invoice.",
            AgentToolParameters::object()
                .string("invoice_id", "Invoice id", true)
                .object("updates", "Fields to change", true)
                .build(),
            |svc: Arc<dyn InvoiceService>, input: InvoiceUpdate| async move { svc.update_invoice(input).await },
        ),
        service_tool(
            &service,
            domain,
            "mark_paid",
            "Record payment of an invoice.",
            AgentToolParameters::object()
                .string("invoice_id", "Invoice id", true)
                .string("payment_date", "Date received, YYYY-MM-DD. Defaults to today", false)
                .string("payment_notes", "Method or reference, e.g. 'Venmo'", false)
                .build(),
            |svc: Arc<dyn InvoiceService>, input: Payment| async move { svc.mark_paid(input).await },
        ),
        service_tool(
            &service,
            domain,
            "generate_pdf",
            "Render an approved invoice to PDF and return its path.",
            AgentToolParameters::object()
                .string("invoice_id", "Invoice id", true)
                .build(),
            |svc: Arc<dyn InvoiceService>, input: InvoiceRef| async move { svc.generate_pdf(input).await },
        ),
        service_tool(
            &service,
            domain,
            "get_income_summary",
            "Totals invoiced, paid, outstanding and overdue, optionally for a date range.",
            AgentToolParameters::object()
                .string("start_date", "Range start, YYYY-MM-DD", false)
                .string("end_date", "Range end, YYYY-MM-DD", false)
                .build(),
            |svc: Arc<dyn InvoiceService>, input: DateRange| async move {
                svc.get_income_summary(input).await
            },
        ),
    ])
}
