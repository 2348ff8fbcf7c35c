//! Typed flows over the untyped gateway.
//!
//! Each flow pins a [`PromptId`] to an input and output struct. Output
//! structs are what the API returns, so their field names are the wire
//! contract.

use gemellifix_core::dashboard::{NamedCount, PriorityCompliance};
use gemellifix_core::status::TicketPriority;
use gemellifix_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::gateway::PromptGateway;
use crate::prompt::PromptId;

pub trait Flow {
    const PROMPT: PromptId;
    type Input: Serialize + Send + Sync;
    type Output: DeserializeOwned;
}

/// Serialize `input`, call the gateway once, and parse the answer.
pub async fn run_flow<F: Flow>(
    gateway: &dyn PromptGateway,
    input: &F::Input,
) -> Result<F::Output, AiError> {
    let value = serde_json::to_value(input).map_err(|e| AiError::Template(e.to_string()))?;
    let raw = gateway.generate(F::PROMPT, value).await?;
    serde_json::from_value(raw).map_err(|e| AiError::InvalidOutput {
        prompt: F::PROMPT,
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Help assistant
// ---------------------------------------------------------------------------

pub struct AskAssistant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantQuestion {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantAnswer {
    pub answer: String,
}

impl Flow for AskAssistant {
    const PROMPT: PromptId = PromptId::AskAssistant;
    type Input = AssistantQuestion;
    type Output = AssistantAnswer;
}

// ---------------------------------------------------------------------------
// Ticket drafting
// ---------------------------------------------------------------------------

pub struct SuggestTicketDetails;

#[derive(Debug, Clone, Serialize)]
pub struct TicketDetailsInput {
    pub title: String,
    pub description: String,
    /// Names the model must choose from.
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetailsSuggestion {
    pub category: String,
    pub priority: TicketPriority,
    pub reasoning: String,
}

impl Flow for SuggestTicketDetails {
    const PROMPT: PromptId = PromptId::SuggestTicketDetails;
    type Input = TicketDetailsInput;
    type Output = TicketDetailsSuggestion;
}

pub struct SuggestTicketTitle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTitleInput {
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTitleSuggestion {
    pub title: String,
}

impl Flow for SuggestTicketTitle {
    const PROMPT: PromptId = PromptId::SuggestTicketTitle;
    type Input = TicketTitleInput;
    type Output = TicketTitleSuggestion;
}

// ---------------------------------------------------------------------------
// Ticket state narration
// ---------------------------------------------------------------------------

pub struct SuggestTicketState;

/// The advisor's deterministic verdict plus context for the narration.
#[derive(Debug, Clone, Serialize)]
pub struct TicketStateInput {
    pub now: String,
    pub status: String,
    pub due_date: String,
    pub assigned_to: String,
    pub role: String,
    pub overdue: bool,
    pub suggested_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStateNarration {
    pub analysis: String,
    pub recommendation: String,
}

impl Flow for SuggestTicketState {
    const PROMPT: PromptId = PromptId::SuggestTicketState;
    type Input = TicketStateInput;
    type Output = TicketStateNarration;
}

// ---------------------------------------------------------------------------
// Technician suggestion
// ---------------------------------------------------------------------------

pub struct SuggestTechnician;

#[derive(Debug, Clone, Serialize)]
pub struct TechnicianCandidate {
    pub id: DbId,
    pub name: String,
    pub open_assignments: i64,
    pub workload_percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicianInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub technicians: Vec<TechnicianCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianSuggestion {
    pub technician_id: DbId,
    pub technician_name: String,
    pub workload_percentage: f64,
    pub reason: String,
}

impl Flow for SuggestTechnician {
    const PROMPT: PromptId = PromptId::SuggestTechnician;
    type Input = TechnicianInput;
    type Output = TechnicianSuggestion;
}

// ---------------------------------------------------------------------------
// Connection diagnosis
// ---------------------------------------------------------------------------

pub struct DiagnoseConnection;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionError {
    pub error_code: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDiagnosis {
    pub analysis: String,
    pub suggested_steps: String,
}

impl Flow for DiagnoseConnection {
    const PROMPT: PromptId = PromptId::DiagnoseConnection;
    type Input = ConnectionError;
    type Output = ConnectionDiagnosis;
}

// ---------------------------------------------------------------------------
// Dashboard summary
// ---------------------------------------------------------------------------

pub struct AnalyzeDashboard;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardInput {
    pub open_tickets: u64,
    pub overdue_tickets: u64,
    pub sla_compliance: u32,
    pub average_resolution_hours: i64,
    pub compliance_by_priority: Vec<PriorityCompliance>,
    pub tickets_by_zone: Vec<NamedCount>,
    pub top_requesters: Vec<NamedCount>,
    pub popular_categories: Vec<NamedCount>,
    pub tickets_by_month: Vec<NamedCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub summary: String,
}

impl Flow for AnalyzeDashboard {
    const PROMPT: PromptId = PromptId::AnalyzeDashboard;
    type Input = DashboardInput;
    type Output = DashboardSummary;
}
