//! Workflow execution records
//!
//! A workflow is an ordered sequence of intent steps executed with
//! per-step status tracking and partial-failure tolerance. Step
//! records live only for the duration of one orchestration call; the
//! response carries them back to the caller and nothing is persisted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::intent::StepKind;

/// Execution status of one workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Overall outcome of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Completed,
    Failed,
}

/// Mutable execution record for one step of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub kind: StepKind,
    pub status: StepStatus,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowStep {
    pub fn pending(kind: StepKind, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            status: StepStatus::Pending,
            description: description.into(),
            result: None,
            error: None,
        }
    }

    pub fn mark_in_progress(&mut self) {
        self.status = StepStatus::InProgress;
    }

    pub fn mark_completed(&mut self, result: Value) {
        self.status = StepStatus::Completed;
        self.result = Some(result);
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
    }
}

/// A staged email draft awaiting explicit user confirmation.
///
/// Multi-step workflows never auto-send email; they stage a draft and
/// surface a "send now" affordance. Keeping the draft structured here
/// avoids re-parsing rendered text to recover it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// A UI affordance suggested alongside the workflow response.
///
/// These are hints, not side effects; acting on one requires a new
/// request from the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Send the staged draft as-is.
    SendNow { draft: EmailDraft },
    /// Ask the assistant to improve the draft.
    Enhance { draft: EmailDraft },
    /// Open the draft for manual editing.
    EditDraft { draft: EmailDraft },
}

/// The single structured response returned to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResponse {
    pub summary: String,
    pub status: WorkflowStatus,
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub suggested_actions: Vec<SuggestedAction>,
}
