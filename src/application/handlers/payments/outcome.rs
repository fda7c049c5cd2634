//! Acknowledgement outcomes of callback reconciliation.

use serde::Serialize;

/// What a callback delivery did. Every variant is acknowledged to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The matching record was settled.
    Paid,
    /// The matching donation was marked failed.
    Failed,
    /// A failure callback on a flow with no failure branch.
    FailureAcknowledged,
    /// No record carries this checkout request id.
    NotFound,
    /// Success code without a receipt number.
    MissingReceipt,
    /// The record was already settled by an earlier delivery.
    AlreadyProcessed,
    /// The body did not contain a callback envelope.
    InvalidPayload,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Paid => "paid",
            ReconcileOutcome::Failed => "failed",
            ReconcileOutcome::FailureAcknowledged => "failure_acknowledged",
            ReconcileOutcome::NotFound => "not_found",
            ReconcileOutcome::MissingReceipt => "missing_receipt",
            ReconcileOutcome::AlreadyProcessed => "already_processed",
            ReconcileOutcome::InvalidPayload => "invalid_payload",
        }
    }
}

impl std::fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_snake_case_label() {
        let json = serde_json::to_value(ReconcileOutcome::AlreadyProcessed).unwrap();
        assert_eq!(json, serde_json::json!("already_processed"));
        assert_eq!(ReconcileOutcome::FailureAcknowledged.as_str(), "failure_acknowledged");
    }
}
