use crate::models::DocumentStatus;
use crate::services::pipeline::StatusMapper;
use shared::{Result, ScraperError};

/// Portal status labels and the normalized status each one means.
const STATUS_TABLE: &[(&str, DocumentStatus)] = &[
    ("Approved", DocumentStatus::Approved),
    ("Approved - Pending Payment", DocumentStatus::Approved),
    ("Pending Payment", DocumentStatus::Approved),
    ("Consolidated", DocumentStatus::Approved),
    ("Submitted", DocumentStatus::PendingApproval),
    ("Pending Approval", DocumentStatus::PendingApproval),
    ("Pending Review", DocumentStatus::PendingApproval),
    ("Paid", DocumentStatus::Paid),
    ("Payment Received", DocumentStatus::Paid),
    ("Rejected", DocumentStatus::Rejected),
    ("Cancelled", DocumentStatus::Canceled),
    ("Canceled", DocumentStatus::Canceled),
    ("Voided", DocumentStatus::Canceled),
];

/// Dictionary-based mapper; unknown labels are an error, never a guess.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortalStatusMapper;

impl StatusMapper for PortalStatusMapper {
    fn map(&self, status_text: &str) -> Result<DocumentStatus> {
        let trimmed = status_text.trim();
        STATUS_TABLE
            .iter()
            .find(|(label, _)| *label == trimmed)
            .map(|(_, status)| *status)
            .ok_or_else(|| ScraperError::UnknownStatus {
                status: status_text.to_string(),
            })
    }
}
