mod conversion;
mod requests;
mod transfer_engine;

use std::fmt;
use std::fmt::{Display, Formatter};

pub use conversion::Conversion;
pub use requests::{ConversionPreview, HistoryEntry, PreviewRequest, TransferReceipt, TransferRequest};
pub use transfer_engine::TransferEngine;

/// Stages a single transfer moves through. Converting is skipped when both
/// accounts share a currency.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TransferPhase {
    Validating,
    Converting,
    Applying,
    Completed,
    Failed
}

impl Display for TransferPhase {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            TransferPhase::Validating => "VALIDATING",
            TransferPhase::Converting => "CONVERTING",
            TransferPhase::Applying => "APPLYING",
            TransferPhase::Completed => "COMPLETED",
            TransferPhase::Failed => "FAILED"
        })
    }
}
