//! Analytics tagging abstract Trait

use crate::types::{AddressRecord, ErrorCode};

/// Analytics events emitted by the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    /// Validation rejected the address (not emitted for the delivery flow)
    AddressValidationError {
        address: AddressRecord,
        error_code: ErrorCode,
    },
    /// A candidate address was accepted and created
    AddressVerified { address: AddressRecord },
}

/// Fire-and-forget analytics sink
pub trait TaggingSink: Send + Sync {
    fn tag(&self, event: TagEvent);
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTagging;

impl TaggingSink for NoopTagging {
    fn tag(&self, _event: TagEvent) {}
}
