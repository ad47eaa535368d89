//! Modal state machine

use serde::Serialize;
use tokio::sync::watch;

use crate::types::ValidationResult;

/// Which view of the modal is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ModalPhase {
    /// First presentation of a rejected address
    #[default]
    Initial,
    /// The address was rejected again after the user had a chance to fix it
    VerificationFailed,
    /// The user chose to type the address manually
    ManualEntry,
    /// The user chose to be called back; only reachable from `VerificationFailed`
    ClickToCall,
}

/// Everything that can change the modal state
#[derive(Debug, Clone, PartialEq)]
pub enum ModalEvent {
    /// A rejected validation result arrived. `escalate` selects `VerificationFailed`.
    ResultReceived {
        result: ValidationResult,
        escalate: bool,
    },
    ChooseManualEntry,
    ChooseClickToCall,
    ManualSubmitted,
    /// Closed after the user confirmed a candidate
    Closed,
    /// Closed without a confirmation
    Dismissed { back_to_manual: bool },
    /// The owning widget went away
    Unmounted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalState {
    pub open: bool,
    pub phase: ModalPhase,
    /// Last rejected result, replaced in full on every new result
    pub invalid_address: Option<ValidationResult>,
    pub clicked_back_to_manual: bool,
    pub address_has_changed: bool,
}

impl ModalState {
    /// Apply one event.
    pub fn apply(&mut self, event: ModalEvent) {
        match event {
            ModalEvent::ResultReceived { result, escalate } => {
                self.invalid_address = Some(result);
                self.open = true;
                self.address_has_changed = true;
                self.phase = if escalate {
                    ModalPhase::VerificationFailed
                } else {
                    ModalPhase::Initial
                };
            }
            ModalEvent::ChooseManualEntry => self.phase = ModalPhase::ManualEntry,
            ModalEvent::ChooseClickToCall => {
                if self.phase == ModalPhase::VerificationFailed {
                    self.phase = ModalPhase::ClickToCall;
                } else {
                    log::debug!("Click-to-call ignored in phase {:?}", self.phase);
                }
            }
            ModalEvent::ManualSubmitted => self.phase = ModalPhase::Initial,
            ModalEvent::Closed => {
                self.open = false;
                self.leave_click_to_call();
            }
            ModalEvent::Dismissed { back_to_manual } => {
                self.open = false;
                self.clicked_back_to_manual = back_to_manual;
                self.leave_click_to_call();
            }
            ModalEvent::Unmounted => {
                if self.phase == ModalPhase::ManualEntry {
                    self.phase = ModalPhase::Initial;
                }
                self.leave_click_to_call();
            }
        }
    }

    fn leave_click_to_call(&mut self) {
        if self.phase == ModalPhase::ClickToCall {
            self.phase = ModalPhase::VerificationFailed;
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.invalid_address
            .as_ref()
            .map_or(0, ValidationResult::candidate_count)
    }
}

/// Owner of the modal state
///
/// `dispatch` is the only way to mutate it; observers get a `watch` receiver.
#[derive(Debug)]
pub struct ModalStore {
    state: watch::Sender<ModalState>,
}

impl ModalStore {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ModalState::default());
        Self { state }
    }

    /// Apply `event` and return the resulting state.
    pub fn dispatch(&self, event: ModalEvent) -> ModalState {
        log::debug!("Modal event: {event:?}");
        self.state.send_modify(|state| state.apply(event));
        self.snapshot()
    }

    pub fn snapshot(&self) -> ModalState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ModalState> {
        self.state.subscribe()
    }
}

impl Default for ModalStore {
    fn default() -> Self {
        Self::new()
    }
}
