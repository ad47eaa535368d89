//! Modal display mode resolution

use serde::Serialize;

use super::state::{ModalPhase, ModalState};

/// Body variant the modal renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModalDisplayMode {
    SingleAddress,
    MultipleAddress,
    NoAddress,
    EnterManualAddress,
    ManualVerificationFailed,
    ShowCtc,
}

/// Host flow flags that bypass the standard modal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveContext {
    pub is_mobile_flow: bool,
    pub is_from_delivery_section: bool,
}

/// Pick the modal body for the current state.
///
/// Mobile and delivery flows confirm addresses out-of-band and always get `NoAddress`.
#[allow(clippy::if_same_then_else)]
pub fn resolve_modal_display_mode(state: &ModalState, context: &ResolveContext) -> ModalDisplayMode {
    if context.is_mobile_flow || context.is_from_delivery_section {
        return ModalDisplayMode::NoAddress;
    }
    match state.phase {
        // Multiple and single/zero candidate results currently resolve alike.
        ModalPhase::Initial => {
            if state.candidate_count() > 1 {
                ModalDisplayMode::EnterManualAddress
            } else {
                ModalDisplayMode::EnterManualAddress
            }
        }
        ModalPhase::VerificationFailed => ModalDisplayMode::ManualVerificationFailed,
        ModalPhase::ClickToCall => ModalDisplayMode::ShowCtc,
        ModalPhase::ManualEntry => ModalDisplayMode::EnterManualAddress,
    }
}
