//! Modal body model

use serde::Serialize;

use super::resolver::ModalDisplayMode;
use super::state::ModalState;
use crate::formatter::format_address;
use crate::types::{AddressRecord, ReferenceData, WidgetConfig};

/// One selectable candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateLine {
    pub index: usize,
    pub line: String,
    pub address: AddressRecord,
}

/// What the modal renders for a display mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ModalContent {
    SingleAddress { candidate: CandidateLine },
    #[serde(rename_all = "camelCase")]
    MultipleAddress {
        candidates: Vec<CandidateLine>,
        show_more: bool,
    },
    NoAddress,
    ManualEntry,
    VerificationFailed,
    ClickToCall { url: Option<String> },
}

impl ModalContent {
    /// Build the body for `mode` from the last rejected result.
    ///
    /// The candidate list shows `min_number_of_address_results_to_display` entries until
    /// `expanded`, then up to `max_number_of_address_results_to_display`.
    pub fn build(
        mode: ModalDisplayMode,
        state: &ModalState,
        reference: &ReferenceData,
        config: &WidgetConfig,
        expanded: bool,
    ) -> Self {
        let candidates = state
            .invalid_address
            .as_ref()
            .map_or(&[][..], |result| result.valid_address_list.as_slice());
        let line = |index: usize, address: &AddressRecord| CandidateLine {
            index,
            line: format_address(address, &reference.countries, &reference.states, config),
            address: address.clone(),
        };

        match mode {
            ModalDisplayMode::SingleAddress => candidates.first().map_or(Self::NoAddress, |c| {
                Self::SingleAddress {
                    candidate: line(0, c),
                }
            }),
            ModalDisplayMode::MultipleAddress => {
                let limit = if expanded {
                    config.max_number_of_address_results_to_display
                } else {
                    config.min_number_of_address_results_to_display
                };
                Self::MultipleAddress {
                    candidates: candidates
                        .iter()
                        .take(limit)
                        .enumerate()
                        .map(|(i, c)| line(i, c))
                        .collect(),
                    show_more: !expanded
                        && candidates.len() > config.min_number_of_address_results_to_display,
                }
            }
            ModalDisplayMode::NoAddress => Self::NoAddress,
            ModalDisplayMode::EnterManualAddress => Self::ManualEntry,
            ModalDisplayMode::ManualVerificationFailed => Self::VerificationFailed,
            ModalDisplayMode::ShowCtc => Self::ClickToCall {
                url: config.ctc_url_for_manual.clone(),
            },
        }
    }
}
