//! Disambiguation modal
//!
//! - `state`: modal phase and the single dispatch entry point that mutates it
//! - `resolver`: which body the modal shows for a given state
//! - `content`: the body model (candidate lines, manual entry, click-to-call)
//! - `backdrop`: scoped click-outside subscriptions

mod backdrop;
mod content;
mod resolver;
mod state;

pub use backdrop::{BackdropGuard, BackdropListeners};
pub use content::{CandidateLine, ModalContent};
pub use resolver::{resolve_modal_display_mode, ModalDisplayMode, ResolveContext};
pub use state::{ModalEvent, ModalPhase, ModalState, ModalStore};
