//! Address validation workflow
//!
//! Drives one widget instance from a submitted address to an accepted one:
//! validate, then either create / store the first candidate or open the disambiguation modal
//! and wait for the user's decision.
//!
//! Every validation is an attempt with a monotonically increasing [`AttemptToken`]. A response
//! that arrives after a newer attempt started is discarded, and starting a new attempt settles
//! the previous confirmation with [`Disambiguation::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::{CoreError, CoreResult};
use crate::formatter::{
    address_to_form_fields, form_fields_to_address, is_address_valid, is_equal_address,
    manual_form_fields_to_address,
};
use crate::modal::{ModalEvent, ModalStore, ResolveContext};
use crate::services::ServiceContext;
use crate::traits::{FormDataSource, TagEvent};
use crate::types::{AddressRecord, FormValues, ValidationResult, WidgetConfig};

/// Host callbacks fired by the workflow
pub trait WorkflowListener: Send + Sync {
    /// An address was created, or an unchanged address was re-submitted
    fn on_address_created(&self, _address: &AddressRecord) {}

    /// Availability should be re-checked for the new address
    fn on_check_availability(&self) {}

    /// The accepted address of the widget changed
    fn on_address_details_changed(&self, _address: &AddressRecord) {}

    /// Horizontal layouts show a pop-up instead of the modal
    fn on_horizontal_popup(&self, _visible: bool) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl WorkflowListener for NoopListener {}

/// Identifier of one validation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptToken(u64);

/// How a disambiguation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disambiguation {
    /// The user confirmed a candidate (mailbox taken from the form)
    Accepted(AddressRecord),
    Cancelled,
    /// The user went back to edit the form
    BackToManual,
    /// A newer attempt replaced this one
    Superseded,
}

impl Disambiguation {
    /// Whether the user walked away without an address
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Cancelled | Self::BackToManual)
    }
}

/// Receiving end of a disambiguation
#[derive(Debug)]
pub struct PendingConfirmation {
    token: AttemptToken,
    receiver: oneshot::Receiver<Disambiguation>,
}

impl PendingConfirmation {
    pub fn token(&self) -> AttemptToken {
        self.token
    }

    /// Wait for the user's decision.
    ///
    /// Resolves to `Superseded` if the workflow is dropped first.
    pub async fn wait(self) -> Disambiguation {
        self.receiver.await.unwrap_or(Disambiguation::Superseded)
    }
}

/// Result of [`ValidationWorkflow::validate_and_save`]
#[derive(Debug)]
pub enum SaveOutcome {
    /// Same as the current address; nothing was validated
    Unchanged(AddressRecord),
    /// Accepted and created
    Created(AddressRecord),
    /// Rejected; the modal is open
    NeedsConfirmation(PendingConfirmation),
    /// A newer attempt started while this one was validating
    Superseded,
}

/// Result of [`ValidationWorkflow::validate_only`]
#[derive(Debug)]
pub enum ValidateOnlyOutcome {
    /// Accepted and stored as the current address
    Accepted(AddressRecord),
    /// Rejected; the modal is open
    NeedsConfirmation(PendingConfirmation),
    Superseded,
}

/// Open disambiguation: every caller still waiting on it
struct PendingSlot {
    token: AttemptToken,
    waiters: Vec<oneshot::Sender<Disambiguation>>,
}

impl PendingSlot {
    fn settle(self, outcome: &Disambiguation) {
        for waiter in self.waiters {
            if waiter.send(outcome.clone()).is_err() {
                log::debug!("Confirmation receiver already dropped");
            }
        }
    }
}

#[derive(Default)]
struct WorkflowState {
    current: Option<AddressRecord>,
    pending: Option<PendingSlot>,
}

/// Validation / disambiguation controller of one widget instance
pub struct ValidationWorkflow {
    ctx: Arc<ServiceContext>,
    config: Arc<WidgetConfig>,
    form: Arc<dyn FormDataSource>,
    modal: Arc<ModalStore>,
    listener: Arc<dyn WorkflowListener>,
    flow: ResolveContext,
    attempts: AtomicU64,
    state: Mutex<WorkflowState>,
}

impl ValidationWorkflow {
    #[must_use]
    pub fn new(
        ctx: Arc<ServiceContext>,
        config: Arc<WidgetConfig>,
        form: Arc<dyn FormDataSource>,
        modal: Arc<ModalStore>,
    ) -> Self {
        Self {
            ctx,
            config,
            form,
            modal,
            listener: Arc::new(NoopListener),
            flow: ResolveContext::default(),
            attempts: AtomicU64::new(0),
            state: Mutex::new(WorkflowState::default()),
        }
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn WorkflowListener>) -> Self {
        self.listener = listener;
        self
    }

    #[must_use]
    pub fn with_flow(mut self, flow: ResolveContext) -> Self {
        self.flow = flow;
        self
    }

    pub fn modal(&self) -> &Arc<ModalStore> {
        &self.modal
    }

    pub fn flow(&self) -> ResolveContext {
        self.flow
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Current address =====

    /// Last accepted address
    pub fn current_address(&self) -> Option<AddressRecord> {
        self.lock_state().current.clone()
    }

    /// Store `address` as current and write it into the form.
    pub fn set_address_details(&self, address: AddressRecord) {
        let fields = address_to_form_fields(&address, !self.config.show_frazione);
        self.form.update_fields(fields);
        self.listener.on_address_details_changed(&address);
        self.lock_state().current = Some(address);
    }

    /// The address currently typed in the form
    pub fn form_address(&self) -> AddressRecord {
        form_fields_to_address(&self.form.values())
    }

    fn is_unchanged(&self, input: &AddressRecord) -> Option<AddressRecord> {
        self.current_address()
            .filter(|current| is_equal_address(current, input))
    }

    // ===== Attempts =====

    /// Start a new attempt.
    ///
    /// With `continue_session` the open disambiguation moves to the new attempt (manual entry
    /// inside the modal); otherwise it is settled as `Superseded`.
    fn begin_attempt(&self, continue_session: bool) -> AttemptToken {
        let token = AttemptToken(self.attempts.fetch_add(1, Ordering::SeqCst) + 1);
        let previous = {
            let mut state = self.lock_state();
            let previous = state.pending.take();
            if continue_session {
                state.pending = previous.map(|slot| PendingSlot {
                    token,
                    waiters: slot.waiters,
                });
                None
            } else {
                previous
            }
        };
        if let Some(slot) = previous {
            log::info!("Attempt {:?} superseded by {token:?}", slot.token);
            slot.settle(&Disambiguation::Superseded);
        }
        token
    }

    fn is_latest(&self, token: AttemptToken) -> bool {
        self.attempts.load(Ordering::SeqCst) == token.0
    }

    /// Register a waiter for `token` and show the rejected result.
    fn open_confirmation(
        &self,
        token: AttemptToken,
        result: ValidationResult,
        escalate: bool,
    ) -> PendingConfirmation {
        let (sender, receiver) = oneshot::channel();
        {
            let mut state = self.lock_state();
            match state.pending.as_mut() {
                Some(slot) if slot.token == token => slot.waiters.push(sender),
                _ => {
                    state.pending = Some(PendingSlot {
                        token,
                        waiters: vec![sender],
                    });
                }
            }
        }
        self.modal
            .dispatch(ModalEvent::ResultReceived { result, escalate });
        PendingConfirmation { token, receiver }
    }

    fn settle(&self, outcome: &Disambiguation) {
        let slot = self.lock_state().pending.take();
        match slot {
            Some(slot) => slot.settle(outcome),
            None => log::debug!("No open disambiguation to settle"),
        }
    }

    /// Settle the open disambiguation only if it belongs to `token`.
    fn settle_attempt(&self, token: AttemptToken, outcome: &Disambiguation) -> bool {
        let slot = {
            let mut state = self.lock_state();
            match state.pending.as_ref() {
                Some(slot) if slot.token == token => state.pending.take(),
                _ => None,
            }
        };
        slot.map(|slot| slot.settle(outcome)).is_some()
    }

    /// `None` when a newer attempt started while waiting.
    async fn validate(
        &self,
        token: AttemptToken,
        input: &AddressRecord,
    ) -> CoreResult<Option<ValidationResult>> {
        let result = self
            .ctx
            .middleware
            .without_loader()
            .run("validate_address", self.ctx.address_api.validate_address(input))
            .await?;
        if self.is_latest(token) {
            Ok(Some(result))
        } else {
            log::info!("Discarding validation result of stale attempt {token:?}");
            Ok(None)
        }
    }

    /// First candidate with the mailbox the user typed.
    fn accepted_request(result: &ValidationResult, input: &AddressRecord) -> AddressRecord {
        let candidate = result.first_candidate().cloned().unwrap_or_else(|| {
            log::warn!("Accepted validation result carried no candidate, keeping input");
            input.clone()
        });
        candidate.merge_mail_box(input.mail_box.clone())
    }

    async fn create(&self, request: &AddressRecord) -> CoreResult<AddressRecord> {
        let created = self
            .ctx
            .middleware
            .run("create_address", self.ctx.address_api.create_address(request))
            .await?;
        log::info!("Address created: {}", created.id.as_deref().unwrap_or("-"));
        self.lock_state().current = Some(created.clone());
        Ok(created)
    }

    // ===== Entry points =====

    /// Validate `input` (or the form) and create it when accepted.
    ///
    /// A rejected address opens the modal in its escalated view and is tagged unless the
    /// widget is part of the delivery flow.
    pub async fn validate_and_save(&self, input: Option<AddressRecord>) -> CoreResult<SaveOutcome> {
        let input = input.unwrap_or_else(|| self.form_address());
        self.save_attempt(input, false).await
    }

    async fn save_attempt(
        &self,
        input: AddressRecord,
        continue_session: bool,
    ) -> CoreResult<SaveOutcome> {
        if let Some(current) = self.is_unchanged(&input) {
            log::debug!("Address unchanged, skipping validation");
            self.listener.on_address_created(&input);
            if continue_session {
                self.modal.dispatch(ModalEvent::Closed);
                self.settle(&Disambiguation::Accepted(current.clone()));
            }
            return Ok(SaveOutcome::Unchanged(input));
        }

        let token = self.begin_attempt(continue_session);
        let Some(result) = self.validate(token, &input).await? else {
            return Ok(SaveOutcome::Superseded);
        };

        if is_address_valid(&result) {
            let request = Self::accepted_request(&result, &input);
            let created = self.create(&request).await?;
            self.ctx.tagging.tag(TagEvent::AddressVerified {
                address: created.clone(),
            });
            if self.settle_attempt(token, &Disambiguation::Accepted(request)) {
                self.modal.dispatch(ModalEvent::Closed);
            }
            self.listener.on_address_created(&created);
            self.listener.on_check_availability();
            return Ok(SaveOutcome::Created(created));
        }

        log::warn!(
            "Address rejected (errorCode {}, {} candidate(s))",
            result.error_code,
            result.candidate_count()
        );
        if !self.flow.is_from_delivery_section {
            self.ctx.tagging.tag(TagEvent::AddressValidationError {
                address: input,
                error_code: result.error_code.clone(),
            });
        }
        let pending = self.open_confirmation(token, result, true);
        Ok(SaveOutcome::NeedsConfirmation(pending))
    }

    /// Validate the form (or `input`) without creating anything.
    ///
    /// An unchanged address resolves immediately unless `force_validate` is set.
    pub async fn validate_only(
        &self,
        input: Option<AddressRecord>,
    ) -> CoreResult<ValidateOnlyOutcome> {
        let input = input.unwrap_or_else(|| self.form_address());
        if !self.config.force_validate {
            if let Some(current) = self.is_unchanged(&input) {
                return Ok(ValidateOnlyOutcome::Accepted(current));
            }
        }

        let token = self.begin_attempt(false);
        let Some(result) = self.validate(token, &input).await? else {
            return Ok(ValidateOnlyOutcome::Superseded);
        };

        if is_address_valid(&result) {
            let request = Self::accepted_request(&result, &input);
            self.set_address_details(request.clone());
            return Ok(ValidateOnlyOutcome::Accepted(request));
        }

        if self.config.new_horizontal_design {
            self.listener.on_horizontal_popup(true);
        }
        let pending = self.open_confirmation(token, result, false);
        Ok(ValidateOnlyOutcome::NeedsConfirmation(pending))
    }

    // ===== Modal actions =====

    /// Confirm `candidate`; the mailbox comes from the form.
    pub async fn on_select(&self, candidate: AddressRecord) -> CoreResult<AddressRecord> {
        let request = candidate.merge_mail_box(self.form_address().mail_box);
        self.confirm(request).await
    }

    /// Confirm the first candidate of the last rejected result.
    pub async fn on_continue(&self) -> CoreResult<AddressRecord> {
        let candidate = self
            .modal
            .snapshot()
            .invalid_address
            .and_then(|result| result.first_candidate().cloned())
            .ok_or(CoreError::NoCandidate)?;
        self.on_select(candidate).await
    }

    /// Create or store the confirmed address, close the modal, release waiters.
    ///
    /// A failed create leaves the modal and the waiters untouched.
    async fn confirm(&self, request: AddressRecord) -> CoreResult<AddressRecord> {
        if self.config.create_address_upon_submit {
            let created = self.create(&request).await?;
            self.listener.on_address_created(&created);
        } else {
            self.set_address_details(request.clone());
        }
        self.modal.dispatch(ModalEvent::Closed);
        self.settle(&Disambiguation::Accepted(request.clone()));
        Ok(request)
    }

    pub fn on_cancel(&self) {
        self.modal.dispatch(ModalEvent::Dismissed {
            back_to_manual: false,
        });
        self.settle(&Disambiguation::Cancelled);
    }

    pub fn on_back_to_manual(&self) {
        self.modal.dispatch(ModalEvent::Dismissed {
            back_to_manual: true,
        });
        self.settle(&Disambiguation::BackToManual);
    }

    pub fn choose_manual_entry(&self) {
        self.modal.dispatch(ModalEvent::ChooseManualEntry);
    }

    pub fn choose_click_to_call(&self) {
        self.modal.dispatch(ModalEvent::ChooseClickToCall);
    }

    /// Validate and save the address typed in the modal's manual form.
    ///
    /// Callers waiting on the open disambiguation keep waiting: they are settled when this
    /// address is accepted, or by the user's next modal action.
    pub async fn submit_manual_form(&self, values: &FormValues) -> CoreResult<SaveOutcome> {
        let address = manual_form_fields_to_address(values);
        self.modal.dispatch(ModalEvent::ManualSubmitted);
        self.save_attempt(address, true).await
    }
}
