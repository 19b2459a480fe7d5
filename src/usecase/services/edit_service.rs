use std::marker::PhantomData;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::domain::entities::edit::{Draft, FormRules, FormState};
use crate::domain::entities::record::{Collection, Record, RecordId};
use crate::usecase::ports::transport::{ApiError, HttpTransport};
use crate::usecase::services::query_service::ApiClient;

/// Replaces the record with the same key in place, or appends it.
pub fn merge_record<R: Record>(list: &mut Vec<R>, record: R) {
    let id = record.id();
    match list.iter_mut().find(|existing| existing.id() == id) {
        Some(existing) => *existing = record,
        None => list.push(record),
    }
}

/// Removes the record with the given key, keeping the others in order.
pub fn remove_record<R: Record>(list: &mut Vec<R>, id: &RecordId) -> Option<R> {
    let position = list.iter().position(|record| &record.id() == id)?;
    Some(list.remove(position))
}

/// Request a submit would issue: POST when no key is bound, PUT otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitPlan {
    pub key: Option<RecordId>,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
    /// A delete for the same record was already in flight; nothing was sent.
    InFlight,
}

/// Result of `DeleteTracker::begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStart {
    /// Confirmed and marked pending: send the DELETE, then call `finish`.
    Send(RecordId),
    Skipped(DeleteOutcome),
}

/// Binds one editable draft of a collection record to create/update requests.
///
/// Updates are pessimistic: the in-memory list changes only after the server
/// confirms, so a failure has nothing to roll back.
#[derive(Debug, Clone)]
pub struct FormBinder<C: Collection> {
    rules: FormRules,
    draft: Draft,
    bound_key: Option<RecordId>,
    state: FormState,
    last_error: Option<String>,
    _collection: PhantomData<C>,
}

impl<C: Collection> Default for FormBinder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Collection> FormBinder<C> {
    pub fn new() -> Self {
        let rules = C::form_rules();
        Self {
            draft: Draft::from_rules(&rules),
            rules,
            bound_key: None,
            state: FormState::Idle,
            last_error: None,
            _collection: PhantomData,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn bound_key(&self) -> Option<&RecordId> {
        self.bound_key.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    /// Blank draft for a new record.
    pub fn start_new(&mut self) {
        if self.is_submitting() {
            return;
        }
        self.draft = Draft::from_rules(&self.rules);
        self.bound_key = None;
        self.last_error = None;
        self.state = FormState::Editing;
    }

    /// Draft populated from an existing record; submit will update it.
    pub fn start_edit(&mut self, record: &C) -> Result<(), ApiError> {
        if self.is_submitting() {
            return Ok(());
        }
        self.draft = Draft::from_record(record).map_err(ApiError::decode)?;
        self.bound_key = Some(record.id());
        self.last_error = None;
        self.state = FormState::Editing;
        Ok(())
    }

    pub fn set_field(&mut self, field: &str, value: Value) {
        if self.is_submitting() {
            return;
        }
        self.draft.set(field, value);
        self.state = FormState::Editing;
    }

    /// Validates the draft and moves to `Submitting`.
    ///
    /// Returns `Ok(None)` while a submit for this form is already in flight.
    pub fn begin_submit(&mut self) -> Result<Option<SubmitPlan>, ApiError> {
        if self.is_submitting() {
            return Ok(None);
        }

        let missing = self.rules.missing_fields(&self.draft);
        if !missing.is_empty() {
            let err = ApiError::Validation { missing };
            self.last_error = Some(err.to_string());
            self.state = FormState::Editing;
            return Err(err);
        }

        self.state = FormState::Submitting;
        self.last_error = None;
        Ok(Some(SubmitPlan {
            key: self.bound_key.clone(),
            payload: self.draft.cleaned(&self.rules),
        }))
    }

    /// Applies the server outcome of a submit started with `begin_submit`.
    pub fn finish_submit(
        &mut self,
        outcome: Result<C, ApiError>,
        list: &mut Vec<C>,
    ) -> Result<C, ApiError> {
        match outcome {
            Ok(record) => {
                merge_record(list, record.clone());
                self.state = FormState::Idle;
                self.last_error = None;
                if self.bound_key.is_some() {
                    self.bound_key = Some(record.id());
                    match Draft::from_record(&record) {
                        Ok(draft) => self.draft = draft,
                        Err(err) => {
                            let err = ApiError::decode(err);
                            self.last_error = Some(err.to_string());
                            self.state = FormState::Editing;
                            return Err(err);
                        }
                    }
                } else {
                    self.draft = Draft::from_rules(&self.rules);
                }
                Ok(record)
            }
            Err(err) => {
                warn!(collection = C::LABEL, error = %err, "submit failed");
                self.last_error = Some(err.to_string());
                self.state = FormState::Editing;
                Err(err)
            }
        }
    }

    /// Validates, sends and merges in one step. `Ok(None)` means a submit was
    /// already in flight and nothing was sent.
    pub async fn submit<T: HttpTransport>(
        &mut self,
        client: &ApiClient<T>,
        list: &mut Vec<C>,
    ) -> Result<Option<C>, ApiError> {
        let Some(plan) = self.begin_submit()? else {
            return Ok(None);
        };
        let outcome = send_plan::<C, T>(client, plan).await;
        let record = self.finish_submit(outcome, list)?;
        info!(collection = C::LABEL, id = %record.id(), "record saved");
        Ok(Some(record))
    }
}

pub async fn send_plan<C: Collection, T: HttpTransport>(
    client: &ApiClient<T>,
    plan: SubmitPlan,
) -> Result<C, ApiError> {
    match plan.key {
        Some(id) => client.update::<C>(&id, plan.payload).await,
        None => client.create::<C>(plan.payload).await,
    }
}

/// Keys of records with a DELETE in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteTracker {
    pending: Vec<RecordId>,
}

impl DeleteTracker {
    pub fn is_pending(&self, id: &RecordId) -> bool {
        self.pending.contains(id)
    }

    /// Asks `confirm` and marks the record pending when it approves.
    /// A record already pending is skipped without asking.
    pub fn begin<F>(&mut self, id: &RecordId, confirm: F) -> DeleteStart
    where
        F: FnOnce(&RecordId) -> bool,
    {
        if self.is_pending(id) {
            return DeleteStart::Skipped(DeleteOutcome::InFlight);
        }
        if !confirm(id) {
            return DeleteStart::Skipped(DeleteOutcome::Cancelled);
        }
        self.pending.push(id.clone());
        DeleteStart::Send(id.clone())
    }

    /// Clears the pending mark and applies the server outcome. On success the
    /// record is removed from `list`; on failure `list` is untouched.
    pub fn finish<C: Collection>(
        &mut self,
        id: &RecordId,
        outcome: Result<(), ApiError>,
        list: &mut Vec<C>,
    ) -> Result<DeleteOutcome, ApiError> {
        self.pending.retain(|pending| pending != id);
        match outcome {
            Ok(()) => {
                remove_record(list, id);
                info!(collection = C::LABEL, %id, "record deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                warn!(collection = C::LABEL, %id, error = %err, "delete failed");
                Err(err)
            }
        }
    }
}

/// Confirms, sends and applies a delete in one step. Declining sends nothing.
pub async fn delete_record<C, T, F>(
    client: &ApiClient<T>,
    tracker: &mut DeleteTracker,
    list: &mut Vec<C>,
    id: &RecordId,
    confirm: F,
) -> Result<DeleteOutcome, ApiError>
where
    C: Collection,
    T: HttpTransport,
    F: FnOnce(&RecordId) -> bool,
{
    let id = match tracker.begin(id, confirm) {
        DeleteStart::Send(id) => id,
        DeleteStart::Skipped(outcome) => return Ok(outcome),
    };
    let outcome = client.delete::<C>(&id).await;
    tracker.finish(&id, outcome, list)
}
