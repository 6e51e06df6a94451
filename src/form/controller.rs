use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures::future;

use super::event::SubmitEvent;
use super::field::{FieldController, FieldSnapshot};
use super::reconcile;
use super::value::{FieldValue, FormValues};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

/// Field name. Several mounted fields may share one key; they form a group.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(Arc<str>);

impl FieldKey {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&FieldKey> for FieldKey {
    fn from(value: &FieldKey) -> Self {
        value.clone()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Succeeded,
    Failed,
}

#[derive(Clone, Debug, Default)]
pub struct FormOptions {
    pub initial_values: BTreeMap<FieldKey, FieldValue>,
    pub messages: BTreeMap<FieldKey, String>,
    /// Upper bound for each asynchronous validator. `None` leaves timing to the caller.
    pub validator_timeout: Option<Duration>,
}

impl FormOptions {
    pub fn value(mut self, key: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        self.initial_values.insert(key.into(), value.into());
        self
    }

    pub fn message(mut self, key: impl Into<FieldKey>, message: impl Into<String>) -> Self {
        self.messages.insert(key.into(), message.into());
        self
    }

    pub fn with_validator_timeout(mut self, timeout: Duration) -> Self {
        self.validator_timeout = Some(timeout);
        self
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot {
    pub id: FormId,
    pub valid: bool,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub group_count: usize,
    pub field_count: usize,
}

/// Aggregate handed to the completion handler.
#[derive(Clone, Debug)]
pub struct Submission {
    pub valid: bool,
    pub values: FormValues,
    pub invalid_fields: BTreeMap<FieldKey, FieldController>,
}

impl Submission {
    pub fn invalid_message(&self, key: &str) -> FormResult<Option<String>> {
        match self.invalid_fields.get(key) {
            Some(field) => Ok(field.snapshot()?.message),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    MissingFieldName,
    FieldNotRegistered(FieldKey),
    ValidatorTimedOut { field: FieldKey },
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    AlreadySubmitting,
    MissingValue(FieldKey),
    UnexpectedList(FieldKey),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::MissingFieldName => f.write_str("field registered without a name"),
            FormError::FieldNotRegistered(key) => {
                write!(f, "field `{key}` is not registered with this form")
            }
            FormError::ValidatorTimedOut { field } => {
                write!(f, "validator for field `{field}` timed out")
            }
            FormError::InvalidStateTransition { from, to } => {
                write!(f, "invalid submit state transition: {from:?} -> {to:?}")
            }
            FormError::AlreadySubmitting => f.write_str("form submit is already in progress"),
            FormError::MissingValue(key) => write!(f, "no value submitted for field `{key}`"),
            FormError::UnexpectedList(key) => {
                write!(f, "field `{key}` submitted a list where one value was expected")
            }
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub type SubmitHandler = Arc<dyn Fn(&Submission) + Send + Sync>;

type Registry = BTreeMap<FieldKey, Vec<FieldController>>;

struct FormState {
    id: FormId,
    valid: bool,
    invalid_fields: BTreeMap<FieldKey, FieldController>,
    submit_state: SubmitState,
    submit_count: u32,
}

/// Owns the field registry and drives validation and submission.
#[derive(Clone)]
pub struct FormController {
    options: Arc<FormOptions>,
    registry: Arc<RwLock<Registry>>,
    state: Arc<RwLock<FormState>>,
    submit_handler: Arc<RwLock<Option<SubmitHandler>>>,
}

impl FormController {
    pub fn new(options: FormOptions) -> Self {
        Self {
            options: Arc::new(options),
            registry: Arc::new(RwLock::new(BTreeMap::new())),
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                valid: true,
                invalid_fields: BTreeMap::new(),
                submit_state: SubmitState::Idle,
                submit_count: 0,
            })),
            submit_handler: Arc::new(RwLock::new(None)),
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Bundle handed to every field coordinator below this form.
    pub fn context(&self) -> FormContext {
        FormContext {
            form: self.clone(),
        }
    }

    pub fn set_submit_handler(
        &self,
        handler: impl Fn(&Submission) + Send + Sync + 'static,
    ) -> FormResult<()> {
        let mut slot = write_lock(&self.submit_handler, "setting submit handler")?;
        *slot = Some(Arc::new(handler));
        Ok(())
    }

    pub fn clear_submit_handler(&self) -> FormResult<()> {
        write_lock(&self.submit_handler, "clearing submit handler")?.take();
        Ok(())
    }

    pub fn register_field(&self, field: &FieldController) -> FormResult<()> {
        let key = field.name().clone();
        if key.is_empty() {
            tracing::warn!("rejected field registration without a name");
            return Err(FormError::MissingFieldName);
        }
        let mut registry = write_lock(&self.registry, "registering field")?;
        let group = registry.entry(key.clone()).or_default();
        group.push(field.clone());
        tracing::debug!(field = %key, group_size = group.len(), "registered field");
        Ok(())
    }

    /// Removes `field` by identity. The registry is left untouched when it is not a member.
    pub fn unregister_field(&self, field: &FieldController) -> FormResult<()> {
        let key = field.name().clone();
        let mut registry = write_lock(&self.registry, "unregistering field")?;
        let position = registry
            .get(&key)
            .and_then(|group| group.iter().position(|member| member.ptr_eq(field)));
        let Some(position) = position else {
            tracing::warn!(field = %key, "unregistering a field that is not registered");
            return Err(FormError::FieldNotRegistered(key));
        };
        if let Some(group) = registry.get_mut(&key) {
            group.remove(position);
            if group.is_empty() {
                registry.remove(&key);
            }
        }
        tracing::debug!(field = %key, "unregistered field");
        Ok(())
    }

    pub fn field_keys(&self) -> FormResult<Vec<FieldKey>> {
        Ok(read_lock(&self.registry, "reading field keys")?
            .keys()
            .cloned()
            .collect())
    }

    /// Members of one group in registration order.
    pub fn group(&self, key: &str) -> FormResult<Vec<FieldController>> {
        Ok(read_lock(&self.registry, "reading field group")?
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    /// Most recently changed member; the first registered one wins among equals.
    pub fn representative(&self, key: &str) -> FormResult<Option<FieldController>> {
        let group = self.group(key)?;
        let snapshots = snapshot_group(&group)?;
        Ok(reconcile::representative_index(&snapshots).map(|index| group[index].clone()))
    }

    pub fn collect_checkbox_values(&self, key: &str) -> FormResult<Vec<String>> {
        let group = self.group(key)?;
        Ok(reconcile::collect_checkbox_values(&snapshot_group(&group)?))
    }

    /// Validates every mounted field and recomputes the invalid-fields set.
    pub async fn validate(&self) -> FormResult<bool> {
        let members = {
            let registry = read_lock(&self.registry, "collecting fields for validation")?;
            registry
                .iter()
                .flat_map(|(key, group)| group.iter().map(|field| (key.clone(), field.clone())))
                .collect::<Vec<_>>()
        };

        let outcomes =
            future::join_all(members.iter().map(|(_, field)| field.validate())).await;

        let mut invalid_fields = BTreeMap::new();
        for ((key, field), outcome) in members.into_iter().zip(outcomes) {
            if !outcome? {
                invalid_fields.entry(key).or_insert(field);
            }
        }

        let valid = invalid_fields.is_empty();
        let mut state = write_lock(&self.state, "applying form validation result")?;
        state.valid = valid;
        state.invalid_fields = invalid_fields;
        tracing::debug!(
            form = state.id.0,
            valid,
            invalid = state.invalid_fields.len(),
            "validated form"
        );
        Ok(valid)
    }

    /// One value per field name, following the reconciliation rules.
    pub fn values(&self) -> FormResult<FormValues> {
        let groups = {
            let registry = read_lock(&self.registry, "collecting fields for values")?;
            registry
                .iter()
                .map(|(key, group)| (key.clone(), group.clone()))
                .collect::<Vec<_>>()
        };

        let mut values = FormValues::new();
        for (key, group) in groups {
            if let Some(value) = reconcile::group_value(&snapshot_group(&group)?) {
                values.insert(key, value);
            }
        }
        Ok(values)
    }

    pub async fn handle_submit(&self, event: &mut SubmitEvent) -> FormResult<Submission> {
        event.prevent_default();
        {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if state.submit_state == SubmitState::Validating {
                return Err(FormError::AlreadySubmitting);
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
        }

        let mut guard = SubmitGuard {
            state: self.state.clone(),
            settled: false,
        };
        let submission = match self.collect_submission().await {
            Ok(submission) => submission,
            Err(error) => {
                guard.settle(SubmitState::Failed)?;
                return Err(error);
            }
        };
        guard.settle(if submission.valid {
            SubmitState::Succeeded
        } else {
            SubmitState::Failed
        })?;

        {
            let state = read_lock(&self.state, "reading submit result")?;
            tracing::debug!(
                form = state.id.0,
                valid = submission.valid,
                count = state.submit_count,
                "submitted form"
            );
        }

        let handler = read_lock(&self.submit_handler, "reading submit handler")?.clone();
        if let Some(handler) = handler {
            handler(&submission);
        }
        Ok(submission)
    }

    async fn collect_submission(&self) -> FormResult<Submission> {
        let valid = self.validate().await?;
        Ok(Submission {
            valid,
            values: self.values()?,
            invalid_fields: self.invalid_fields()?,
        })
    }

    pub fn is_valid(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading form validity")?.valid)
    }

    /// Result of the last validation pass; stale until the next one.
    pub fn invalid_fields(&self) -> FormResult<BTreeMap<FieldKey, FieldController>> {
        Ok(read_lock(&self.state, "reading invalid fields")?
            .invalid_fields
            .clone())
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        let fields = {
            let registry = read_lock(&self.registry, "collecting fields for error reset")?;
            registry.values().flatten().cloned().collect::<Vec<_>>()
        };
        for field in fields {
            field.clear_error()?;
        }
        let mut state = write_lock(&self.state, "clearing form errors")?;
        state.valid = true;
        state.invalid_fields.clear();
        Ok(())
    }

    pub fn reset_submit_state(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting submit state")?;
        transition_submit_state(&mut state, SubmitState::Idle)
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let (group_count, field_count) = {
            let registry = read_lock(&self.registry, "counting registered fields")?;
            (registry.len(), registry.values().map(Vec::len).sum())
        };
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            id: state.id,
            valid: state.valid,
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            group_count,
            field_count,
        })
    }
}

/// What a form hands to the field coordinators below it.
#[derive(Clone)]
pub struct FormContext {
    form: FormController,
}

impl FormContext {
    pub fn register_field(&self, field: &FieldController) -> FormResult<()> {
        self.form.register_field(field)
    }

    pub fn unregister_field(&self, field: &FieldController) -> FormResult<()> {
        self.form.unregister_field(field)
    }

    pub fn initial_values(&self) -> &BTreeMap<FieldKey, FieldValue> {
        &self.form.options.initial_values
    }

    pub fn messages(&self) -> &BTreeMap<FieldKey, String> {
        &self.form.options.messages
    }

    pub fn validator_timeout(&self) -> Option<Duration> {
        self.form.options.validator_timeout
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        self.form.form_id()
    }
}

impl std::fmt::Debug for FormContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormContext")
            .field("initial_values", self.initial_values())
            .field("messages", self.messages())
            .finish_non_exhaustive()
    }
}

/// Leaves `Validating` when a submit is dropped or unwinds before it settles.
struct SubmitGuard {
    state: Arc<RwLock<FormState>>,
    settled: bool,
}

impl SubmitGuard {
    fn settle(&mut self, next: SubmitState) -> FormResult<()> {
        self.settled = true;
        let mut state = write_lock(&self.state, "completing submit")?;
        transition_submit_state(&mut state, next)
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let Ok(mut state) = self.state.write() else {
            return;
        };
        if state.submit_state == SubmitState::Validating {
            state.submit_state = SubmitState::Failed;
            tracing::warn!(form = state.id.0, "submit abandoned before completion");
        }
    }
}

fn snapshot_group(group: &[FieldController]) -> FormResult<Vec<FieldSnapshot>> {
    group.iter().map(FieldController::snapshot).collect()
}

fn transition_submit_state(state: &mut FormState, next: SubmitState) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Succeeded)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
