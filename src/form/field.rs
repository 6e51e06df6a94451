use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::controller::{FieldKey, FormContext, FormResult, read_lock, write_lock};
use super::element::{ElementProps, FieldView, sanitize_attributes};
use super::event::ChangeEvent;
use super::validation::{AsyncFieldValidator, FieldValidator, Validator, ValidatorPipeline};
use super::value::{ChangeStamp, FieldValue, InputKind};

/// Recognized options of one field binding.
#[derive(Clone, Debug)]
pub struct FieldConfig {
    name: FieldKey,
    value: Option<String>,
    initial_value: Option<FieldValue>,
    checked: Option<bool>,
    validators: Vec<Validator>,
    message: Option<String>,
    exclude: bool,
    label: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl FieldConfig {
    pub fn new(name: impl Into<FieldKey>) -> Self {
        Self {
            name: name.into(),
            value: None,
            initial_value: None,
            checked: None,
            validators: Vec::new(),
            message: None,
            exclude: false,
            label: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Option value of a radio or checkbox.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn initial_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.validators.push(Validator::new(validator));
        self
    }

    pub fn async_validator(mut self, validator: impl AsyncFieldValidator + 'static) -> Self {
        self.validators.push(Validator::new_async(validator));
        self
    }

    pub fn validators(mut self, validators: impl IntoIterator<Item = Validator>) -> Self {
        self.validators.extend(validators);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn exclude(mut self, exclude: bool) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Read-only copy of a field's state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldSnapshot {
    pub name: FieldKey,
    /// Configured option value of a radio or checkbox.
    pub option_value: Option<String>,
    pub value: FieldValue,
    pub checked: bool,
    pub input_kind: Option<InputKind>,
    pub valid: bool,
    pub message: Option<String>,
    pub timestamp: ChangeStamp,
    pub excluded: bool,
}

struct FieldState {
    value: FieldValue,
    checked: bool,
    input_kind: Option<InputKind>,
    valid: bool,
    message: Option<String>,
    timestamp: ChangeStamp,
}

struct FieldInner {
    name: FieldKey,
    option_value: Option<String>,
    initial_value: FieldValue,
    checked_override: Option<bool>,
    excluded: bool,
    label: Option<String>,
    attributes: BTreeMap<String, String>,
    pipeline: ValidatorPipeline,
    validator_timeout: Option<Duration>,
    state: RwLock<FieldState>,
}

/// Local state machine of one mounted input. Clones share the same field.
#[derive(Clone)]
pub struct FieldController {
    inner: Arc<FieldInner>,
}

impl FieldController {
    /// Builds the controller for a field about to mount under `context`.
    pub(crate) fn new(
        config: FieldConfig,
        default_validators: Vec<Validator>,
        context: &FormContext,
    ) -> Self {
        let initial_value = config
            .initial_value
            .or_else(|| context.initial_values().get(&config.name).cloned())
            .unwrap_or_default();
        let message = config
            .message
            .or_else(|| context.messages().get(&config.name).cloned());
        let checked =
            compute_initial_checked(config.checked, config.value.as_deref(), &initial_value);

        Self {
            inner: Arc::new(FieldInner {
                state: RwLock::new(FieldState {
                    value: initial_value.clone(),
                    checked,
                    input_kind: None,
                    valid: true,
                    message,
                    timestamp: ChangeStamp::NEVER,
                }),
                name: config.name,
                option_value: config.value,
                initial_value,
                checked_override: config.checked,
                excluded: config.exclude,
                label: config.label,
                attributes: config.attributes,
                pipeline: ValidatorPipeline::compose(default_validators, config.validators),
                validator_timeout: context.validator_timeout(),
            }),
        }
    }

    pub fn name(&self) -> &FieldKey {
        &self.inner.name
    }

    pub fn is_excluded(&self) -> bool {
        self.inner.excluded
    }

    pub fn validator_count(&self) -> usize {
        self.inner.pipeline.len()
    }

    /// Identity comparison; two fields holding equal values stay distinct.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn compute_initial_checked(&self) -> bool {
        compute_initial_checked(
            self.inner.checked_override,
            self.inner.option_value.as_deref(),
            &self.inner.initial_value,
        )
    }

    /// Applies `event`; the returned future resolves with the committed state.
    pub async fn handle_change(&self, event: ChangeEvent) -> FormResult<FieldSnapshot> {
        self.apply_change(event)?;
        self.snapshot()
    }

    pub(super) fn apply_change(&self, event: ChangeEvent) -> FormResult<()> {
        let timestamp = ChangeStamp::next();
        let kind = event.kind();
        let mut state = write_lock(&self.inner.state, "applying field change")?;
        state.timestamp = timestamp;
        state.input_kind = Some(kind);
        match event {
            ChangeEvent::Checkbox { checked, value } => {
                state.checked = checked;
                state.value = if checked {
                    FieldValue::Scalar(self.inner.option_value.clone().unwrap_or(value))
                } else {
                    FieldValue::Absent
                };
            }
            ChangeEvent::MultiSelect { options } => {
                state.value = FieldValue::List(
                    options
                        .into_iter()
                        .filter(|option| option.selected && !option.value.is_empty())
                        .map(|option| option.value)
                        .collect(),
                );
            }
            ChangeEvent::Generic { value } => {
                state.value = FieldValue::Scalar(value);
            }
        }
        tracing::trace!(field = %self.inner.name, ?kind, stamp = timestamp.0, "committed change");
        Ok(())
    }

    /// Runs the validator pipeline against the committed value.
    pub async fn validate(&self) -> FormResult<bool> {
        let value = read_lock(&self.inner.state, "reading value for validation")?
            .value
            .clone();
        let failure = self
            .inner
            .pipeline
            .run(&self.inner.name, &value, self.inner.validator_timeout)
            .await?;

        let mut state = write_lock(&self.inner.state, "writing field validation result")?;
        let valid = failure.is_none();
        state.valid = valid;
        state.message = failure;
        Ok(valid)
    }

    /// Replaces the displayed message without touching validity.
    pub fn set_message(&self, message: Option<String>) -> FormResult<()> {
        write_lock(&self.inner.state, "setting field message")?.message = message;
        Ok(())
    }

    pub(super) fn clear_error(&self) -> FormResult<()> {
        let mut state = write_lock(&self.inner.state, "clearing field error")?;
        state.valid = true;
        state.message = None;
        Ok(())
    }

    pub fn snapshot(&self) -> FormResult<FieldSnapshot> {
        let state = read_lock(&self.inner.state, "creating field snapshot")?;
        Ok(FieldSnapshot {
            name: self.inner.name.clone(),
            option_value: self.inner.option_value.clone(),
            value: state.value.clone(),
            checked: state.checked,
            input_kind: state.input_kind,
            valid: state.valid,
            message: state.message.clone(),
            timestamp: state.timestamp,
            excluded: self.inner.excluded,
        })
    }

    pub fn element_props(&self) -> ElementProps {
        let field = self.clone();
        ElementProps {
            name: self.inner.name.clone(),
            default_checked: self.compute_initial_checked(),
            default_value: self
                .inner
                .option_value
                .clone()
                .map(FieldValue::Scalar)
                .unwrap_or_else(|| self.inner.initial_value.clone()),
            on_change: Arc::new(move |event| {
                if let Err(error) = field.apply_change(event) {
                    tracing::warn!(field = %field.inner.name, %error, "dropped change event");
                }
            }),
            attributes: sanitize_attributes(&self.inner.attributes),
        }
    }

    pub fn view(&self) -> FormResult<FieldView> {
        let snapshot = self.snapshot()?;
        Ok(FieldView {
            element: self.element_props(),
            label: self.inner.label.clone(),
            message: snapshot.message,
            valid: snapshot.valid,
            value: snapshot.value,
            field: self.clone(),
        })
    }
}

impl std::fmt::Debug for FieldController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("FieldController");
        debug.field("name", &self.inner.name);
        if let Ok(state) = self.inner.state.read() {
            debug
                .field("value", &state.value)
                .field("valid", &state.valid)
                .field("timestamp", &state.timestamp);
        }
        debug.finish_non_exhaustive()
    }
}

/// Whether a toggle-style field starts checked. An explicit `true` wins; `false`
/// falls through to matching the option value against the initial value.
pub fn compute_initial_checked(
    checked: Option<bool>,
    value: Option<&str>,
    initial_value: &FieldValue,
) -> bool {
    if checked == Some(true) {
        return true;
    }
    match value.filter(|value| !value.is_empty()) {
        Some(value) => initial_value.as_scalar() == Some(value) || initial_value.contains(value),
        None => initial_value.is_present(),
    }
}

/// View-side target a field renders through.
pub trait FieldRenderer {
    type Output;

    fn render(&self, view: FieldView) -> Self::Output;

    /// Validators the component always applies, ahead of caller-supplied ones.
    fn default_validators(&self) -> Vec<Validator> {
        Vec::new()
    }
}

impl<F, O> FieldRenderer for F
where
    F: Fn(FieldView) -> O,
{
    type Output = O;

    fn render(&self, view: FieldView) -> O {
        (self)(view)
    }
}

/// A mounted field: registered on construction, deregistered on unmount or drop.
pub struct Field<R>
where
    R: FieldRenderer,
{
    controller: FieldController,
    renderer: R,
    context: Option<FormContext>,
}

impl<R> Field<R>
where
    R: FieldRenderer,
{
    pub fn mount(config: FieldConfig, renderer: R, context: &FormContext) -> FormResult<Self> {
        let controller = FieldController::new(config, renderer.default_validators(), context);
        context.register_field(&controller)?;
        Ok(Self {
            controller,
            renderer,
            context: Some(context.clone()),
        })
    }

    pub fn controller(&self) -> &FieldController {
        &self.controller
    }

    pub fn is_mounted(&self) -> bool {
        self.context.is_some()
    }

    pub fn render(&self) -> FormResult<R::Output> {
        Ok(self.renderer.render(self.controller.view()?))
    }

    pub fn unmount(mut self) -> FormResult<()> {
        self.detach()
    }

    fn detach(&mut self) -> FormResult<()> {
        match self.context.take() {
            Some(context) => context.unregister_field(&self.controller),
            None => Ok(()),
        }
    }
}

impl<R> Drop for Field<R>
where
    R: FieldRenderer,
{
    fn drop(&mut self) {
        if let Err(error) = self.detach() {
            tracing::warn!(field = %self.controller.name(), %error, "failed to unmount field");
        }
    }
}
