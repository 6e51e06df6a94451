use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, Either};
use futures_timer::Delay;

use super::controller::{FieldKey, FormError, FormResult};
use super::value::FieldValue;

pub type ValidationOutcome = Result<(), String>;

pub type BoxedValidationFuture = Pin<Box<dyn Future<Output = ValidationOutcome> + Send + 'static>>;

/// Pure check of a field value. `Err` carries the message shown next to the field.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: &FieldValue) -> ValidationOutcome;
}

impl<F> FieldValidator for F
where
    F: Fn(&FieldValue) -> ValidationOutcome + Send + Sync,
{
    fn validate(&self, value: &FieldValue) -> ValidationOutcome {
        (self)(value)
    }
}

pub trait AsyncFieldValidator: Send + Sync {
    fn validate(&self, value: FieldValue) -> BoxedValidationFuture;
}

impl<F> AsyncFieldValidator for F
where
    F: Fn(FieldValue) -> BoxedValidationFuture + Send + Sync,
{
    fn validate(&self, value: FieldValue) -> BoxedValidationFuture {
        (self)(value)
    }
}

#[derive(Clone)]
enum ValidatorFn {
    Sync(Arc<dyn FieldValidator>),
    Async(Arc<dyn AsyncFieldValidator>),
}

#[derive(Clone)]
pub struct Validator(ValidatorFn);

impl Validator {
    pub fn new(validator: impl FieldValidator + 'static) -> Self {
        Self(ValidatorFn::Sync(Arc::new(validator)))
    }

    pub fn new_async(validator: impl AsyncFieldValidator + 'static) -> Self {
        Self(ValidatorFn::Async(Arc::new(validator)))
    }

    /// `Ok(None)` on pass, `Ok(Some(message))` on failure, `Err` when the time bound is hit.
    async fn check(
        &self,
        field: &FieldKey,
        value: &FieldValue,
        timeout: Option<Duration>,
    ) -> FormResult<Option<String>> {
        let outcome = match &self.0 {
            ValidatorFn::Sync(validator) => validator.validate(value),
            ValidatorFn::Async(validator) => {
                let pending = validator.validate(value.clone());
                match timeout {
                    None => pending.await,
                    Some(limit) => match future::select(pending, Delay::new(limit)).await {
                        Either::Left((outcome, _)) => outcome,
                        Either::Right(((), _)) => {
                            tracing::warn!(field = %field, ?limit, "validator timed out");
                            return Err(FormError::ValidatorTimedOut {
                                field: field.clone(),
                            });
                        }
                    },
                }
            }
        };
        Ok(outcome.err().filter(|message| !message.is_empty()))
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            ValidatorFn::Sync(_) => f.write_str("Validator::Sync"),
            ValidatorFn::Async(_) => f.write_str("Validator::Async"),
        }
    }
}

/// Ordered validators of one field. Runs until the first failure.
#[derive(Clone, Debug, Default)]
pub struct ValidatorPipeline {
    validators: Vec<Validator>,
}

impl ValidatorPipeline {
    pub fn new(validators: impl IntoIterator<Item = Validator>) -> Self {
        Self {
            validators: validators.into_iter().collect(),
        }
    }

    /// Component defaults first, then caller-supplied validators, each keeping its order.
    pub fn compose(
        defaults: impl IntoIterator<Item = Validator>,
        supplied: impl IntoIterator<Item = Validator>,
    ) -> Self {
        Self::new(defaults.into_iter().chain(supplied))
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub async fn run(
        &self,
        field: &FieldKey,
        value: &FieldValue,
        timeout: Option<Duration>,
    ) -> FormResult<Option<String>> {
        for validator in &self.validators {
            if let Some(message) = validator.check(field, value, timeout).await? {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }
}

/// Fails when the value is absent, an empty string or an empty list.
pub fn required(message: impl Into<String>) -> Validator {
    let message = message.into();
    Validator::new(move |value: &FieldValue| {
        if value.is_present() {
            Ok(())
        } else {
            Err(message.clone())
        }
    })
}

/// Fails on a malformed address. Empty values pass so `required` decides on them.
pub fn email(message: impl Into<String>) -> Validator {
    let message = message.into();
    Validator::new(move |value: &FieldValue| {
        let malformed = match value {
            FieldValue::Absent => false,
            FieldValue::Scalar(address) => !address.is_empty() && !is_email(address),
            FieldValue::List(addresses) => addresses.iter().any(|address| !is_email(address)),
        };
        if malformed {
            Err(message.clone())
        } else {
            Ok(())
        }
    })
}

pub fn max_length(limit: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Validator::new(move |value: &FieldValue| {
        let too_long = match value {
            FieldValue::Absent => false,
            FieldValue::Scalar(text) => text.chars().count() > limit,
            FieldValue::List(items) => items.len() > limit,
        };
        if too_long {
            Err(message.clone())
        } else {
            Ok(())
        }
    })
}

fn is_email(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn key() -> FieldKey {
        FieldKey::from("email")
    }

    #[test]
    fn first_failure_short_circuits_later_validators() {
        let pipeline = ValidatorPipeline::new([
            required("required"),
            email("invalid email"),
            Validator::new(|_: &FieldValue| -> ValidationOutcome {
                panic!("must not run after a failure")
            }),
        ]);
        let message = block_on(pipeline.run(&key(), &FieldValue::scalar(""), None))
            .expect("pipeline runs");
        assert_eq!(message.as_deref(), Some("required"));
    }

    #[test]
    fn empty_message_counts_as_pass() {
        let pipeline = ValidatorPipeline::new([Validator::new(
            |_: &FieldValue| -> ValidationOutcome { Err(String::new()) },
        )]);
        let message = block_on(pipeline.run(&key(), &FieldValue::scalar("x"), None))
            .expect("pipeline runs");
        assert_eq!(message, None);
    }

    #[test]
    fn compose_keeps_defaults_first() {
        let pipeline = ValidatorPipeline::compose(
            [Validator::new(|_: &FieldValue| -> ValidationOutcome {
                Err("default".to_string())
            })],
            [Validator::new(|_: &FieldValue| -> ValidationOutcome {
                Err("supplied".to_string())
            })],
        );
        assert_eq!(pipeline.len(), 2);
        assert!(!pipeline.is_empty());
        assert!(ValidatorPipeline::default().is_empty());
        let message = block_on(pipeline.run(&key(), &FieldValue::Absent, None))
            .expect("pipeline runs");
        assert_eq!(message.as_deref(), Some("default"));
    }

    #[test]
    fn email_accepts_plain_addresses_only() {
        assert!(is_email("user@example.com"));
        assert!(!is_email("user@example"));
        assert!(!is_email("user example@example.com"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("user@@example.com"));
        assert!(!is_email("user@example..com"));
    }

    #[test]
    fn async_validator_exceeding_timeout_is_a_fault() {
        let pipeline = ValidatorPipeline::new([Validator::new_async(|_value: FieldValue| {
            Box::pin(async {
                Delay::new(Duration::from_millis(200)).await;
                Ok(())
            }) as BoxedValidationFuture
        })]);
        let result = block_on(pipeline.run(
            &key(),
            &FieldValue::scalar("a@b.co"),
            Some(Duration::from_millis(10)),
        ));
        assert_eq!(result, Err(FormError::ValidatorTimedOut { field: key() }));
    }

    #[test]
    fn async_validator_within_timeout_reports_its_message() {
        let pipeline = ValidatorPipeline::new([Validator::new_async(|value: FieldValue| {
            Box::pin(async move {
                if value.as_scalar() == Some("taken") {
                    Err("already taken".to_string())
                } else {
                    Ok(())
                }
            }) as BoxedValidationFuture
        })]);
        let message = block_on(pipeline.run(
            &key(),
            &FieldValue::scalar("taken"),
            Some(Duration::from_secs(5)),
        ))
        .expect("pipeline runs");
        assert_eq!(message.as_deref(), Some("already taken"));
    }
}
