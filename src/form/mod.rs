mod controller;
mod element;
mod event;
mod extract;
mod field;
mod reconcile;
pub mod validation;
mod value;


pub use calmform_derive::FromFormValues;
pub use controller::{
    FieldKey, FormContext, FormController, FormError, FormId, FormOptions, FormResult,
    FormSnapshot, SubmitHandler, SubmitState, Submission,
};
pub use element::{ChangeHandler, ElementProps, FieldView, RESERVED_PROPS};
pub use event::{ChangeEvent, SelectOptionState, SubmitEvent};
pub use extract::{FromFieldValue, FromFormValues};
pub use field::{
    Field, FieldConfig, FieldController, FieldRenderer, FieldSnapshot, compute_initial_checked,
};
pub use reconcile::{collect_checkbox_values, group_value, representative, representative_index};
pub use validation::{
    AsyncFieldValidator, BoxedValidationFuture, FieldValidator, ValidationOutcome, Validator,
    ValidatorPipeline,
};
pub use value::{ChangeStamp, FieldValue, FormValues, InputKind};
