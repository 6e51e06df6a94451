pub use crate::form::validation::{email, max_length, required};
pub use crate::form::{
    ChangeEvent, Field, FieldConfig, FieldController, FieldKey, FieldRenderer, FieldValue,
    FieldView, FormContext, FormController, FormError, FormOptions, FormResult, FormValues,
    FromFieldValue, FromFormValues, SelectOptionState, SubmitEvent, Submission, ValidationOutcome,
    Validator,
};
pub use crate::tree::{Children, FormNode, NodeRole, provide_form_context};
