use super::controller::{FieldKey, FormError, FormResult, Submission};
use super::value::{FieldValue, FormValues};

/// Conversion of one submitted value into a typed struct field.
pub trait FromFieldValue: Sized {
    fn from_field_value(key: &FieldKey, value: Option<&FieldValue>) -> FormResult<Self>;
}

/// Typed view of a whole submission. Usually derived with `#[derive(FromFormValues)]`.
pub trait FromFormValues: Sized {
    fn from_form_values(values: &FormValues) -> FormResult<Self>;
}

impl FromFieldValue for String {
    fn from_field_value(key: &FieldKey, value: Option<&FieldValue>) -> FormResult<Self> {
        match value {
            Some(FieldValue::Scalar(value)) => Ok(value.clone()),
            Some(FieldValue::List(_)) => Err(FormError::UnexpectedList(key.clone())),
            Some(FieldValue::Absent) | None => Err(FormError::MissingValue(key.clone())),
        }
    }
}

impl FromFieldValue for Option<String> {
    fn from_field_value(key: &FieldKey, value: Option<&FieldValue>) -> FormResult<Self> {
        match value {
            Some(FieldValue::Scalar(value)) => Ok(Some(value.clone())),
            Some(FieldValue::List(_)) => Err(FormError::UnexpectedList(key.clone())),
            Some(FieldValue::Absent) | None => Ok(None),
        }
    }
}

/// A single checked box submits a scalar; both shapes land in the list.
impl FromFieldValue for Vec<String> {
    fn from_field_value(_key: &FieldKey, value: Option<&FieldValue>) -> FormResult<Self> {
        Ok(match value {
            Some(FieldValue::Scalar(value)) => vec![value.clone()],
            Some(FieldValue::List(values)) => values.clone(),
            Some(FieldValue::Absent) | None => Vec::new(),
        })
    }
}

/// Presence flag, as submitted by a lone checkbox.
impl FromFieldValue for bool {
    fn from_field_value(_key: &FieldKey, value: Option<&FieldValue>) -> FormResult<Self> {
        Ok(value.is_some_and(FieldValue::is_present))
    }
}

impl FormValues {
    pub fn extract<T>(&self) -> FormResult<T>
    where
        T: FromFormValues,
    {
        T::from_form_values(self)
    }
}

impl Submission {
    pub fn extract<T>(&self) -> FormResult<T>
    where
        T: FromFormValues,
    {
        self.values.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> FieldKey {
        FieldKey::from(name)
    }

    #[test]
    fn required_text_reports_missing_and_list_shapes() {
        assert_eq!(
            String::from_field_value(&key("email"), None),
            Err(FormError::MissingValue(key("email")))
        );
        assert_eq!(
            String::from_field_value(&key("email"), Some(&FieldValue::list(["a", "b"]))),
            Err(FormError::UnexpectedList(key("email")))
        );
    }

    #[test]
    fn list_accepts_scalar_and_missing() {
        assert_eq!(
            Vec::<String>::from_field_value(&key("tags"), Some(&FieldValue::scalar("rust"))),
            Ok(vec!["rust".to_string()])
        );
        assert_eq!(
            Vec::<String>::from_field_value(&key("tags"), None),
            Ok(Vec::new())
        );
    }

    #[test]
    fn presence_flag_ignores_empty_text() {
        assert_eq!(
            bool::from_field_value(&key("news"), Some(&FieldValue::scalar("yes"))),
            Ok(true)
        );
        assert_eq!(
            bool::from_field_value(&key("news"), Some(&FieldValue::scalar(""))),
            Ok(false)
        );
    }
}
