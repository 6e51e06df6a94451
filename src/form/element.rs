use std::collections::BTreeMap;
use std::sync::Arc;

use super::controller::FieldKey;
use super::event::ChangeEvent;
use super::field::FieldController;
use super::value::FieldValue;

/// Keys that configure the coordination layer and never reach the rendered element.
pub const RESERVED_PROPS: [&str; 7] = [
    "checked",
    "form",
    "initialValue",
    "label",
    "message",
    "validators",
    "value",
];

pub type ChangeHandler = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Property bag handed to the underlying input element.
#[derive(Clone)]
pub struct ElementProps {
    pub name: FieldKey,
    pub default_checked: bool,
    pub default_value: FieldValue,
    pub on_change: ChangeHandler,
    pub attributes: BTreeMap<String, String>,
}

impl ElementProps {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Forwards an element change to the owning field.
    pub fn emit(&self, event: ChangeEvent) {
        (self.on_change)(event)
    }
}

impl std::fmt::Debug for ElementProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementProps")
            .field("name", &self.name)
            .field("default_checked", &self.default_checked)
            .field("default_value", &self.default_value)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

/// Everything a field renderer receives.
#[derive(Clone, Debug)]
pub struct FieldView {
    pub element: ElementProps,
    pub label: Option<String>,
    pub message: Option<String>,
    pub valid: bool,
    pub value: FieldValue,
    /// Handle for `validate` and further changes.
    pub field: FieldController,
}

pub(super) fn sanitize_attributes(attributes: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    attributes
        .iter()
        .filter(|(key, _)| !RESERVED_PROPS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_are_stripped() {
        let attributes = [
            ("placeholder", "you@example.com"),
            ("value", "leak"),
            ("initialValue", "leak"),
            ("validators", "leak"),
            ("form", "leak"),
            ("aria-describedby", "email-help"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<BTreeMap<_, _>>();

        let sanitized = sanitize_attributes(&attributes);
        assert_eq!(
            sanitized.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["aria-describedby", "placeholder"]
        );
    }
}
