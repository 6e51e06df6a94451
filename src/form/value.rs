use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::atomic::{AtomicU64, Ordering};

use super::controller::FieldKey;

static CHANGE_CLOCK: AtomicU64 = AtomicU64::new(1);

/// Value held by a field, chosen when the value is produced rather than probed later.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum FieldValue {
    #[default]
    Absent,
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// True for a non-empty scalar or a non-empty list.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::Scalar(value) => !value.is_empty(),
            Self::List(values) => !values.is_empty(),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.as_list()
            .is_some_and(|values| values.iter().any(|value| value == needle))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum InputKind {
    Checkbox,
    MultiSelect,
    Generic,
}

/// Marker of the last user-driven change. Later changes always compare greater.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChangeStamp(pub u64);

impl ChangeStamp {
    pub const NEVER: Self = Self(0);

    pub fn next() -> Self {
        Self(CHANGE_CLOCK.fetch_add(1, Ordering::SeqCst))
    }
}

/// Aggregate output of a form: one value per field name, never `Absent`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormValues(BTreeMap<FieldKey, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn insert(&mut self, key: FieldKey, value: FieldValue) {
        if !value.is_absent() {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, FieldKey, FieldValue> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<FieldKey, FieldValue> {
        self.0
    }
}

impl<'a> IntoIterator for &'a FormValues {
    type Item = (&'a FieldKey, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, FieldKey, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<FieldKey>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.insert(key.into(), value.into());
        }
        values
    }
}
