//! Resolves one authoritative value for a group of fields sharing a name.
//!
//! Everything here works on snapshots of a group in registration order and holds
//! no state of its own.

use super::field::FieldSnapshot;
use super::value::{FieldValue, InputKind};

/// Index of the member with the latest change. Among equal stamps the earliest
/// registered member wins, so an untouched group resolves to its first field.
pub fn representative_index(group: &[FieldSnapshot]) -> Option<usize> {
    group
        .iter()
        .enumerate()
        .fold(None, |best, (index, field)| match best {
            Some((_, stamp)) if stamp >= field.timestamp => best,
            _ => Some((index, field.timestamp)),
        })
        .map(|(index, _)| index)
}

pub fn representative(group: &[FieldSnapshot]) -> Option<&FieldSnapshot> {
    representative_index(group).map(|index| &group[index])
}

/// Contribution of every checked member holding a value, regardless of which
/// member is the representative. A member contributes its own option value; only
/// members without one fall back to their current value.
pub fn collect_checkbox_values(group: &[FieldSnapshot]) -> Vec<String> {
    let mut values = Vec::new();
    for field in group
        .iter()
        .filter(|field| field.checked && field.value.is_present())
    {
        let option = field.option_value.as_deref().filter(|option| !option.is_empty());
        match (option, &field.value) {
            (Some(option), _) => values.push(option.to_string()),
            (None, FieldValue::Scalar(value)) => values.push(value.clone()),
            (None, FieldValue::List(items)) => values.extend(items.iter().cloned()),
            (None, FieldValue::Absent) => {}
        }
    }
    values
}

/// Output value of a group, or `None` when the group contributes nothing.
pub fn group_value(group: &[FieldSnapshot]) -> Option<FieldValue> {
    let current = representative(group)?;
    if current.excluded {
        return None;
    }
    match current.input_kind {
        Some(InputKind::Checkbox) => {
            let mut values = collect_checkbox_values(group);
            match values.len() {
                0 => None,
                1 => values.pop().map(FieldValue::Scalar),
                _ => Some(FieldValue::List(values)),
            }
        }
        _ => (!current.value.is_absent()).then(|| current.value.clone()),
    }
}
