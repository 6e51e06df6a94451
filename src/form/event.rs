use super::value::InputKind;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectOptionState {
    pub value: String,
    pub selected: bool,
}

impl SelectOptionState {
    pub fn new(value: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            selected,
        }
    }
}

/// Change emitted by a rendered input element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChangeEvent {
    Checkbox { checked: bool, value: String },
    MultiSelect { options: Vec<SelectOptionState> },
    Generic { value: String },
}

impl ChangeEvent {
    pub fn checkbox(checked: bool, value: impl Into<String>) -> Self {
        Self::Checkbox {
            checked,
            value: value.into(),
        }
    }

    pub fn multi_select(options: impl IntoIterator<Item = SelectOptionState>) -> Self {
        Self::MultiSelect {
            options: options.into_iter().collect(),
        }
    }

    pub fn generic(value: impl Into<String>) -> Self {
        Self::Generic {
            value: value.into(),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Checkbox { .. } => InputKind::Checkbox,
            Self::MultiSelect { .. } => InputKind::MultiSelect,
            Self::Generic { .. } => InputKind::Generic,
        }
    }
}

/// Submission trigger. The form always suppresses its default action.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
