use calmform::form::{FieldValue, FormValues, FromFormValues};

#[derive(calmform::form::FromFormValues)]
struct Signup {
    email: String,
    #[form(rename = "favorite-color")]
    color: Option<String>,
    tags: Vec<String>,
    newsletter: bool,
}

fn main() {
    let values = [
        ("email", FieldValue::scalar("a@calm.ui")),
        ("favorite-color", FieldValue::scalar("red")),
        ("tags", FieldValue::list(["rust", "forms"])),
    ]
    .into_iter()
    .collect::<FormValues>();

    let signup = Signup::from_form_values(&values).expect("extract signup");
    assert_eq!(signup.email, "a@calm.ui");
    assert_eq!(signup.color.as_deref(), Some("red"));
    assert_eq!(signup.tags, vec!["rust".to_string(), "forms".to_string()]);
    assert!(!signup.newsletter);
}
