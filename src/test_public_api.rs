use futures::executor::block_on;

#[derive(Debug, crate::form::FromFormValues)]
struct ApiSmokeForm {
    title: String,
    #[form(rename = "tag")]
    tags: Vec<String>,
    enabled: bool,
}

struct TitleRenderer;

impl crate::form::FieldRenderer for TitleRenderer {
    type Output = crate::form::ElementProps;

    fn render(&self, view: crate::form::FieldView) -> Self::Output {
        view.element
    }

    fn default_validators(&self) -> Vec<crate::form::Validator> {
        vec![crate::form::validation::required("required")]
    }
}

#[test]
fn prelude_smoke_builds_a_form() {
    use crate::prelude::*;

    let form = FormController::new(FormOptions::default().value("title", "draft"));
    let field = Field::mount(
        FieldConfig::new("title").validators([max_length(32, "too long")]),
        |view: FieldView| view.valid,
        &form.context(),
    )
    .expect("mount field");
    assert!(field.render().expect("render"));

    let _ = email("invalid email");
    let _ = Validator::new(|_: &FieldValue| -> ValidationOutcome { Ok(()) });
}

#[test]
fn form_public_api_smoke_compiles() {
    let form = crate::form::FormController::new(
        crate::form::FormOptions::default()
            .value("title", "draft")
            .message("title", "check the title"),
    );
    let context = form.context();
    let title = crate::form::Field::mount(
        crate::form::FieldConfig::new("title")
            .label("Title")
            .attribute("placeholder", "Untitled"),
        TitleRenderer,
        &context,
    )
    .expect("mount title");
    let tags = ["a", "b"]
        .into_iter()
        .map(|value| {
            crate::form::Field::mount(
                crate::form::FieldConfig::new("tag").value(value),
                TitleRenderer,
                &context,
            )
            .expect("mount tag")
        })
        .collect::<Vec<_>>();
    let enabled = crate::form::Field::mount(
        crate::form::FieldConfig::new("enabled"),
        TitleRenderer,
        &context,
    )
    .expect("mount enabled");

    let props = title.render().expect("render title");
    assert_eq!(props.attribute("placeholder"), Some("Untitled"));
    props.emit(crate::form::ChangeEvent::generic("Release notes"));
    block_on(tags[0].controller().handle_change(crate::form::ChangeEvent::checkbox(true, "on")))
        .expect("check tag");
    block_on(
        enabled
            .controller()
            .handle_change(crate::form::ChangeEvent::checkbox(true, "yes")),
    )
    .expect("check enabled");

    let submission = block_on(form.handle_submit(&mut crate::form::SubmitEvent::new()))
        .expect("submit");
    let model = submission.extract::<ApiSmokeForm>().expect("extract");
    assert_eq!(model.title, "Release notes");
    assert_eq!(model.tags, vec!["a".to_string()]);
    assert!(model.enabled);

    let _ = form.snapshot().expect("snapshot");
    form.clear_errors().expect("clear errors");
    form.reset_submit_state().expect("reset");
    title.unmount().expect("unmount title");
}
