//! Validation wiring for `form[data-validate]`

use crate::dom::{self, Listener};
use ewe_client_core::{validate_required_fields, FieldDescriptor, FieldFeedback, FormVerdict, RuleSet};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlFormElement};

const CONTROL_SELECTOR: &str = "input, select, textarea";
const ERROR_MESSAGE_CLASS: &str = "field-error-message";
const ERROR_MESSAGE_CLASSES: &str = "field-error-message text-red-600 text-sm mt-1";

/// Listeners keeping one form's validation alive
pub struct FormValidation {
    _listeners: Vec<Listener>,
}

/// Validate on submit (blocking when invalid) and on blur of each control
pub fn attach_validation(form: &HtmlFormElement, rules: Rc<RuleSet>) -> Result<FormValidation, JsValue> {
    let mut listeners = Vec::new();

    let submit_form = form.clone();
    let submit_rules = rules.clone();
    listeners.push(Listener::new(form, "submit", move |event: Event| {
        match validate_form(&submit_form, &submit_rules) {
            Ok(verdict) if verdict.blocks_submit() => event.prevent_default(),
            Ok(_) => {}
            Err(err) => dom::error("Form validation failed:", &err),
        }
    })?);

    for control in dom::query_all_in(form, CONTROL_SELECTOR)? {
        let rules = rules.clone();
        let target = control.clone();
        listeners.push(Listener::new(&control, "blur", move |_event: Event| {
            if let Err(err) = validate_control(&target, &rules) {
                dom::error("Field validation failed:", &err);
            }
        })?);
    }

    Ok(FormValidation {
        _listeners: listeners,
    })
}

/// Validate every required control, refreshing the feedback of each one
pub fn validate_form(form: &HtmlFormElement, rules: &RuleSet) -> Result<FormVerdict, JsValue> {
    let required: Vec<(Element, FieldDescriptor)> = dom::query_all_in(form, CONTROL_SELECTOR)?
        .into_iter()
        .filter_map(|element| dom::field_descriptor(&element).map(|field| (element, field)))
        .filter(|(_, field)| field.required)
        .collect();

    let mut outcome = Ok(());
    let mut index = 0;
    let verdict = validate_required_fields(rules, required.iter().map(|(_, field)| field), |_, feedback| {
        if let Some((element, _)) = required.get(index) {
            if let Err(err) = apply_feedback(element, feedback) {
                outcome = Err(err);
            }
        }
        index += 1;
    });
    outcome?;

    Ok(verdict)
}

/// Validate a single control and show the result
pub fn validate_control(element: &Element, rules: &RuleSet) -> Result<bool, JsValue> {
    let Some(field) = dom::field_descriptor(element) else {
        return Ok(true);
    };
    let result = rules.validate(&field);
    apply_feedback(element, &FieldFeedback::for_result(&field, &result))?;
    Ok(result.valid)
}

/// Replace the control's classes and its group's error message
pub fn apply_feedback(element: &Element, feedback: &FieldFeedback) -> Result<(), JsValue> {
    let classes = element.class_list();
    classes.remove_2("field-success", "field-error")?;

    let group = element.closest(".form-group")?.or_else(|| element.parent_element());
    if let Some(group) = &group {
        for stale in dom::query_all_in(group, &format!(".{}", ERROR_MESSAGE_CLASS))? {
            stale.remove();
        }
    }

    if let Some(class) = feedback.class_name() {
        classes.add_1(class)?;
    }

    if let (Some(message), Some(group)) = (feedback.message(), group) {
        let document = element
            .owner_document()
            .ok_or_else(|| JsValue::from_str("Field is not attached to a document"))?;
        let note = document.create_element("div")?;
        note.set_class_name(ERROR_MESSAGE_CLASSES);
        note.set_text_content(Some(message));
        group.append_child(&note)?;
    }

    Ok(())
}
