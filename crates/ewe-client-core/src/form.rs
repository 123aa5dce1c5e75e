//! Form-level verdicts built from per-field results

use crate::validation::{FieldDescriptor, RuleSet, ValidationResult};
use serde::Serialize;

/// Visual feedback to apply to a field after validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldFeedback {
    /// Valid and non-empty: `field-success`
    Success,
    /// Invalid: `field-error` plus one message element
    Error(String),
    /// Valid but empty: no class at all
    Neutral,
}

impl FieldFeedback {
    pub fn for_result(field: &FieldDescriptor, result: &ValidationResult) -> Self {
        if !result.valid {
            FieldFeedback::Error(result.message.clone())
        } else if field.trimmed_value().is_empty() {
            FieldFeedback::Neutral
        } else {
            FieldFeedback::Success
        }
    }

    /// CSS class to add, if any
    pub fn class_name(&self) -> Option<&'static str> {
        match self {
            FieldFeedback::Success => Some("field-success"),
            FieldFeedback::Error(_) => Some("field-error"),
            FieldFeedback::Neutral => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            FieldFeedback::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// A failed field on submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub name: String,
    pub message: String,
}

/// Aggregate outcome of validating a form for submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormVerdict {
    pub checked: usize,
    pub failures: Vec<FieldFailure>,
}

impl FormVerdict {
    /// Submission may proceed
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// The browser's default submission must be suppressed
    pub fn blocks_submit(&self) -> bool {
        !self.is_valid()
    }
}

/// Validate every required field; optional fields are only checked on blur.
///
/// Every required field is visited even after a failure so that each one
/// gets its feedback refreshed. `on_field` receives the feedback for each
/// visited field.
pub fn validate_required_fields<'a, I, F>(rules: &RuleSet, fields: I, mut on_field: F) -> FormVerdict
where
    I: IntoIterator<Item = &'a FieldDescriptor>,
    F: FnMut(&FieldDescriptor, &FieldFeedback),
{
    let mut verdict = FormVerdict::default();

    for field in fields.into_iter().filter(|field| field.required) {
        let result = rules.validate(field);
        let feedback = FieldFeedback::for_result(field, &result);
        on_field(field, &feedback);

        verdict.checked += 1;
        if !result.valid {
            verdict.failures.push(FieldFailure {
                name: field.name.clone(),
                message: result.message,
            });
        }
    }

    if verdict.blocks_submit() {
        tracing::debug!(
            failures = verdict.failures.len(),
            "form submission blocked by validation"
        );
    }

    verdict
}
