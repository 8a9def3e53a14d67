// src/validator.rs - Feedback form validation
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use validator::Validate;

use crate::models::{FormField, FormState};

pub const SELECT_PATIENT_MESSAGE: &str = "select a patient.";

// ==================== FIELD ERRORS ====================

/// One message per field. Edits clear their own field; a submit attempt
/// rebuilds the whole map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<FormField, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn add_error(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn clear_field(&mut self, field: FormField) {
        self.errors.remove(&field);
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    #[cfg(test)]
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn contains(&self, field: FormField) -> bool {
        self.errors.contains_key(&field)
    }

}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let message = self
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field.as_ref(), message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&message)
    }
}

impl From<&validator::ValidationErrors> for FieldErrors {
    fn from(err: &validator::ValidationErrors) -> Self {
        let mut result = FieldErrors::new();

        for (name, errors) in err.field_errors() {
            let Ok(field) = FormField::from_str(&name) else {
                log::warn!("Validation error on unmapped field '{}'", name);
                continue;
            };
            if let Some(first) = errors.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| first.code.to_string());
                result.add_error(field, message);
            }
        }

        result
    }
}

// ==================== FEEDBACK RULES ====================

/// Runs every submit-time rule and reports all violations at once.
///
/// The per-field rules live on [`FormState`] as `validator` attributes; the
/// selection rule depends on state outside the form and is checked here.
pub fn validate_feedback(form: &FormState, patient_selected: bool) -> FieldErrors {
    let mut result = match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => FieldErrors::from(&errors),
    };

    if !patient_selected {
        result.add_error(FormField::SelectedPatient, SELECT_PATIENT_MESSAGE);
    }

    result
}
