// src/feedback/form.rs
//! State machine behind the feedback screen.
//!
//! Everything here is synchronous: the desk controller decides when to call
//! the clinic API and feeds the results back in. Lookups and employee fetches
//! are tagged with a sequence number when they are issued; a response that
//! does not carry the latest tag is dropped, so a slow stale lookup can never
//! overwrite a newer one.

use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Acknowledgment, DoctorOption, EmployeeOption, FieldUpdate, FormField, FormState,
    LookupResponse, PatientCandidate, RATING_MAX,
};
use crate::validator::{validate_feedback, FieldErrors};

/// Identifier length that triggers a lookup (mobile number or patient ID).
pub const IDENTIFIER_LENGTH: usize = 10;

/// What the controller should do after an identifier keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPlan {
    /// Field was emptied; derived state is already reset.
    Cleared,
    /// Schedule a lookup behind the debounce timer.
    Debounce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Identifier was not lookup-shaped; nothing was sent.
    Skipped,
    /// A newer search superseded this response.
    Stale,
    NotFound,
    Selected,
    Ambiguous(usize),
}

impl LookupOutcome {
    pub fn found(&self) -> bool {
        matches!(self, LookupOutcome::Selected | LookupOutcome::Ambiguous(_))
    }
}

/// Snapshot handed to the display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    pub form: FormState,
    pub candidates: Vec<PatientCandidate>,
    pub selected_patient: Option<PatientCandidate>,
    pub doctors: Vec<DoctorOption>,
    pub employees: Vec<EmployeeOption>,
    pub errors: FieldErrors,
    pub not_found: bool,
    pub acknowledgment: Option<Acknowledgment>,
}

#[derive(Debug)]
pub struct FeedbackForm {
    form: FormState,
    candidates: Vec<PatientCandidate>,
    selected: Option<PatientCandidate>,
    doctors: Vec<DoctorOption>,
    employees: Vec<EmployeeOption>,
    errors: FieldErrors,
    not_found: bool,
    acknowledgment: Option<Acknowledgment>,
    employee_role: String,
    lookup_seq: u64,
    employee_seq: u64,
}

impl FeedbackForm {
    pub fn new(employee_role: impl Into<String>) -> Self {
        Self {
            form: FormState::default(),
            candidates: Vec::new(),
            selected: None,
            doctors: Vec::new(),
            employees: Vec::new(),
            errors: FieldErrors::new(),
            not_found: false,
            acknowledgment: None,
            employee_role: employee_role.into(),
            lookup_seq: 0,
            employee_seq: 0,
        }
    }

    pub fn view(&self) -> FeedbackView {
        FeedbackView {
            form: self.form.clone(),
            candidates: self.candidates.clone(),
            selected_patient: self.selected.clone(),
            doctors: self.doctors.clone(),
            employees: self.employees.clone(),
            errors: self.errors.clone(),
            not_found: self.not_found,
            acknowledgment: self.acknowledgment.clone(),
        }
    }

    // ==================== SEARCH ====================

    pub fn set_identifier(&mut self, value: String) -> SearchPlan {
        self.acknowledgment = None;
        self.errors.clear_field(FormField::PatientMobile);
        self.form.patient_mobile = value;

        if self.form.patient_mobile.is_empty() {
            self.reset_patient();
            SearchPlan::Cleared
        } else {
            SearchPlan::Debounce
        }
    }

    /// Called when the debounce fires. Returns the tag to attach to the
    /// lookup, or `None` when the identifier cannot match anything.
    pub fn begin_lookup(&mut self, value: &str) -> Option<u64> {
        if value.chars().count() != IDENTIFIER_LENGTH {
            self.reset_patient();
            return None;
        }

        self.lookup_seq += 1;
        Some(self.lookup_seq)
    }

    pub fn apply_lookup(&mut self, seq: u64, result: ApiResult<LookupResponse>) -> LookupOutcome {
        if seq != self.lookup_seq {
            log::debug!("Dropping stale lookup response #{} (latest #{})", seq, self.lookup_seq);
            return LookupOutcome::Stale;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Patient lookup failed: {}", e);
                self.mark_not_found();
                return LookupOutcome::NotFound;
            }
        };

        let Some(first) = response.patients.first() else {
            self.mark_not_found();
            return LookupOutcome::NotFound;
        };

        let branch = first.branch_id.clone();
        self.doctors = response
            .doctors
            .into_iter()
            .filter(|doctor| doctor.branch_id == branch)
            .collect();
        self.not_found = false;

        let mut patients = response.patients;
        if patients.len() == 1 {
            let patient = patients.remove(0);
            self.clear_patient_fields();
            self.select_patient(patient);
            LookupOutcome::Selected
        } else {
            let count = patients.len();
            self.selected = None;
            self.clear_patient_fields();
            self.candidates = patients;
            LookupOutcome::Ambiguous(count)
        }
    }

    pub fn select_candidate(&mut self, index: usize) -> ApiResult<()> {
        let candidate = self
            .candidates
            .get(index)
            .cloned()
            .ok_or_else(|| ApiError::candidate_not_found(index))?;

        self.select_patient(candidate);
        Ok(())
    }

    fn select_patient(&mut self, patient: PatientCandidate) {
        self.form.patient_record_id = Some(patient.id.clone());
        self.form.patient_external_id = patient.patient_id.clone();

        if let Some(doctor) = self.doctors.first() {
            self.form.doctor_name = doctor.name.clone();
            self.form.doctor_id = Some(doctor.id.clone());
        }
        if let Some(employee) = self.employees.first() {
            if self.form.employee_name.is_empty() {
                self.form.employee_name = employee.name.clone();
                self.form.employee_id = Some(employee.id.clone());
            }
        }

        self.candidates.clear();
        self.selected = Some(patient);
        self.errors.clear_field(FormField::SelectedPatient);
    }

    fn mark_not_found(&mut self) {
        self.candidates.clear();
        self.selected = None;
        self.doctors.clear();
        self.clear_patient_fields();
        self.not_found = true;
    }

    /// Back to the baseline of an empty search. Any lookup or employee fetch
    /// still in flight is invalidated.
    fn reset_patient(&mut self) {
        self.lookup_seq += 1;
        self.employee_seq += 1;
        self.candidates.clear();
        self.selected = None;
        self.doctors.clear();
        self.employees.clear();
        self.clear_patient_fields();
        self.form.employee_name.clear();
        self.form.employee_id = None;
        self.not_found = false;
    }

    fn clear_patient_fields(&mut self) {
        self.form.patient_record_id = None;
        self.form.patient_external_id = None;
        self.form.doctor_name.clear();
        self.form.doctor_id = None;
    }

    // ==================== EMPLOYEES ====================

    pub fn begin_employee_fetch(&mut self) -> u64 {
        self.employee_seq += 1;
        self.employee_seq
    }

    /// Stores the role-filtered employee list. Returns `false` if the
    /// response was superseded.
    pub fn apply_employees(&mut self, seq: u64, result: ApiResult<Vec<EmployeeOption>>) -> bool {
        if seq != self.employee_seq {
            return false;
        }

        let employees = match result {
            Ok(employees) => employees,
            Err(e) => {
                log::warn!("Employee list fetch failed: {}", e);
                return true;
            }
        };

        self.employees = employees
            .into_iter()
            .filter(|employee| employee.role_type.eq_ignore_ascii_case(&self.employee_role))
            .collect();

        let still_offered = self
            .employees
            .iter()
            .any(|employee| employee.name == self.form.employee_name);
        if !still_offered {
            match self.employees.first() {
                Some(first) => {
                    self.form.employee_name = first.name.clone();
                    self.form.employee_id = Some(first.id.clone());
                }
                None => {
                    self.form.employee_name.clear();
                    self.form.employee_id = None;
                }
            }
        }

        true
    }

    // ==================== FIELD EDITS ====================

    pub fn update_fields(&mut self, update: FieldUpdate) -> ApiResult<()> {
        if let Some(rating) = update.doctor_rating {
            if rating > RATING_MAX {
                return Err(ApiError::rating_out_of_range("doctorRating", rating));
            }
        }
        if let Some(rating) = update.employee_rating {
            if rating > RATING_MAX {
                return Err(ApiError::rating_out_of_range("employeeRating", rating));
            }
        }

        self.acknowledgment = None;

        if let Some(name) = update.doctor_name {
            self.form.doctor_id = self
                .doctors
                .iter()
                .find(|doctor| doctor.name == name)
                .map(|doctor| doctor.id.clone());
            self.form.doctor_name = name;
            self.errors.clear_field(FormField::DoctorName);
        }
        if let Some(name) = update.employee_name {
            self.form.employee_id = self
                .employees
                .iter()
                .find(|employee| employee.name == name)
                .map(|employee| employee.id.clone());
            self.form.employee_name = name;
            self.errors.clear_field(FormField::EmployeeName);
        }
        if let Some(rating) = update.doctor_rating {
            self.form.doctor_rating = rating;
            self.errors.clear_field(FormField::DoctorRating);
        }
        if let Some(rating) = update.employee_rating {
            self.form.employee_rating = rating;
            self.errors.clear_field(FormField::EmployeeRating);
        }
        if let Some(comment) = update.comment {
            self.form.comment = comment;
            self.errors.clear_field(FormField::Comment);
        }

        Ok(())
    }

    // ==================== SUBMIT ====================

    /// Runs every rule. On success returns the body to send; on failure the
    /// error map is stored and returned.
    pub fn submission(&mut self) -> ApiResult<FormState> {
        self.errors = validate_feedback(&self.form, self.selected.is_some());
        if !self.errors.is_valid() {
            log::debug!("Submit blocked by {} field error(s)", self.errors.len());
            return Err(ApiError::ValidationError(self.errors.clone()));
        }
        Ok(self.form.clone())
    }

    pub fn finish_submit(&mut self, result: &ApiResult<()>) -> Acknowledgment {
        let acknowledgment = match result {
            Ok(()) => {
                self.reset();
                Acknowledgment::submitted()
            }
            Err(e) => {
                log::warn!("Feedback submission failed: {}", e);
                Acknowledgment::rejected()
            }
        };

        self.acknowledgment = Some(acknowledgment.clone());
        acknowledgment
    }

    /// Clears everything back to the freshly mounted state. The employee
    /// list is not fetched again.
    pub fn reset(&mut self) {
        self.reset_patient();
        self.form = FormState::default();
        self.errors.clear();
        self.acknowledgment = None;
    }
}

#[cfg(test)]
impl FeedbackForm {
    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn selected(&self) -> Option<&PatientCandidate> {
        self.selected.as_ref()
    }

    pub fn candidates(&self) -> &[PatientCandidate] {
        &self.candidates
    }

    pub fn doctors(&self) -> &[DoctorOption] {
        &self.doctors
    }

    pub fn employees(&self) -> &[EmployeeOption] {
        &self.employees
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn not_found(&self) -> bool {
        self.not_found
    }

    pub fn acknowledgment(&self) -> Option<&Acknowledgment> {
        self.acknowledgment.as_ref()
    }
}
