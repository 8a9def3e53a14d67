// src/models.rs
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

/// Highest value a doctor or employee rating may take. Zero means "unrated".
pub const RATING_MAX: u8 = 5;

// ==================== FEEDBACK FORM ====================

/// The feedback form as the user fills it in. Serialized as-is into the
/// body of `POST /feedback`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    #[validate(length(equal = 10, message = "valid mobile number or patient ID required."))]
    pub patient_mobile: String,

    #[validate(length(min = 1, message = "doctor's name required."))]
    pub doctor_name: String,

    #[validate(length(min = 1, message = "employee's name required."))]
    pub employee_name: String,

    #[validate(range(min = 1, message = "rate the doctor."))]
    pub doctor_rating: u8,

    #[validate(range(min = 1, message = "rate the employee."))]
    pub employee_rating: u8,

    #[validate(length(min = 10, message = "comment too short."))]
    pub comment: String,

    // Filled in once a patient is selected
    pub patient_record_id: Option<String>,
    #[serde(rename = "patientID")]
    pub patient_external_id: Option<String>,
    pub doctor_id: Option<String>,
    pub employee_id: Option<String>,
}

/// Form fields that can carry a validation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum FormField {
    PatientMobile,
    SelectedPatient,
    DoctorName,
    DoctorRating,
    EmployeeName,
    EmployeeRating,
    Comment,
}

/// A patient record returned by the lookup endpoint, pending disambiguation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientCandidate {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "branch")]
    pub branch_id: String,
    #[serde(default, rename = "patientID", alias = "patientId")]
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorOption {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "branch")]
    pub branch_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeOption {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "role")]
    pub role_type: String,
}

/// Body of `GET /get-patient-details`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub patients: Vec<PatientCandidate>,
    #[serde(default)]
    pub doctors: Vec<DoctorOption>,
}

/// Outcome of the last submit attempt, shown to the user once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Acknowledgment {
    Success { message: String },
    Failure { message: String },
}

impl Acknowledgment {
    pub fn submitted() -> Self {
        Acknowledgment::Success {
            message: "Feedback submitted successfully!".to_string(),
        }
    }

    pub fn rejected() -> Self {
        Acknowledgment::Failure {
            message: "Could not submit feedback, please try again.".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Acknowledgment::Success { .. })
    }
}

/// Partial edit of the free-form fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    pub doctor_name: Option<String>,
    pub employee_name: Option<String>,
    pub doctor_rating: Option<u8>,
    pub employee_rating: Option<u8>,
    pub comment: Option<String>,
}

// ==================== COUNTER BOARD ====================

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CounterStatus {
    #[default]
    Queue,
    In,
    Out,
}

impl CounterStatus {
    /// Text shown in the board's status column.
    pub fn label(&self) -> &'static str {
        match self {
            CounterStatus::Queue => "On Queue",
            CounterStatus::In => "In",
            CounterStatus::Out => "Out",
        }
    }
}

/// One roster entry: a counter bound to a doctor and department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    pub counter: u32,
    pub doctor: String,
    pub department: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterToken {
    pub counter: u32,
    pub token: u64,
    pub status: CounterStatus,
}

impl CounterToken {
    pub fn new(counter: u32) -> Self {
        Self {
            counter,
            token: 0,
            status: CounterStatus::Queue,
        }
    }
}
