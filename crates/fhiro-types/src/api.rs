use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::AccessState;
use crate::models::{ContactEntry, WaitlistEntry};

// -- Intake --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitlistSignupRequest {
    // Missing keys read as blank and fail validation like blank input
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Outcome of a form submission, as shown under the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: SubmitStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

// -- Identity --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

/// Where the caller stands with respect to the admin dashboard.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub access: AccessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// -- Admin --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitlistStats {
    pub total: usize,
    pub this_week: usize,
    pub top_specialty: Option<String>,
    pub top_location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WaitlistPage {
    pub stats: WaitlistStats,
    pub entries: Vec<WaitlistEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactsPage {
    pub total: usize,
    pub entries: Vec<ContactEntry>,
}
