use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending password-reset challenge. At most one per email: issuing a new
/// one replaces the old record, and a successful reset deletes it, so a
/// consumed code can never be replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// Missing fields deserialize to empty strings and are rejected by the
// engine's input checks, keeping the error body in the house shape.
#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
    #[serde(default, rename = "newPassword")]
    pub new_password: String,
}
