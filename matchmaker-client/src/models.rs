use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Authenticated user session, persisted locally between invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Account fields from the `/profile/me` envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,
}

impl UserAccount {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Recruitment status as reported by the matching service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialStatus {
    Recruiting,
    NotYetRecruiting,
    Active,
    Completed,
    Withdrawn,
}

impl TrialStatus {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Recruiting => "RECRUITING",
            Self::NotYetRecruiting => "NOT_YET_RECRUITING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for TrialStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RECRUITING" => Ok(Self::Recruiting),
            "NOT_YET_RECRUITING" => Ok(Self::NotYetRecruiting),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "WITHDRAWN" => Ok(Self::Withdrawn),
            other => Err(format!("unknown trial status: {other}")),
        }
    }
}

/// One clinical-trial entry returned by the matching service.
///
/// The backend does not guarantee a stable primary key, and some deployments
/// use abbreviated coordinate field names, so the id and coordinates accept
/// aliases on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialRecord {
    #[serde(default, alias = "nct_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TrialStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, alias = "lat", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_url: Option<String>,
    /// Server-supplied match quality in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Client-annotated great-circle distance from the user, in km
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Insurance details nested in the patient profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub policy_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
}

/// Pre-screening questionnaire; answers are "Yes"/"No" strings on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prescreening {
    #[serde(default)]
    pub chronic_illness: Option<String>,
    #[serde(default)]
    pub previous_surgery: Option<String>,
    #[serde(default)]
    pub on_medication: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Structured medical intake record.
///
/// The free-text collections (diagnoses, allergies, medications, vaccinations,
/// family history) are string-keyed mappings on the wire. `BTreeMap` keeps
/// their reload order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub diagnoses: BTreeMap<String, String>,
    #[serde(default)]
    pub allergies: BTreeMap<String, String>,
    #[serde(default)]
    pub medications: BTreeMap<String, String>,
    #[serde(default)]
    pub vaccinations: BTreeMap<String, String>,
    #[serde(default)]
    pub family_history: BTreeMap<String, String>,
    #[serde(default)]
    pub smoking_status: Option<String>,
    #[serde(default)]
    pub alcohol_use: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub insurance: Insurance,
    #[serde(default)]
    pub emergency_contact: EmergencyContact,
    #[serde(default)]
    pub prescreening: Prescreening,
    #[serde(default)]
    pub consent_to_share: bool,
    #[serde(default)]
    pub contact_preference: Option<String>,
}

/// Response envelope of `GET /profile/me`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileEnvelope {
    #[serde(default)]
    pub user: UserAccount,
    #[serde(default)]
    pub patient_profile: Option<PatientProfile>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl SignupRequest {
    pub fn patient(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
            role: "PATIENT".to_string(),
        }
    }
}

/// Successful body of login/signup
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Session {
            token: auth.access_token,
            user_id: auth.user_id,
            email: auth.email,
            first_name: auth.first_name,
            last_name: auth.last_name,
        }
    }
}

/// Outbound body of `POST /api/matching/search`; unset filters go out as
/// empty strings, matching what the backend expects
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query_text: String,
    pub filter_status: String,
    pub filter_location_contains: String,
    pub sort_by: String,
    pub limit: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub matched_trials: Vec<TrialRecord>,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub answer: String,
}

/// Age in whole years at `today`, decrementing when the birthday has not yet
/// occurred this year. `None` when the date of birth cannot be parsed.
pub fn derive_age(date_of_birth: &str, today: NaiveDate) -> Option<i32> {
    let dob = NaiveDate::parse_from_str(date_of_birth.trim(), "%Y-%m-%d").ok()?;
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    Some(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_record_accepts_aliased_fields() {
        let json = r#"{
            "nct_id": "NCT01234567",
            "title": "Aspirin study",
            "status": "RECRUITING",
            "lat": 51.5,
            "lng": -0.12,
            "confidence_score": 0.87
        }"#;
        let trial: TrialRecord = serde_json::from_str(json).unwrap();
        assert_eq!(trial.id.as_deref(), Some("NCT01234567"));
        assert_eq!(trial.status, Some(TrialStatus::Recruiting));
        assert_eq!(trial.latitude, Some(51.5));
        assert_eq!(trial.longitude, Some(-0.12));
    }

    #[test]
    fn missing_matched_trials_key_is_empty_list() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.matched_trials.is_empty());
    }

    #[test]
    fn profile_envelope_tolerates_null_profile() {
        let env: ProfileEnvelope =
            serde_json::from_str(r#"{"user": {"email": "a@b.c"}, "patient_profile": null}"#)
                .unwrap();
        assert!(env.patient_profile.is_none());
        assert_eq!(env.user.email, "a@b.c");
    }

    #[test]
    fn age_decrements_before_birthday() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        assert_eq!(derive_age("1990-06-16", today), Some(35));
        assert_eq!(derive_age("1990-06-15", today), Some(36));
        assert_eq!(derive_age("1990-06-14", today), Some(36));
        assert_eq!(derive_age("not-a-date", today), None);
    }

    #[test]
    fn trial_status_round_trips_through_str() {
        for s in [
            "RECRUITING",
            "NOT_YET_RECRUITING",
            "ACTIVE",
            "COMPLETED",
            "WITHDRAWN",
        ] {
            let parsed: TrialStatus = s.parse().unwrap();
            assert_eq!(parsed.as_wire(), s);
        }
        assert!("PAUSED".parse::<TrialStatus>().is_err());
    }
}
