use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Opaque identifier assigned by the store when an application is first persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    /// Random identifier in UUID v4 hex form; never reused across restarts.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review status of a leave application.
///
/// Any string is accepted on the wire. The three known values map onto dedicated variants so the
/// notification rule compares exact states; everything else is kept verbatim in `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    NotApproved,
    Unrecognized(String),
}

impl ApplicationStatus {
    pub fn label(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::NotApproved => "Not Approved",
            ApplicationStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ApplicationStatus::Unrecognized(_))
    }
}

impl From<String> for ApplicationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => ApplicationStatus::Pending,
            "Approved" => ApplicationStatus::Approved,
            "Not Approved" => ApplicationStatus::NotApproved,
            _ => ApplicationStatus::Unrecognized(value),
        }
    }
}

impl From<&str> for ApplicationStatus {
    fn from(value: &str) -> Self {
        ApplicationStatus::from(value.to_string())
    }
}

impl From<ApplicationStatus> for String {
    fn from(value: ApplicationStatus) -> Self {
        match value {
            ApplicationStatus::Unrecognized(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw form fields as posted by the requester. Every field is optional so the service can report
/// exactly which ones were missing. Numbers and booleans are taken as their text form, so a `cell`
/// posted as `5551234` is the same as `"5551234"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub cell: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub course: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub subject: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub reason: Option<String>,
}

/// Reads an optional form field, accepting JSON strings, numbers and booleans as text.
pub(crate) fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(text)) => Ok(Some(text)),
        Some(serde_json::Value::Number(number)) => Ok(Some(number.to_string())),
        Some(serde_json::Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected text, number or boolean, found {other}"
        ))),
    }
}

/// Validated application that has not been assigned an identifier yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub name: String,
    pub email: String,
    pub cell: Option<String>,
    pub course: String,
    pub subject: String,
    pub reason: String,
    pub date: DateTime<Utc>,
    pub status: ApplicationStatus,
}

impl NewApplication {
    /// Attach a store-assigned identifier, producing the first revision of the record.
    pub fn into_record(self, id: ApplicationId) -> LeaveApplication {
        LeaveApplication {
            id,
            name: self.name,
            email: self.email,
            cell: self.cell,
            course: self.course,
            subject: self.subject,
            reason: self.reason,
            date: self.date,
            status: self.status,
            revision: 0,
        }
    }
}

/// Persisted leave application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApplication {
    #[serde(rename = "_id", alias = "id")]
    pub id: ApplicationId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    pub course: String,
    pub subject: String,
    pub reason: String,
    pub date: DateTime<Utc>,
    pub status: ApplicationStatus,
    /// Bumped by the store on every save; used to reject stale writes.
    #[serde(default)]
    pub revision: u64,
}

/// Administrator decision carried in a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    NotApproved,
}

impl Decision {
    /// Decision to announce when a record moves from `previous` to `next`, if any.
    ///
    /// Only a change into Approved or Not Approved produces a decision.
    pub fn for_transition(previous: &ApplicationStatus, next: &ApplicationStatus) -> Option<Self> {
        if previous == next {
            return None;
        }
        match next {
            ApplicationStatus::Approved => Some(Decision::Approved),
            ApplicationStatus::NotApproved => Some(Decision::NotApproved),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::NotApproved => "Not Approved",
        }
    }
}
