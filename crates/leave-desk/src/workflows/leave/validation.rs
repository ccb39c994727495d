use chrono::{DateTime, Utc};

use super::domain::{ApplicationStatus, ApplicationSubmission, NewApplication};

/// Field requiredness rules applied to incoming submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRequirements {
    pub cell_required: bool,
}

impl Default for FieldRequirements {
    fn default() -> Self {
        Self {
            cell_required: true,
        }
    }
}

/// Intake failures the requester can correct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .missing.join(", "))]
    MissingFields {
        missing: Vec<&'static str>,
        received: ApplicationSubmission,
    },
    #[error("status is required")]
    MissingStatus,
}

impl FieldRequirements {
    /// Check every required field and build a pending application stamped with `now`.
    pub fn validate(
        &self,
        submission: ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Result<NewApplication, ValidationError> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("name", &submission.name),
            ("email", &submission.email),
            ("cell", &submission.cell),
            ("course", &submission.course),
            ("subject", &submission.subject),
            ("reason", &submission.reason),
        ] {
            if field == "cell" && !self.cell_required {
                continue;
            }
            if is_blank(value) {
                missing.push(field);
            }
        }

        if !missing.is_empty() {
            return Err(ValidationError::MissingFields {
                missing,
                received: submission,
            });
        }

        let ApplicationSubmission {
            name,
            email,
            cell,
            course,
            subject,
            reason,
        } = submission;

        Ok(NewApplication {
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            cell: cell.filter(|value| !value.trim().is_empty()),
            course: course.unwrap_or_default(),
            subject: subject.unwrap_or_default(),
            reason: reason.unwrap_or_default(),
            date: now,
            status: ApplicationStatus::Pending,
        })
    }
}

/// Parse a requested status, rejecting absent or blank values.
pub fn parse_status(raw: Option<&str>) -> Result<ApplicationStatus, ValidationError> {
    match raw {
        Some(value) if !value.trim().is_empty() => Ok(ApplicationStatus::from(value)),
        _ => Err(ValidationError::MissingStatus),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |raw| raw.trim().is_empty())
}
