use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, Decision, LeaveApplication,
};
use super::notification::{render, NotificationTemplate};
use super::repository::{ApplicationRepository, NotificationGateway, OutboundEmail, RepositoryError};
use super::validation::{parse_status, FieldRequirements, ValidationError};

/// Settings that differ between deployments of the leave desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub requirements: FieldRequirements,
    pub sender: String,
    pub template: NotificationTemplate,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            requirements: FieldRequirements::default(),
            sender: "leave-desk@localhost".to_string(),
            template: NotificationTemplate::default(),
        }
    }
}

/// Result of attempting to notify the requester about a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    Failed,
    NotNeeded,
}

impl NotificationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationOutcome::Sent => "Email notification sent",
            NotificationOutcome::Failed => "Failed to send email notification",
            NotificationOutcome::NotNeeded => "No email notification needed",
        }
    }
}

/// A persisted status change together with its notification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub application: LeaveApplication,
    pub previous_status: ApplicationStatus,
    pub notification: NotificationOutcome,
}

/// Service composing field validation, the application store, and the notification gateway.
pub struct LeaveApplicationService<R, G> {
    repository: Arc<R>,
    gateway: Arc<G>,
    config: WorkflowConfig,
}

impl<R, G> LeaveApplicationService<R, G>
where
    R: ApplicationRepository + 'static,
    G: NotificationGateway + 'static,
{
    pub fn new(repository: Arc<R>, gateway: Arc<G>, config: WorkflowConfig) -> Self {
        Self {
            repository,
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Validate and store a new application in the Pending state.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<LeaveApplication, ApplicationServiceError> {
        let application = self.config.requirements.validate(submission, Utc::now())?;
        let stored = self.repository.insert(application)?;
        info!(application_id = %stored.id, course = %stored.course, "leave application submitted");
        Ok(stored)
    }

    pub fn list(&self) -> Result<Vec<LeaveApplication>, ApplicationServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<LeaveApplication, ApplicationServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| ApplicationServiceError::NotFound(id.clone()))
    }

    /// Overwrite the status of an application and notify the requester when a decision changed.
    ///
    /// Delivery failures are reported through [`NotificationOutcome::Failed`]; the status write is
    /// kept either way.
    pub fn update_status(
        &self,
        id: &ApplicationId,
        status: Option<&str>,
    ) -> Result<StatusChange, ApplicationServiceError> {
        let status = parse_status(status)?;
        if !status.is_recognized() {
            warn!(application_id = %id, status = %status, "storing unrecognized application status");
        }

        let mut record = self.get(id)?;
        let previous_status = std::mem::replace(&mut record.status, status);
        let application = self.repository.update(record).map_err(|err| match err {
            RepositoryError::NotFound => ApplicationServiceError::NotFound(id.clone()),
            other => ApplicationServiceError::Repository(other),
        })?;

        info!(
            application_id = %id,
            from = %previous_status,
            to = %application.status,
            "application status updated"
        );

        let notification = match Decision::for_transition(&previous_status, &application.status) {
            Some(decision) => self.notify(&application, decision),
            None => NotificationOutcome::NotNeeded,
        };

        Ok(StatusChange {
            application,
            previous_status,
            notification,
        })
    }

    /// Remove an application permanently.
    pub fn delete(&self, id: &ApplicationId) -> Result<LeaveApplication, ApplicationServiceError> {
        let removed = self
            .repository
            .remove(id)?
            .ok_or_else(|| ApplicationServiceError::NotFound(id.clone()))?;
        info!(application_id = %removed.id, "leave application deleted");
        Ok(removed)
    }

    fn notify(&self, application: &LeaveApplication, decision: Decision) -> NotificationOutcome {
        let rendered = render(application, decision, &self.config.template);
        let email = OutboundEmail {
            from: self.config.sender.clone(),
            to: rendered.recipient,
            subject: rendered.subject,
            html: rendered.body,
        };

        match self.gateway.send(&email) {
            Ok(receipt) => {
                info!(
                    application_id = %application.id,
                    decision = decision.label(),
                    response = %receipt.response,
                    "decision email sent"
                );
                NotificationOutcome::Sent
            }
            Err(err) => {
                warn!(
                    application_id = %application.id,
                    decision = decision.label(),
                    error = %err,
                    "decision email failed"
                );
                NotificationOutcome::Failed
            }
        }
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
