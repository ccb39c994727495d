//! Leave application intake, review, and decision notification.

pub mod domain;
pub mod notification;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, Decision, LeaveApplication,
    NewApplication,
};
pub use notification::{render, HeaderStyle, NotificationTemplate, RenderedNotification};
pub use repository::{
    ApplicationRepository, DeliveryReceipt, NotificationError, NotificationGateway, OutboundEmail,
    RepositoryError,
};
pub use router::{application_router, FormBody, StatusUpdateRequest};
pub use service::{
    ApplicationServiceError, LeaveApplicationService, NotificationOutcome, StatusChange,
    WorkflowConfig,
};
pub use validation::{FieldRequirements, ValidationError};
