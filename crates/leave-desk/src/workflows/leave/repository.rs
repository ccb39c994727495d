use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, LeaveApplication, NewApplication};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    /// Persist a new application, assigning its identifier.
    fn insert(&self, application: NewApplication) -> Result<LeaveApplication, RepositoryError>;
    /// Every stored application in store order.
    fn list(&self) -> Result<Vec<LeaveApplication>, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError>;
    /// Save a modified record. Implementations must reject the write with
    /// [`RepositoryError::Conflict`] when `record.revision` no longer matches the stored revision,
    /// and return the saved record with its revision incremented.
    fn update(&self, record: LeaveApplication) -> Result<LeaveApplication, RepositoryError>;
    fn remove(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound delivery hook for decision emails (SMTP, logging, test doubles).
pub trait NotificationGateway: Send + Sync {
    /// Attempt delivery exactly once.
    fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, NotificationError>;

    /// Check that the transport is reachable. Callers treat the result as advisory.
    fn verify(&self) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// Fully rendered message handed to a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Transport acknowledgement for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub response: String,
}

/// Delivery error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("message rejected: {0}")]
    Rejected(String),
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}
