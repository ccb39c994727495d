use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::leave::domain::{
    ApplicationId, ApplicationSubmission, LeaveApplication, NewApplication,
};
use crate::workflows::leave::repository::{
    ApplicationRepository, DeliveryReceipt, NotificationError, NotificationGateway, OutboundEmail,
    RepositoryError,
};
use crate::workflows::leave::{application_router, LeaveApplicationService, WorkflowConfig};

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        name: Some("A".to_string()),
        email: Some("a@x.com".to_string()),
        cell: Some("123".to_string()),
        course: Some("CS".to_string()),
        subject: Some("Sick".to_string()),
        reason: Some("Fever".to_string()),
    }
}

pub(super) fn workflow_config() -> WorkflowConfig {
    WorkflowConfig {
        sender: "warden@hostel.example".to_string(),
        ..WorkflowConfig::default()
    }
}

pub(super) fn build_service() -> (
    LeaveApplicationService<MemoryRepository, MemoryMailbox>,
    Arc<MemoryRepository>,
    Arc<MemoryMailbox>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let mailbox = Arc::new(MemoryMailbox::default());
    let service =
        LeaveApplicationService::new(repository.clone(), mailbox.clone(), workflow_config());
    (service, repository, mailbox)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<Vec<LeaveApplication>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, application: NewApplication) -> Result<LeaveApplication, RepositoryError> {
        let record = application.into_record(ApplicationId::generate());
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<LeaveApplication>, RepositoryError> {
        Ok(self.records.lock().expect("repository mutex poisoned").clone())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn update(&self, mut record: LeaveApplication) -> Result<LeaveApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|stored| stored.id == record.id)
            .ok_or(RepositoryError::NotFound)?;
        if slot.revision != record.revision {
            return Err(RepositoryError::Conflict);
        }
        record.revision += 1;
        *slot = record.clone();
        Ok(record)
    }

    fn remove(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let position = guard.iter().position(|record| &record.id == id);
        Ok(position.map(|index| guard.remove(index)))
    }
}

/// Repository whose reads succeed but whose writes always lose the revision race.
#[derive(Default, Clone)]
pub(super) struct StaleRepository {
    pub(super) inner: MemoryRepository,
}

impl ApplicationRepository for StaleRepository {
    fn insert(&self, application: NewApplication) -> Result<LeaveApplication, RepositoryError> {
        self.inner.insert(application)
    }

    fn list(&self) -> Result<Vec<LeaveApplication>, RepositoryError> {
        self.inner.list()
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update(&self, _record: LeaveApplication) -> Result<LeaveApplication, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn remove(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError> {
        self.inner.remove(id)
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: NewApplication) -> Result<LeaveApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<LeaveApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: LeaveApplication) -> Result<LeaveApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryMailbox {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MemoryMailbox {
    pub(super) fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailbox mutex poisoned").clone()
    }
}

impl NotificationGateway for MemoryMailbox {
    fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, NotificationError> {
        self.sent
            .lock()
            .expect("mailbox mutex poisoned")
            .push(email.clone());
        Ok(DeliveryReceipt {
            response: "250 queued".to_string(),
        })
    }
}

/// Gateway that counts attempts and rejects every one of them.
#[derive(Default, Clone)]
pub(super) struct FailingMailbox {
    attempts: Arc<Mutex<usize>>,
}

impl FailingMailbox {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("mailbox mutex poisoned")
    }
}

impl NotificationGateway for FailingMailbox {
    fn send(&self, _email: &OutboundEmail) -> Result<DeliveryReceipt, NotificationError> {
        *self.attempts.lock().expect("mailbox mutex poisoned") += 1;
        Err(NotificationError::Transport("connection refused".to_string()))
    }
}

pub(super) fn router_with_service<R, G>(service: LeaveApplicationService<R, G>) -> axum::Router
where
    R: ApplicationRepository + 'static,
    G: NotificationGateway + 'static,
{
    application_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
