use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use leave_desk::config::{MailConfig, MailTransport};
use leave_desk::workflows::leave::{
    ApplicationId, ApplicationRepository, DeliveryReceipt, LeaveApplication, NewApplication,
    NotificationError, NotificationGateway, OutboundEmail, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store keeping applications in submission order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<Vec<LeaveApplication>>>,
}

impl InMemoryApplicationRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Vec<LeaveApplication>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: NewApplication) -> Result<LeaveApplication, RepositoryError> {
        let mut guard = self.lock()?;
        let mut id = ApplicationId::generate();
        while guard.iter().any(|record| record.id == id) {
            id = ApplicationId::generate();
        }
        let record = application.into_record(id);
        guard.push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<LeaveApplication>, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn update(&self, mut record: LeaveApplication) -> Result<LeaveApplication, RepositoryError> {
        let mut guard = self.lock()?;
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
        let mut guard = self.lock()?;
        let position = guard.iter().position(|record| &record.id == id);
        Ok(position.map(|index| guard.remove(index)))
    }
}

/// Gateway delivering decision emails over SMTP with implicit TLS.
pub(crate) struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub(crate) fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        let mut builder = SmtpTransport::relay(&config.smtp_host)
            .map_err(|err| NotificationError::Transport(err.to_string()))?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            transport: builder.build(),
        })
    }
}

impl NotificationGateway for SmtpMailer {
    fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, NotificationError> {
        let message = Message::builder()
            .from(parse_mailbox(&email.from)?)
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|err| NotificationError::Rejected(err.to_string()))?;

        let response = self
            .transport
            .send(&message)
            .map_err(|err| NotificationError::Transport(err.to_string()))?;

        Ok(DeliveryReceipt {
            response: response.code().to_string(),
        })
    }

    fn verify(&self) -> Result<(), NotificationError> {
        match self.transport.test_connection() {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotificationError::Transport(
                "SMTP server refused the connection test".to_string(),
            )),
            Err(err) => Err(NotificationError::Transport(err.to_string())),
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse::<Mailbox>()
        .map_err(|err| NotificationError::InvalidAddress {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

/// Gateway that records rendered emails in the log instead of delivering them.
#[derive(Default, Clone)]
pub(crate) struct LogMailer {
    delivered: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl LogMailer {
    pub(crate) fn delivered(&self) -> Vec<OutboundEmail> {
        self.delivered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl NotificationGateway for LogMailer {
    fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, NotificationError> {
        info!(to = %email.to, subject = %email.subject, "decision email captured by log transport");
        self.delivered
            .lock()
            .map_err(|_| NotificationError::Transport("log mailer mutex poisoned".to_string()))?
            .push(email.clone());
        Ok(DeliveryReceipt {
            response: "logged".to_string(),
        })
    }
}

/// Gateway selected at startup from [`MailConfig::transport`].
pub(crate) enum Mailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl Mailer {
    pub(crate) fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        match config.transport {
            MailTransport::Smtp => SmtpMailer::from_config(config).map(Mailer::Smtp),
            MailTransport::Log => Ok(Mailer::Log(LogMailer::default())),
        }
    }
}

impl NotificationGateway for Mailer {
    fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, NotificationError> {
        match self {
            Mailer::Smtp(mailer) => mailer.send(email),
            Mailer::Log(mailer) => mailer.send(email),
        }
    }

    fn verify(&self) -> Result<(), NotificationError> {
        match self {
            Mailer::Smtp(mailer) => mailer.verify(),
            Mailer::Log(mailer) => mailer.verify(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leave_desk::workflows::leave::ApplicationStatus;

    fn draft(name: &str) -> NewApplication {
        NewApplication {
            name: name.to_string(),
            email: format!("{}@college.example", name.to_lowercase()),
            cell: Some("555-0100".to_string()),
            course: "MBA".to_string(),
            subject: "Conference".to_string(),
            reason: "Presenting a paper".to_string(),
            date: Utc::now(),
            status: ApplicationStatus::Pending,
        }
    }

    #[test]
    fn repository_assigns_unique_ids_in_order() {
        let repository = InMemoryApplicationRepository::default();
        let first = repository.insert(draft("Asha")).expect("insert");
        let second = repository.insert(draft("Ben")).expect("insert");

        assert_ne!(first.id, second.id);
        let names: Vec<_> = repository
            .list()
            .expect("list")
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(names, vec!["Asha", "Ben"]);
    }

    #[test]
    fn repository_rejects_stale_revisions() {
        let repository = InMemoryApplicationRepository::default();
        let record = repository.insert(draft("Asha")).expect("insert");

        let mut approved = record.clone();
        approved.status = ApplicationStatus::Approved;
        let saved = repository.update(approved).expect("first save");
        assert_eq!(saved.revision, 1);

        let mut stale = record;
        stale.status = ApplicationStatus::NotApproved;
        assert!(matches!(
            repository.update(stale),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn repository_update_and_remove_unknown_ids() {
        let repository = InMemoryApplicationRepository::default();
        let record = repository.insert(draft("Asha")).expect("insert");
        let removed = repository.remove(&record.id).expect("remove");
        assert_eq!(removed.map(|record| record.id), Some(record.id.clone()));

        assert!(repository.remove(&record.id).expect("remove").is_none());
        assert!(matches!(
            repository.update(record),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn log_mailer_captures_messages() {
        let mailer = Mailer::Log(LogMailer::default());
        let email = OutboundEmail {
            from: "warden@hostel.example".to_string(),
            to: "asha@college.example".to_string(),
            subject: "Leave Application APPROVED: Conference".to_string(),
            html: "<p>Dear Asha,</p>".to_string(),
        };

        let receipt = mailer.send(&email).expect("log transport accepts");
        assert_eq!(receipt.response, "logged");
        assert!(mailer.verify().is_ok());
        match mailer {
            Mailer::Log(inner) => assert_eq!(inner.delivered(), vec![email]),
            Mailer::Smtp(_) => unreachable!(),
        }
    }

    #[test]
    fn invalid_addresses_are_reported() {
        match parse_mailbox("not an address") {
            Err(NotificationError::InvalidAddress { address, .. }) => {
                assert_eq!(address, "not an address")
            }
            other => panic!("expected invalid address, got {other:?}"),
        }
    }
}
