use crate::infra::{InMemoryApplicationRepository, LogMailer};
use clap::{Args, ValueEnum};
use leave_desk::error::AppError;
use leave_desk::workflows::leave::{
    ApplicationSubmission, HeaderStyle, LeaveApplicationService, NotificationTemplate,
    WorkflowConfig,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum DemoDecision {
    #[default]
    Approved,
    NotApproved,
}

impl DemoDecision {
    fn status(self) -> &'static str {
        match self {
            DemoDecision::Approved => "Approved",
            DemoDecision::NotApproved => "Not Approved",
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Decision the administrator records for the sample application
    #[arg(long, value_enum, default_value_t = DemoDecision::Approved)]
    pub(crate) decision: DemoDecision,
    /// Render the email with a colored decision banner
    #[arg(long)]
    pub(crate) banner: bool,
    /// Submit the sample application without a cell number and relax the requirement
    #[arg(long)]
    pub(crate) without_cell: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        decision,
        banner,
        without_cell,
    } = args;

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let mailer = Arc::new(LogMailer::default());
    let mut config = WorkflowConfig {
        sender: "warden@hostel.example".to_string(),
        template: NotificationTemplate {
            header_style: if banner {
                HeaderStyle::Banner
            } else {
                HeaderStyle::Plain
            },
            ..NotificationTemplate::default()
        },
        ..WorkflowConfig::default()
    };
    config.requirements.cell_required = !without_cell;
    let service = LeaveApplicationService::new(repository, mailer.clone(), config);

    println!("Leave desk demo");
    let submission = sample_submission(without_cell);
    let record = match service.submit(submission) {
        Ok(record) => record,
        Err(err) => {
            println!("  submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "  submitted {} for {} ({}) -> status {}",
        record.id, record.name, record.course, record.status
    );

    for attempt in 1..=2 {
        match service.update_status(&record.id, Some(decision.status())) {
            Ok(change) => println!(
                "  update #{attempt}: {} -> {} | {}",
                change.previous_status,
                change.application.status,
                change.notification.label()
            ),
            Err(err) => println!("  update #{attempt} failed: {err}"),
        }
    }

    for email in mailer.delivered() {
        println!("\nFrom: {}\nTo: {}\nSubject: {}\n", email.from, email.to, email.subject);
        println!("{}", email.html);
    }

    Ok(())
}

fn sample_submission(without_cell: bool) -> ApplicationSubmission {
    ApplicationSubmission {
        name: Some("Asha Verma".to_string()),
        email: Some("asha.verma@college.example".to_string()),
        cell: (!without_cell).then(|| "98765 43210".to_string()),
        course: Some("B.Sc Physics".to_string()),
        subject: Some("Medical leave".to_string()),
        reason: Some("Recovering from viral fever".to_string()),
    }
}
