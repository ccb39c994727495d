//! Decision email rendering. Everything here is pure; delivery lives behind
//! [`NotificationGateway`](super::repository::NotificationGateway).

use serde::Serialize;

use super::domain::{Decision, LeaveApplication};

/// How the top of the email body is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderStyle {
    /// Greeting only.
    #[default]
    Plain,
    /// Colored heading announcing the decision above the greeting.
    Banner,
}

impl HeaderStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" => Some(Self::Plain),
            "banner" => Some(Self::Banner),
            _ => None,
        }
    }
}

/// Presentation options shared by every decision email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub header_style: HeaderStyle,
    pub signature: String,
    pub approved_color: String,
    pub rejected_color: String,
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self {
            header_style: HeaderStyle::Plain,
            signature: "Hostel Warden".to_string(),
            approved_color: "#2e7d32".to_string(),
            rejected_color: "#c62828".to_string(),
        }
    }
}

/// Rendered message ready to be addressed and handed to a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

pub fn render(
    application: &LeaveApplication,
    decision: Decision,
    template: &NotificationTemplate,
) -> RenderedNotification {
    let (prefix, verdict, color) = match decision {
        Decision::Approved => ("APPROVED", "has been approved", &template.approved_color),
        Decision::NotApproved => (
            "NOT APPROVED",
            "has not been approved",
            &template.rejected_color,
        ),
    };

    let subject = format!("Leave Application {prefix}: {}", application.subject);

    let header = match template.header_style {
        HeaderStyle::Plain => String::new(),
        HeaderStyle::Banner => format!(
            "<h2 style=\"color: {color};\">Leave Application {}</h2>\n",
            decision.label()
        ),
    };

    let body = format!(
        "{header}<p>Dear {name},</p>\n\
         <p>Your leave application for \"{subject}\" <strong style=\"color: {color};\">{verdict}</strong>.</p>\n\
         <ul>\n\
         <li>Course: {course}</li>\n\
         <li>Subject: {subject}</li>\n\
         <li>Reason: {reason}</li>\n\
         <li>Date Submitted: {date}</li>\n\
         </ul>\n\
         <p>Regards,<br>{signature}</p>",
        name = escape_html(&application.name),
        subject = escape_html(&application.subject),
        course = escape_html(&application.course),
        reason = escape_html(&application.reason),
        date = application.date.format("%-m/%-d/%Y"),
        signature = escape_html(&template.signature),
    );

    RenderedNotification {
        recipient: application.email.clone(),
        subject,
        body,
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
