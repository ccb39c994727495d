use crate::workflows::leave::domain::{
    ApplicationId, ApplicationStatus, Decision, LeaveApplication,
};
use crate::workflows::leave::notification::{render, HeaderStyle, NotificationTemplate};
use chrono::{TimeZone, Utc};

fn application() -> LeaveApplication {
    LeaveApplication {
        id: ApplicationId("65f0c0ffee".to_string()),
        name: "Priya <Admin>".to_string(),
        email: "priya@college.example".to_string(),
        cell: Some("555-0101".to_string()),
        course: "B.Tech CSE".to_string(),
        subject: "Family function".to_string(),
        reason: "Sister's wedding".to_string(),
        date: Utc.with_ymd_and_hms(2025, 2, 7, 18, 45, 0).unwrap(),
        status: ApplicationStatus::Approved,
        revision: 1,
    }
}

#[test]
fn approval_embeds_application_details() {
    let rendered = render(
        &application(),
        Decision::Approved,
        &NotificationTemplate::default(),
    );

    assert_eq!(rendered.recipient, "priya@college.example");
    assert_eq!(rendered.subject, "Leave Application APPROVED: Family function");
    assert!(rendered.body.contains("has been approved"));
    assert!(rendered.body.contains("<li>Course: B.Tech CSE</li>"));
    assert!(rendered.body.contains("<li>Reason: Sister&#39;s wedding</li>"));
    assert!(rendered.body.contains("<li>Date Submitted: 2/7/2025</li>"));
    assert!(rendered.body.contains("Regards,<br>Hostel Warden"));
    assert!(!rendered.body.contains("<h2"));
}

#[test]
fn rejection_uses_rejection_wording_and_color() {
    let template = NotificationTemplate::default();
    let rendered = render(&application(), Decision::NotApproved, &template);

    assert_eq!(
        rendered.subject,
        "Leave Application NOT APPROVED: Family function"
    );
    assert!(rendered.body.contains("has not been approved"));
    assert!(rendered.body.contains(&template.rejected_color));
    assert!(!rendered.body.contains(&template.approved_color));
}

#[test]
fn user_fields_are_escaped() {
    let rendered = render(
        &application(),
        Decision::Approved,
        &NotificationTemplate::default(),
    );
    assert!(rendered.body.contains("Dear Priya &lt;Admin&gt;,"));
    assert!(!rendered.body.contains("<Admin>"));
}

#[test]
fn banner_header_and_signature_are_configurable() {
    let template = NotificationTemplate {
        header_style: HeaderStyle::Banner,
        signature: "Chief Warden".to_string(),
        ..NotificationTemplate::default()
    };
    let rendered = render(&application(), Decision::NotApproved, &template);

    assert!(rendered
        .body
        .starts_with("<h2 style=\"color: #c62828;\">Leave Application Not Approved</h2>"));
    assert!(rendered.body.ends_with("Regards,<br>Chief Warden</p>"));
}

#[test]
fn rendering_is_deterministic() {
    let template = NotificationTemplate::default();
    let first = render(&application(), Decision::Approved, &template);
    let second = render(&application(), Decision::Approved, &template);
    assert_eq!(first, second);
}

#[test]
fn header_style_parses_case_insensitively() {
    assert_eq!(HeaderStyle::parse(" Banner "), Some(HeaderStyle::Banner));
    assert_eq!(HeaderStyle::parse("plain"), Some(HeaderStyle::Plain));
    assert_eq!(HeaderStyle::parse("fancy"), None);
}
