//! Email composition. Pure functions from workflow data to [`EmailMessage`],
//! kept free of I/O so the wording can be pinned down in tests.

use crate::models::application::{ApplicantStatus, ApplicationRow};
use crate::models::posting::HireApplicationRow;
use crate::notify::EmailMessage;

/// Notifies the operator inbox that a new posting is waiting for review.
pub fn posting_review_notice(
    posting: &HireApplicationRow,
    operator_email: &str,
    app_base_url: &str,
) -> EmailMessage {
    let admin_link = format!("{}/admin?jobId={}", app_base_url, posting.job_id);

    let requirements_html: String = posting
        .requirements
        .iter()
        .map(|r| format!("<li>{r}</li>"))
        .collect();

    let html = format!(
        "<h2>New Job Posting Submitted</h2>\
         <p><strong>Title:</strong> {title}</p>\
         <p><strong>Company:</strong> {company}</p>\
         <p><strong>Location:</strong> {location}</p>\
         <p><strong>Type:</strong> {job_type}</p>\
         <p><strong>Salary:</strong> {salary}</p>\
         <h3>Description:</h3><p>{description}</p>\
         <h3>Requirements:</h3><ul>{requirements_html}</ul>\
         <p><strong>Tags:</strong> {tags}</p>\
         <p><strong>Posted By:</strong> {email}</p>\
         <p><a href=\"{admin_link}\" target=\"_blank\">View in Admin</a></p>",
        title = posting.title,
        company = posting.company,
        location = posting.location,
        job_type = posting.job_type,
        salary = posting.salary,
        description = posting.description,
        tags = posting.tags.join(", "),
        email = posting.contact_email,
    );

    let text = format!(
        "New job posting submitted\n\n\
         Title: {}\nCompany: {}\nLocation: {}\nType: {}\nSalary: {}\n\n\
         Description:\n{}\n\nRequirements:\n{}\n\nTags: {}\nPosted by: {}\n\n\
         Review: {admin_link}",
        posting.title,
        posting.company,
        posting.location,
        posting.job_type,
        posting.salary,
        posting.description,
        posting.requirements.join("\n"),
        posting.tags.join(", "),
        posting.contact_email,
    );

    EmailMessage {
        to: operator_email.to_string(),
        subject: format!("New Job Posting: {} at {}", posting.title, posting.company),
        text,
        html,
    }
}

/// Notifies the job's contact address that a candidate has applied.
pub fn new_applicant_notice(application: &ApplicationRow) -> EmailMessage {
    let location = [
        application.address.as_deref(),
        application.city.as_deref(),
        application.state.as_deref(),
        application.zip_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ");

    let html = format!(
        "<h2>New Application for {job_title}</h2>\
         <p><strong>Name:</strong> {first} {last}</p>\
         <p><strong>Email:</strong> {email}</p>\
         <p><strong>Phone:</strong> {phone}</p>\
         <p><strong>Location:</strong> {location}</p>\
         <p><a href=\"{resume}\" target=\"_blank\">View Resume</a></p>",
        job_title = application.job_title,
        first = application.first_name,
        last = application.last_name,
        email = application.email,
        phone = application.phone,
        resume = application.resume_url,
    );

    let text = format!(
        "New application for {} at {}\n\n\
         Name: {} {}\nEmail: {}\nPhone: {}\nLocation: {}\nResume: {}",
        application.job_title,
        application.job_company,
        application.first_name,
        application.last_name,
        application.email,
        application.phone,
        location,
        application.resume_url,
    );

    EmailMessage {
        to: application.job_email.clone(),
        subject: format!(
            "New Application for {} at {}",
            application.job_title, application.job_company
        ),
        text,
        html,
    }
}

/// Tells the candidate the employer's decision. Subject and body differ by
/// outcome; only terminal statuses have a letter.
pub fn decision_notice(application: &ApplicationRow, status: ApplicantStatus) -> Option<EmailMessage> {
    let (subject, text, html) = match status {
        ApplicantStatus::Reject => (
            format!("Application Status: Rejected for {}", application.job_title),
            format!(
                "Dear {first},\n\nWe regret to inform you that your application for {title} at {company} has been rejected.\n\nBest regards,\n{company}",
                first = application.first_name,
                title = application.job_title,
                company = application.job_company,
            ),
            format!(
                "<p>Dear {first},</p>\
                 <p>We regret to inform you that your application for <strong>{title}</strong> at <strong>{company}</strong> has been rejected.</p>\
                 <p>Best regards,<br/>{company}</p>",
                first = application.first_name,
                title = application.job_title,
                company = application.job_company,
            ),
        ),
        ApplicantStatus::ReadyToInterview => (
            format!(
                "Application Status: Ready for Interview for {}",
                application.job_title
            ),
            format!(
                "Dear {first},\n\nCongratulations! Your application for {title} at {company} is ready for an interview.\n\nBest regards,\n{company}",
                first = application.first_name,
                title = application.job_title,
                company = application.job_company,
            ),
            format!(
                "<p>Dear {first},</p>\
                 <p>Congratulations! Your application for <strong>{title}</strong> at <strong>{company}</strong> is ready for an interview.</p>\
                 <p>Best regards,<br/>{company}</p>",
                first = application.first_name,
                title = application.job_title,
                company = application.job_company,
            ),
        ),
        ApplicantStatus::Review => return None,
    };

    Some(EmailMessage {
        to: application.email.clone(),
        subject,
        text,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_posting() -> HireApplicationRow {
        HireApplicationRow {
            id: Uuid::new_v4(),
            job_id: "job-abc".to_string(),
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            job_type: "Full-time".to_string(),
            salary: "$120k".to_string(),
            description: "Build things".to_string(),
            requirements: vec!["Rust".to_string(), "SQL".to_string()],
            tags: vec!["backend".to_string()],
            contact_email: "hr@acme.com".to_string(),
            status: crate::models::posting::PostingStatus::Review,
            owner_identity: "user_1".to_string(),
            posted_at: Utc::now(),
        }
    }

    fn make_application() -> ApplicationRow {
        ApplicationRow {
            id: Uuid::new_v4(),
            job_id: "job-abc".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: None,
            city: Some("London".to_string()),
            state: None,
            zip_code: None,
            resume_url: "https://files.example.com/ada.pdf".to_string(),
            job_title: "Engineer".to_string(),
            job_company: "Acme".to_string(),
            job_email: "hr@acme.com".to_string(),
            status: ApplicantStatus::Review,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_review_notice_addresses_operator_with_admin_link() {
        let msg = posting_review_notice(&make_posting(), "ops@hireboard.io", "https://hireboard.io");
        assert_eq!(msg.to, "ops@hireboard.io");
        assert_eq!(msg.subject, "New Job Posting: Engineer at Acme");
        assert!(msg.html.contains("https://hireboard.io/admin?jobId=job-abc"));
        assert!(msg.text.contains("Rust"));
    }

    #[test]
    fn test_applicant_notice_goes_to_job_contact() {
        let msg = new_applicant_notice(&make_application());
        assert_eq!(msg.to, "hr@acme.com");
        assert!(msg.subject.contains("Engineer"));
        assert!(msg.html.contains("https://files.example.com/ada.pdf"));
        assert!(msg.text.contains("Ada Lovelace"));
    }

    #[test]
    fn test_reject_decision_wording() {
        let msg = decision_notice(&make_application(), ApplicantStatus::Reject).unwrap();
        assert_eq!(msg.to, "ada@example.com");
        assert_eq!(msg.subject, "Application Status: Rejected for Engineer");
        assert!(msg.text.contains("regret to inform"));
    }

    #[test]
    fn test_interview_decision_wording() {
        let msg = decision_notice(&make_application(), ApplicantStatus::ReadyToInterview).unwrap();
        assert_eq!(
            msg.subject,
            "Application Status: Ready for Interview for Engineer"
        );
        assert!(msg.text.contains("Congratulations"));
    }

    #[test]
    fn test_review_status_has_no_letter() {
        assert!(decision_notice(&make_application(), ApplicantStatus::Review).is_none());
    }
}
