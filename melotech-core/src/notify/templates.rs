//! Default status email templates.

use super::{MessageTemplates, RenderedEmail};
use crate::events::NotifiableStatus;

/// Built-in templates for accepted / rejected / pending.
///
/// Unknown statuses render the pending template.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusTemplates;

const SIGNATURE_HTML: &str = r#"<hr style="margin: 20px 0;">
<p style="color: #6b7280; font-size: 14px;">Best regards,<br>The MeloTech Team</p>"#;

fn html_page(heading_color: &str, heading: &str, body: &str) -> String {
    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
<h2 style="color: {heading_color};">{heading}</h2>
{body}
{SIGNATURE_HTML}
</body>
</html>"#
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl MessageTemplates for StatusTemplates {
    fn render(&self, status: &str, title: &str, feedback: &str) -> RenderedEmail {
        let status = status
            .parse::<NotifiableStatus>()
            .unwrap_or(NotifiableStatus::Pending);
        let t = escape_html(title);
        let feedback_html = if feedback.is_empty() {
            String::new()
        } else {
            format!(
                "<p><strong>Feedback:</strong> {}</p>\n",
                escape_html(feedback)
            )
        };
        let feedback_text = if feedback.is_empty() {
            String::new()
        } else {
            format!("Feedback: {feedback} ")
        };

        match status {
            NotifiableStatus::Accepted => RenderedEmail {
                subject: "🎉 Your Submission Has Been Accepted!".to_owned(),
                html: html_page(
                    "#10b981",
                    "Great News!",
                    &format!(
                        "<p>Your submission \"<strong>{t}</strong>\" has been <strong>accepted</strong>!</p>\n\
                         <p>Congratulations! We're excited to work with you on this project.</p>\n\
                         {feedback_html}\
                         <p>Thank you for your submission and we look forward to hearing more from you!</p>"
                    ),
                ),
                text: format!(
                    "Great News! Your submission '{title}' has been accepted! Congratulations! \
                     We're excited to work with you on this project. {feedback_text}\
                     Thank you for your submission and we look forward to hearing more from you! \
                     Best regards, The MeloTech Team"
                ),
            },
            NotifiableStatus::Rejected => RenderedEmail {
                subject: "Update on Your Submission".to_owned(),
                html: html_page(
                    "#ef4444",
                    "Submission Update",
                    &format!(
                        "<p>Thank you for your submission \"<strong>{t}</strong>\".</p>\n\
                         <p>Unfortunately, we won't be able to move forward with this particular submission at this time.</p>\n\
                         {feedback_html}\
                         <p>We encourage you to keep creating and submitting new work. We're always looking for fresh talent!</p>"
                    ),
                ),
                text: format!(
                    "Thank you for your submission '{title}'. Unfortunately, we won't be able to \
                     move forward with this particular submission at this time. {feedback_text}\
                     We encourage you to keep creating and submitting new work. We're always \
                     looking for fresh talent! Best regards, The MeloTech Team"
                ),
            },
            NotifiableStatus::Pending => RenderedEmail {
                subject: "Your Submission is Under Review".to_owned(),
                html: html_page(
                    "#f59e0b",
                    "Submission Under Review",
                    &format!(
                        "<p>Your submission \"<strong>{t}</strong>\" is now under review.</p>\n\
                         <p>We'll get back to you as soon as possible with our decision.</p>\n\
                         <p>Thank you for your patience!</p>"
                    ),
                ),
                text: format!(
                    "Your submission '{title}' is now under review. We'll get back to you as soon \
                     as possible with our decision. Thank you for your patience! Best regards, \
                     The MeloTech Team"
                ),
            },
        }
    }
}
