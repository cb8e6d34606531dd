/// Email notifications over SMTP using lettre.
///
/// The password-change code is load-bearing (its failure fails the request);
/// verification decision emails are best-effort and only logged on failure.
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::SmtpTransport;
use lettre::{Message, Transport};

use crate::config::SmtpConfig;
use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct EmailService {
    config: SmtpConfig,
}

impl EmailService {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );

        Ok(SmtpTransport::builder_dangerous(&self.config.host)
            .port(self.config.port)
            .credentials(creds)
            .build())
    }

    fn sender(&self) -> Result<Mailbox> {
        self.config
            .from
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid sender address: {}", e)))
    }

    fn send(&self, to: &str, subject: &str, text: String, html: String) -> Result<()> {
        let message = Message::builder()
            .from(self.sender()?)
            .to(to
                .parse()
                .map_err(|e| AppError::Email(format!("Invalid recipient address: {}", e)))?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))?;

        self.transport()?.send(&message)?;
        Ok(())
    }

    /// The 6-digit password-change verification code. Valid for 5 minutes.
    pub fn send_password_code(&self, to: &str, username: &str, code: &str) -> Result<()> {
        let text = format!(
            "Hi {username},\n\n\
             Your VibeSync password change code is: {code}\n\n\
             The code expires in 5 minutes. If you did not request a password \
             change, you can ignore this email.\n"
        );
        let html = format!(
            "<p>Hi <strong>{username}</strong>,</p>\
             <p>Your VibeSync password change code is:</p>\
             <p style=\"font-size:24px;letter-spacing:4px\"><strong>{code}</strong></p>\
             <p>The code expires in 5 minutes. If you did not request a password \
             change, you can ignore this email.</p>"
        );

        self.send(to, "Your VibeSync password change code", text, html)
    }

    pub fn send_verification_approved(&self, to: &str, stage_name: &str) -> Result<()> {
        let text = format!(
            "Congratulations {stage_name}!\n\n\
             Your artist verification request has been approved. Your account \
             now has artist access: you can upload songs, create albums and \
             manage your artist profile.\n\nWelcome aboard,\nThe VibeSync team\n"
        );
        let html = format!(
            "<p>Congratulations <strong>{stage_name}</strong>!</p>\
             <p>Your artist verification request has been <strong>approved</strong>. \
             Your account now has artist access: you can upload songs, create albums \
             and manage your artist profile.</p>\
             <p>Welcome aboard,<br/>The VibeSync team</p>"
        );

        self.send(to, "Your artist verification was approved", text, html)
    }

    pub fn send_verification_rejected(&self, to: &str, stage_name: &str, reason: &str) -> Result<()> {
        let text = format!(
            "Hi {stage_name},\n\n\
             Unfortunately your artist verification request was not approved.\n\n\
             Reason: {reason}\n\n\
             You can submit a new request once the issue above is addressed.\n\n\
             The VibeSync team\n"
        );
        let html = format!(
            "<p>Hi <strong>{stage_name}</strong>,</p>\
             <p>Unfortunately your artist verification request was not approved.</p>\
             <p><strong>Reason:</strong> {reason}</p>\
             <p>You can submit a new request once the issue above is addressed.</p>\
             <p>The VibeSync team</p>"
        );

        self.send(to, "Your artist verification request", text, html)
    }
}
