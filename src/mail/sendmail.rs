use lettre::{
    Message, SmtpTransport, Transport, message::header,
    transport::smtp::authentication::Credentials,
};

use crate::config::Config;

/// Send a plain-text email through the configured SMTP relay.
///
/// Without SMTP settings the message is written to the log instead — the
/// development/test backend. The relay connection is plaintext; TLS
/// termination belongs to the deployment in front of it.
pub async fn send_email(
    config: &Config,
    to_email: &str,
    subject: &str,
    body: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(smtp) = &config.smtp else {
        tracing::info!(to = %to_email, subject = %subject, "SMTP not configured, logging email: {}", body);
        return Ok(());
    };

    let email = Message::builder()
        .from(config.from_email.parse()?)
        .to(to_email.parse()?)
        .subject(subject)
        .header(header::ContentType::TEXT_PLAIN)
        .body(body)?;

    let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
    let mailer = SmtpTransport::builder_dangerous(&smtp.server)
        .port(smtp.port)
        .credentials(creds)
        .build();

    mailer.send(&email)?;

    Ok(())
}
