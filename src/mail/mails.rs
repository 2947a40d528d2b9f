use super::sendmail::send_email;
use crate::config::Config;

pub async fn send_confirmation_email(
    config: &Config,
    to_email: &str,
    username: &str,
    confirmation_code: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Registration confirmation";
    let body = format!(
        "Hello {},\n\nYour confirmation code: {}\n\n\
         Exchange it for an access token at /api/v1/auth/token.\n",
        username, confirmation_code
    );

    send_email(config, to_email, subject, body).await
}
