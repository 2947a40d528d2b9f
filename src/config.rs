#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub from_email: String,
    pub smtp: Option<SmtpConfig>,
}

/// SMTP relay settings. When absent the mailer logs messages instead of
/// sending them (development / test backend).
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let secret_key = std::env::var("SECRET_KEY").expect("SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let from_email =
            std::env::var("FROM_EMAIL").unwrap_or_else(|_| "noreply@reviewdb.local".to_string());

        // SMTP is optional: all four variables present, or the console
        // fallback is used.
        let smtp = match (
            std::env::var("SMTP_SERVER"),
            std::env::var("SMTP_PORT"),
            std::env::var("SMTP_USERNAME"),
            std::env::var("SMTP_PASSWORD"),
        ) {
            (Ok(server), Ok(port), Ok(username), Ok(password)) => Some(SmtpConfig {
                server,
                port: port.parse::<u16>().expect("SMTP_PORT must be a port number"),
                username,
                password,
            }),
            _ => None,
        };

        Config {
            database_url,
            secret_key,
            jwt_maxage: jwt_maxage.parse::<i64>().expect("JWT_MAXAGE must be an integer"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8000),
            from_email,
            smtp,
        }
    }
}
