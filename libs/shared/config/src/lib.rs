use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub business_utc_offset_minutes: i32,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub firm_name: String,
    pub lawyer_email_domain: String,
    pub app_base_url: String,
    pub store_timeout_seconds: u64,
    pub port: u16,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            session_secret: String::new(),
            session_ttl_hours: 24 * 7,
            business_utc_offset_minutes: -180,
            email_api_url: String::new(),
            email_api_key: String::new(),
            email_from: String::new(),
            firm_name: "FGJN Advocacia".to_string(),
            lawyer_email_domain: "fgjn.adv.br".to_string(),
            app_base_url: "http://localhost:3000".to_string(),
            store_timeout_seconds: 10,
            port: 3000,
            admin_email: String::new(),
            admin_name: "Administrador".to_string(),
            admin_password: String::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, falling back to the in-memory store");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SESSION_SECRET not set, using empty value");
                    String::new()
                }),
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", defaults.session_ttl_hours),
            business_utc_offset_minutes: parse_or(
                "BUSINESS_UTC_OFFSET_MINUTES",
                defaults.business_utc_offset_minutes,
            ),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| {
                    warn!("EMAIL_API_URL not set, e-mails will only be logged");
                    String::new()
                }),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM").unwrap_or_default(),
            firm_name: env::var("FIRM_NAME").unwrap_or(defaults.firm_name),
            lawyer_email_domain: env::var("LAWYER_EMAIL_DOMAIN")
                .unwrap_or(defaults.lawyer_email_domain),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("APP_BASE_URL not set, using default");
                    defaults.app_base_url
                }),
            store_timeout_seconds: parse_or("STORE_TIMEOUT_SECONDS", defaults.store_timeout_seconds),
            port: parse_or("PORT", defaults.port),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
            admin_name: env::var("ADMIN_NAME").unwrap_or(defaults.admin_name),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_default(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Settings the server cannot start without.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.session_secret.trim().is_empty() {
            missing.push("SESSION_SECRET");
        }
        missing
    }

    /// An initial administrator is provisioned when both are set.
    pub fn is_admin_seed_configured(&self) -> bool {
        !self.admin_email.trim().is_empty() && !self.admin_password.is_empty()
    }

    pub fn is_store_remote(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.email_api_url.is_empty()
            && !self.email_api_key.is_empty()
            && !self.email_from.is_empty()
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_secret_is_reported() {
        let config = AppConfig::default();
        assert_eq!(config.missing_required(), vec!["SESSION_SECRET"]);
        assert!(!config.is_configured());

        let config = AppConfig {
            session_secret: "   ".to_string(),
            ..AppConfig::default()
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn test_configured_with_secret() {
        let config = AppConfig {
            session_secret: "a-long-signing-secret".to_string(),
            ..AppConfig::default()
        };
        assert!(config.missing_required().is_empty());
        assert!(config.is_configured());
    }

    #[test]
    fn test_admin_seed_needs_email_and_password() {
        let mut config = AppConfig::default();
        assert!(!config.is_admin_seed_configured());

        config.admin_email = "socio@fgjn.adv.br".to_string();
        assert!(!config.is_admin_seed_configured());

        config.admin_password = "troque-esta-senha".to_string();
        assert!(config.is_admin_seed_configured());
    }
}
