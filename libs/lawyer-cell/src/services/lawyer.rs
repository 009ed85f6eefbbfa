use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{store::to_document, DocumentStore, Filter, StoreError};
use shared_models::auth::{Role, SessionContext, UserRecord};
use shared_models::collections::{APPOINTMENTS_COLLECTION, USERS_COLLECTION};
use shared_utils::password::{generate_temporary_password, hash_password};
use shared_utils::session::SessionManager;

use crate::models::{
    LawyerAvailability, LawyerCredentials, LawyerDeletion, LawyerError, UpsertLawyerRequest,
    UpsertLawyerResponse, MAX_BIO_CHARS,
};
use crate::services::repository::LawyerRepository;
use crate::services::schedule::{format_price_label, minutes_since_midnight, parse_time_of_day};

const TEMPORARY_PASSWORD_LENGTH: usize = 10;
const MAX_EMAIL_ATTEMPTS: usize = 50;

/// Validated form of an upsert request.
struct LawyerInput {
    name: String,
    specialty: String,
    price_cents: i64,
    from_week_day: u8,
    to_week_day: u8,
    from_time: String,
    to_time: String,
    bio: Option<String>,
}

fn validate(request: &UpsertLawyerRequest) -> Result<LawyerInput, LawyerError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(LawyerError::Validation("Name is required".to_string()));
    }

    let specialty = request.specialty.trim();
    if specialty.is_empty() {
        return Err(LawyerError::Validation("Specialty is required".to_string()));
    }

    if request.appointment_price_cents < 1 {
        return Err(LawyerError::Validation("Appointment price must be at least 1 cent".to_string()));
    }

    let week_day = |value: i64, field: &str| -> Result<u8, LawyerError> {
        u8::try_from(value)
            .ok()
            .filter(|day| *day <= 6)
            .ok_or_else(|| LawyerError::Validation(format!("{} must be between 0 and 6", field)))
    };
    let from_week_day = week_day(request.available_from_week_day, "availableFromWeekDay")?;
    let to_week_day = week_day(request.available_to_week_day, "availableToWeekDay")?;
    if from_week_day > to_week_day {
        return Err(LawyerError::Validation(
            "availableFromWeekDay must not be after availableToWeekDay".to_string(),
        ));
    }

    let from_time = parse_time_of_day(&request.available_from_time).ok_or_else(|| {
        LawyerError::Validation("availableFromTime must be HH:MM or HH:MM:SS".to_string())
    })?;
    let to_time = parse_time_of_day(&request.available_to_time).ok_or_else(|| {
        LawyerError::Validation("availableToTime must be HH:MM or HH:MM:SS".to_string())
    })?;
    if minutes_since_midnight(from_time) >= minutes_since_midnight(to_time) {
        return Err(LawyerError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }

    let bio = request
        .bio
        .as_deref()
        .map(str::trim)
        .filter(|bio| !bio.is_empty())
        .map(str::to_string);
    if bio.as_ref().map_or(false, |bio| bio.chars().count() > MAX_BIO_CHARS) {
        return Err(LawyerError::Validation(format!(
            "Bio must have at most {} characters",
            MAX_BIO_CHARS
        )));
    }

    Ok(LawyerInput {
        name: name.to_string(),
        specialty: specialty.to_string(),
        price_cents: request.appointment_price_cents,
        from_week_day,
        to_week_day,
        from_time: from_time.format("%H:%M:%S").to_string(),
        to_time: to_time.format("%H:%M:%S").to_string(),
        bio,
    })
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}

/// `"João  da Silva"` becomes `"joao.da.silva"`.
pub fn login_base_from_name(name: &str) -> String {
    let folded: String = name.chars().map(fold_accent).collect::<String>().to_lowercase();
    let cleaned: String = folded
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    let base = Regex::new(r"\s+")
        .map(|re| re.replace_all(cleaned.trim(), ".").into_owned())
        .unwrap_or_else(|_| cleaned.split_whitespace().collect::<Vec<_>>().join("."));

    if base.is_empty() {
        "advogado".to_string()
    } else {
        base
    }
}

fn candidate_email(base: &str, attempt: usize, domain: &str) -> String {
    if attempt == 0 {
        format!("{}@{}", base, domain)
    } else {
        format!("{}{}@{}", base, attempt, domain)
    }
}

pub struct LawyerService {
    store: Arc<dyn DocumentStore>,
    lawyers: LawyerRepository,
    sessions: Arc<SessionManager>,
    email_domain: String,
}

impl LawyerService {
    pub fn new(config: &AppConfig, store: Arc<dyn DocumentStore>, sessions: Arc<SessionManager>) -> Self {
        Self {
            lawyers: LawyerRepository::new(store.clone()),
            store,
            sessions,
            email_domain: config.lawyer_email_domain.clone(),
        }
    }

    /// Creates a lawyer (with an admin login) when `id` is absent, otherwise updates it.
    #[instrument(skip(self, session, request), fields(admin = %session.user_id))]
    pub async fn upsert_lawyer(
        &self,
        session: &SessionContext,
        request: UpsertLawyerRequest,
    ) -> Result<UpsertLawyerResponse, LawyerError> {
        session.require_admin()?;
        let input = validate(&request)?;

        match request.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(lawyer_id) => self.update_lawyer(lawyer_id, input).await,
            None => self.create_lawyer(input).await,
        }
    }

    async fn update_lawyer(&self, lawyer_id: &str, input: LawyerInput) -> Result<UpsertLawyerResponse, LawyerError> {
        if self.lawyers.get(lawyer_id).await?.is_none() {
            return Err(LawyerError::NotFound);
        }

        let now = Utc::now();
        let patch = json!({
            "name": input.name,
            "specialty": input.specialty,
            "appointmentPriceCents": input.price_cents,
            "appointmentPriceLabel": format_price_label(input.price_cents),
            "availableFromWeekDay": input.from_week_day,
            "availableToWeekDay": input.to_week_day,
            "availableFromTime": input.from_time,
            "availableToTime": input.to_time,
            "bio": input.bio,
            "updatedAt": now,
        });

        let lawyer = self.lawyers.update(lawyer_id, patch).await?;

        if let Err(e) = self.store
            .update(USERS_COLLECTION, lawyer_id, json!({ "name": lawyer.name, "updatedAt": now }), &[])
            .await
        {
            warn!("Lawyer {} updated but user record was not: {}", lawyer_id, e);
        }

        info!("Lawyer {} updated", lawyer_id);
        Ok(UpsertLawyerResponse { lawyer, credentials: None, created: false })
    }

    async fn create_lawyer(&self, input: LawyerInput) -> Result<UpsertLawyerResponse, LawyerError> {
        let temporary_password = generate_temporary_password(TEMPORARY_PASSWORD_LENGTH);
        let password_hash = hash_password(&temporary_password)
            .map_err(|e| LawyerError::PasswordHash(e.to_string()))?;

        let user_id = format!("user_{}", Uuid::new_v4().simple());
        let now = Utc::now();
        let email = self.insert_lawyer_user(&user_id, &input.name, password_hash).await?;

        let lawyer = LawyerAvailability {
            id: user_id.clone(),
            lawyer_id: user_id.clone(),
            name: input.name,
            email: email.clone(),
            specialty: input.specialty,
            appointment_price_cents: input.price_cents,
            appointment_price_label: format_price_label(input.price_cents),
            available_from_week_day: input.from_week_day,
            available_to_week_day: input.to_week_day,
            available_from_time: input.from_time,
            available_to_time: input.to_time,
            bio: input.bio,
            created_at: now,
            updated_at: None,
        };

        if let Err(e) = self.lawyers.insert(&lawyer).await {
            error!("Lawyer record insert failed, removing user {}: {}", user_id, e);
            if let Err(cleanup) = self.store.delete(USERS_COLLECTION, &user_id).await {
                error!("Failed to remove orphaned lawyer user {}: {}", user_id, cleanup);
            }
            return Err(e.into());
        }

        info!("Lawyer {} created with login {}", user_id, email);
        Ok(UpsertLawyerResponse {
            lawyer,
            credentials: Some(LawyerCredentials { email, temporary_password }),
            created: true,
        })
    }

    /// Inserts the admin user under the first free `name[N]@domain` login.
    async fn insert_lawyer_user(
        &self,
        user_id: &str,
        name: &str,
        password_hash: String,
    ) -> Result<String, LawyerError> {
        let base = login_base_from_name(name);

        for attempt in 0..MAX_EMAIL_ATTEMPTS {
            let email = candidate_email(&base, attempt, &self.email_domain);

            let user = UserRecord {
                id: user_id.to_string(),
                name: name.to_string(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                role: Role::Admin,
                email_verified: true,
                verification_token: None,
                created_at: Utc::now(),
                updated_at: None,
            };

            match self.store
                .insert_unique(USERS_COLLECTION, user_id, to_document(&user)?, &[Filter::eq("email", email.as_str())])
                .await
            {
                Ok(()) => return Ok(email),
                Err(StoreError::Conflict(_)) => {
                    debug!("Login {} taken, trying next suffix", email);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(LawyerError::EmailExhausted)
    }

    pub async fn list_lawyers(&self, session: &SessionContext) -> Result<Vec<LawyerAvailability>, LawyerError> {
        debug!("Listing lawyers for {}", session.user_id);
        Ok(self.lawyers.list().await?)
    }

    pub async fn get_lawyer(&self, session: &SessionContext, lawyer_id: &str) -> Result<LawyerAvailability, LawyerError> {
        debug!("Fetching lawyer {} for {}", lawyer_id, session.user_id);
        self.lawyers.get(lawyer_id).await?.ok_or(LawyerError::NotFound)
    }

    /// Removes the lawyer together with its login, sessions and appointments.
    #[instrument(skip(self, session), fields(admin = %session.user_id))]
    pub async fn delete_lawyer(&self, session: &SessionContext, lawyer_id: &str) -> Result<LawyerDeletion, LawyerError> {
        session.require_admin()?;

        let lawyer = self.lawyers.get(lawyer_id).await?.ok_or(LawyerError::NotFound)?;

        let appointments = self.store
            .query(APPOINTMENTS_COLLECTION, &[Filter::eq("lawyerId", lawyer_id)], None)
            .await?;

        let mut appointments_removed = 0;
        for appointment in &appointments {
            if let Some(id) = appointment.get("id").and_then(|v| v.as_str()) {
                if self.store.delete(APPOINTMENTS_COLLECTION, id).await? {
                    appointments_removed += 1;
                }
            }
        }

        let sessions_removed = self.sessions.revoke_all_for_user(lawyer_id).await?;

        self.store.delete(USERS_COLLECTION, lawyer_id).await?;
        self.lawyers.delete(lawyer_id).await?;

        info!(
            "Lawyer {} deleted ({} appointments, {} sessions removed)",
            lawyer_id, appointments_removed, sessions_removed
        );

        Ok(LawyerDeletion {
            lawyer_id: lawyer_id.to_string(),
            name: lawyer.name,
            appointments_removed,
            sessions_removed,
        })
    }
}
