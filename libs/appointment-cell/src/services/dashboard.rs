use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc};
use tracing::{debug, instrument};

use lawyer_cell::services::schedule::{format_price_label, parse_price_label};
use shared_config::AppConfig;
use shared_database::{store::from_documents, DocumentStore, Filter, OrderBy};
use shared_models::auth::{SessionContext, UserRecord, USERS_COLLECTION};

use crate::models::{
    AdminDashboard, Appointment, AppointmentError, AppointmentStatus, ClientSummary, ClientsOverview,
    RankedEntry, StatusCounts, UserAppointments,
};
use crate::services::clock::{business_date, business_instant, business_offset};
use crate::services::repository::AppointmentRepository;

const TOP_ENTRIES: usize = 5;

fn rank<'a>(names: impl Iterator<Item = &'a str>) -> Vec<RankedEntry> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }

    let mut ranked: Vec<RankedEntry> = counts
        .into_iter()
        .map(|(name, count)| RankedEntry { name: name.to_string(), count })
        .collect();
    // BTreeMap order already breaks ties by name; sort is stable
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_ENTRIES);
    ranked
}

/// Aggregates over every appointment, newest request first.
pub fn build_admin_dashboard(
    mut appointments: Vec<Appointment>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> AdminDashboard {
    appointments.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));

    let today = business_date(now, offset);
    let month_start = business_instant(
        today.with_day(1).unwrap_or(today),
        NaiveTime::MIN,
        offset,
    );

    let confirmed: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Confirmed)
        .collect();

    let total_revenue_cents = confirmed
        .iter()
        .filter_map(|a| parse_price_label(&a.price_label))
        .sum();

    AdminDashboard {
        counts: StatusCounts::tally(&appointments),
        today_appointments: confirmed.iter().filter(|a| a.requested_date == today).count(),
        monthly_appointments: appointments.iter().filter(|a| a.requested_at >= month_start).count(),
        total_revenue_cents,
        total_revenue_label: format_price_label(total_revenue_cents),
        top_lawyers: rank(confirmed.iter().map(|a| a.lawyer_name.as_str())),
        top_specialties: rank(confirmed.iter().map(|a| a.specialty.as_str())),
        appointments,
    }
}

pub fn group_user_appointments(user_id: &str, appointments: Vec<Appointment>) -> UserAppointments {
    let counts = StatusCounts::tally(&appointments);
    let mut grouped = UserAppointments {
        user_id: user_id.to_string(),
        counts,
        pending: Vec::new(),
        confirmed: Vec::new(),
        cancelled: Vec::new(),
        completed: Vec::new(),
    };

    for appointment in appointments {
        match appointment.status {
            AppointmentStatus::Pending => grouped.pending.push(appointment),
            AppointmentStatus::Confirmed => grouped.confirmed.push(appointment),
            AppointmentStatus::Cancelled => grouped.cancelled.push(appointment),
            AppointmentStatus::Completed => grouped.completed.push(appointment),
        }
    }
    grouped
}

pub fn build_clients_overview(clients: Vec<UserRecord>, appointments: &[Appointment]) -> ClientsOverview {
    let clients: Vec<ClientSummary> = clients
        .into_iter()
        .map(|client| {
            let own: Vec<&Appointment> = appointments.iter().filter(|a| a.patient_id == client.id).collect();
            let counts = StatusCounts::tally(own.iter().copied());
            ClientSummary {
                last_contact: own.iter().map(|a| a.requested_at).max(),
                total_appointments: counts.total,
                pending_appointments: counts.pending,
                confirmed_appointments: counts.confirmed,
                id: client.id,
                name: client.name,
                email: client.email,
                created_at: client.created_at,
            }
        })
        .collect();

    ClientsOverview {
        total_clients: clients.len(),
        total_appointments: clients.iter().map(|c| c.total_appointments).sum(),
        total_pending: clients.iter().map(|c| c.pending_appointments).sum(),
        total_confirmed: clients.iter().map(|c| c.confirmed_appointments).sum(),
        clients,
    }
}

pub struct DashboardService {
    store: Arc<dyn DocumentStore>,
    appointments: AppointmentRepository,
    offset: FixedOffset,
}

impl DashboardService {
    pub fn new(config: &AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            appointments: AppointmentRepository::new(store.clone()),
            store,
            offset: business_offset(config.business_utc_offset_minutes),
        }
    }

    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn admin_dashboard(&self, session: &SessionContext) -> Result<AdminDashboard, AppointmentError> {
        session.require_admin()?;

        let appointments = self.appointments.list_all().await?;
        debug!("Building dashboard over {} appointments", appointments.len());
        Ok(build_admin_dashboard(appointments, Utc::now(), self.offset))
    }

    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn user_appointments(&self, session: &SessionContext, user_id: &str) -> Result<UserAppointments, AppointmentError> {
        session.require_owner_or_admin(user_id)?;

        let appointments = self.appointments.list_for_patient(user_id).await?;
        Ok(group_user_appointments(user_id, appointments))
    }

    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn clients_overview(&self, session: &SessionContext) -> Result<ClientsOverview, AppointmentError> {
        session.require_admin()?;

        let documents = self
            .store
            .query(USERS_COLLECTION, &[Filter::eq("role", "user")], Some(&OrderBy::desc("createdAt")))
            .await?;
        let clients: Vec<UserRecord> = from_documents(documents)?;
        let appointments = self.appointments.list_all().await?;

        Ok(build_clients_overview(clients, &appointments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn appointment(id: &str, lawyer: &str, specialty: &str, status: AppointmentStatus, date: NaiveDate, requested_at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: id.to_string(),
            patient_id: "user_1".to_string(),
            patient_name: "Maria".to_string(),
            patient_email: "maria@example.com".to_string(),
            lawyer_id: format!("lawyer_{}", lawyer),
            lawyer_name: lawyer.to_string(),
            specialty: specialty.to_string(),
            requested_date: date,
            requested_time: "10:00:00".to_string(),
            date_time: requested_at,
            description: "Consulta trabalhista".to_string(),
            price_label: "R$ 150,00".to_string(),
            status,
            requested_at,
            updated_at: requested_at,
            confirmed_at: None,
            notes: None,
        }
    }

    #[test]
    fn test_admin_dashboard_counts_and_revenue() {
        let offset = business_offset(-180);
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();

        let appointments = vec![
            appointment("a1", "Ana", "Civil", AppointmentStatus::Confirmed, today, now - Duration::days(2)),
            appointment("a2", "Bruno", "Trabalhista", AppointmentStatus::Confirmed, earlier, now - Duration::days(20)),
            appointment("a3", "Ana", "Civil", AppointmentStatus::Pending, today, now - Duration::hours(1)),
            appointment("a4", "Ana", "Civil", AppointmentStatus::Cancelled, today, now - Duration::hours(3)),
        ];

        let dashboard = build_admin_dashboard(appointments, now, offset);

        assert_eq!(dashboard.counts.total, 4);
        assert_eq!(dashboard.counts.confirmed, 2);
        assert_eq!(dashboard.counts.pending, 1);
        assert_eq!(dashboard.counts.cancelled, 1);
        assert_eq!(dashboard.today_appointments, 1);
        assert_eq!(dashboard.monthly_appointments, 3);
        assert_eq!(dashboard.total_revenue_cents, 30000);
        assert_eq!(dashboard.total_revenue_label, "R$ 300,00");
        assert_eq!(dashboard.appointments[0].id, "a3");

        // one confirmed each, tie broken by name
        assert_eq!(dashboard.top_lawyers[0].name, "Ana");
        assert_eq!(dashboard.top_lawyers[1].name, "Bruno");
        assert_eq!(dashboard.top_specialties.len(), 2);
    }

    #[test]
    fn test_group_user_appointments() {
        let now = Utc::now();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let grouped = group_user_appointments(
            "user_1",
            vec![
                appointment("a1", "Ana", "Civil", AppointmentStatus::Pending, date, now),
                appointment("a2", "Ana", "Civil", AppointmentStatus::Completed, date, now),
                appointment("a3", "Ana", "Civil", AppointmentStatus::Pending, date, now),
            ],
        );

        assert_eq!(grouped.counts.total, 3);
        assert_eq!(grouped.pending.len(), 2);
        assert_eq!(grouped.completed.len(), 1);
        assert!(grouped.confirmed.is_empty());
    }

    #[test]
    fn test_rank_limits_to_five() {
        let names = ["f", "e", "d", "c", "b", "a", "a"];
        let ranked = rank(names.iter().copied());

        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0], RankedEntry { name: "a".to_string(), count: 2 });
        assert_eq!(ranked[1].name, "b");
    }
}
