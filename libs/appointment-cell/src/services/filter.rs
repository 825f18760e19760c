use std::str::FromStr;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl FromStr for StatusFilter {
    type Err = AppointmentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() || raw == "all" {
            return Ok(StatusFilter::All);
        }
        raw.parse().map(StatusFilter::Only)
    }
}

/// The list view's search box and status dropdown, applied after fetching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentListFilter {
    pub search: String,
    pub status: StatusFilter,
}

impl AppointmentListFilter {
    pub fn new(search: Option<&str>, status: Option<&str>) -> Result<Self, AppointmentError> {
        Ok(Self {
            search: search.unwrap_or_default().to_string(),
            status: status.map(str::parse::<StatusFilter>).transpose()?.unwrap_or_default(),
        })
    }

    /// Case-insensitive substring match on patient name or reason for visit,
    /// combined with an exact status match.
    pub fn matches(&self, appointment: &Appointment) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = appointment.patient_name.to_lowercase().contains(&needle)
            || appointment.reason_for_visit.to_lowercase().contains(&needle);

        let matches_status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => appointment.status == status,
        };

        matches_search && matches_status
    }

    pub fn apply(&self, appointments: Vec<Appointment>) -> Vec<Appointment> {
        appointments
            .into_iter()
            .filter(|appointment| self.matches(appointment))
            .collect()
    }
}
