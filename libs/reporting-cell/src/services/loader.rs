use std::fmt::Display;

use tracing::{debug, error, warn};

use appointment_cell::models::Appointment;
use appointment_cell::services::AppointmentStore;
use patient_cell::models::Patient;
use patient_cell::services::PatientService;
use shared_utils::Clock;

use crate::models::{LoadedCollection, ReportSnapshot};
use crate::services::aggregator::{appointment_stats, patient_stats, prescription_stats};

pub const PATIENTS_LOAD_FAILED: &str = "Failed to load patients";
pub const APPOINTMENTS_LOAD_FAILED: &str = "Failed to load appointments";

/// Fetch patients and appointments concurrently and summarise them.
///
/// The two fetches fail independently: a failed side contributes an empty
/// collection and a warning, and the other side's statistics are still built.
pub async fn load_report(
    patients: &PatientService,
    appointments: &AppointmentStore,
    clock: &dyn Clock,
) -> ReportSnapshot {
    debug!("Loading report data");

    let (patients, appointments) = tokio::join!(
        patients.list_patients(),
        appointments.list(None),
    );

    let patients = collect(patients, PATIENTS_LOAD_FAILED);
    let appointments = collect(appointments, APPOINTMENTS_LOAD_FAILED);

    build_snapshot(patients, appointments, clock)
}

fn collect<T, E: Display>(result: Result<Vec<T>, E>, failure: &str) -> LoadedCollection<T> {
    match result {
        Ok(items) => LoadedCollection::loaded(items),
        Err(e) => {
            error!("{}: {}", failure, e);
            LoadedCollection::failed(failure)
        }
    }
}

pub fn build_snapshot(
    patients: LoadedCollection<Patient>,
    appointments: LoadedCollection<Appointment>,
    clock: &dyn Clock,
) -> ReportSnapshot {
    let now = clock.now();
    let warnings: Vec<String> = [&patients.error, &appointments.error]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    if !warnings.is_empty() {
        warn!("Report built from partial data: {:?}", warnings);
    }

    ReportSnapshot {
        generated_at: now,
        patient_stats: patient_stats(&patients.items, now),
        appointment_stats: appointment_stats(&appointments.items),
        prescription_stats: prescription_stats(&patients.items),
        warnings,
    }
}
