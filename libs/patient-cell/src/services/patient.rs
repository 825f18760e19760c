use std::sync::Arc;

use tracing::{debug, error};

use shared_database::{DocumentQuery, DocumentStore};

use crate::models::{Patient, PatientError, PATIENTS_COLLECTION};

pub struct PatientService {
    store: Arc<dyn DocumentStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, PatientError> {
        debug!("Fetching all patients");

        let result = self.store
            .query(PATIENTS_COLLECTION, &DocumentQuery::new())
            .await
            .map_err(|e| {
                error!("Error getting patients: {}", e);
                PatientError::DatabaseError(e.to_string())
            })?;

        let patients: Vec<Patient> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patients: {}", e)))?;

        debug!("Fetched {} patients", patients.len());
        Ok(patients)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Option<Patient>, PatientError> {
        debug!("Fetching patient: {}", patient_id);

        let document = self.store
            .get(PATIENTS_COLLECTION, patient_id)
            .await
            .map_err(|e| {
                error!("Error getting patient {}: {}", patient_id, e);
                PatientError::DatabaseError(e.to_string())
            })?;

        document
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))
    }
}
