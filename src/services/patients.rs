//! Patient records service

use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        patient::{CreatePatient, Patient, PatientDetails, PatientQuery, PatientShort, UpdatePatient},
        Page,
    },
    repository::Repository,
    services::uploads::UploadsService,
};

#[derive(Clone)]
pub struct PatientsService {
    repository: Repository,
    uploads: UploadsService,
}

impl PatientsService {
    pub fn new(repository: Repository, uploads: UploadsService) -> Self {
        Self { repository, uploads }
    }

    pub async fn list(&self, query: &PatientQuery) -> AppResult<Page<PatientShort>> {
        let (items, total) = self.repository.patients.list(query).await?;
        Ok(Page::new(items, total, &query.pagination()))
    }

    /// Patient with borrowed equipment and loan history derived from loans
    pub async fn get(&self, id: i32) -> AppResult<PatientDetails> {
        let patient = self.repository.patients.get_by_id(id).await?;
        let now = Utc::now();

        let (borrowed_equipment, loan_history): (Vec<_>, Vec<_>) = self
            .repository
            .loans
            .list_for_patient(id)
            .await?
            .into_iter()
            .map(|row| row.into_details(now))
            .partition(|details| details.loan.status.is_open());

        Ok(PatientDetails {
            patient,
            active_loans: borrowed_equipment.len() as i64,
            borrowed_equipment,
            loan_history,
        })
    }

    pub async fn create(&self, data: CreatePatient) -> AppResult<Patient> {
        let patient = self.repository.patients.create(&data).await?;
        tracing::info!(patient_id = patient.id, "Patient created");
        Ok(patient)
    }

    pub async fn update(&self, id: i32, data: UpdatePatient) -> AppResult<Patient> {
        self.repository.patients.update(id, &data).await
    }

    /// Delete a patient without active loans, then their stored files
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let files = self.repository.patients.delete(id).await?;
        self.uploads.remove_all(&files).await;
        Ok(())
    }

    /// Store an uploaded document and attach it to the patient
    pub async fn add_file(&self, id: i32, file_name: &str, content: &[u8]) -> AppResult<Patient> {
        self.repository.patients.get_by_id(id).await?;
        let owner = format!("patient-{}", id);
        let path = self.uploads.store(&owner, file_name, content).await?;

        match self.repository.patients.add_file(id, &path).await {
            Ok(patient) => Ok(patient),
            Err(e) => {
                self.uploads.remove_all(std::slice::from_ref(&path)).await;
                Err(e)
            }
        }
    }

    /// Detach a document and remove it from disk
    pub async fn remove_file(&self, id: i32, path: &str) -> AppResult<Patient> {
        let patient = self.repository.patients.remove_file(id, path).await?;
        self.uploads.remove(path).await?;
        Ok(patient)
    }
}
