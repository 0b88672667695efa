//! Loan lifecycle service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::EquipmentCondition,
        loan::{
            validate_loan_dates, BulkFailure, BulkStatusResult, BulkStatusUpdate, CancelLoan,
            CreateLoan, Loan, LoanDetails, LoanQuery, LoanStats, LoanStatus, ReturnLoan,
            UpdateLoan,
        },
        Page,
    },
    repository::Repository,
    services::export,
};

/// Reason recorded for loans cancelled in bulk without an explicit one
const BULK_CANCEL_REASON: &str = "Cancelled in bulk";

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Lend an available equipment item to a patient
    pub async fn create_loan(&self, data: CreateLoan, created_by: i32) -> AppResult<LoanDetails> {
        let start_date = data.start_date.unwrap_or_else(Utc::now);
        validate_loan_dates(start_date, data.expected_return_date)?;

        let loan = self.repository.loans.create(&data, start_date, created_by).await?;
        self.get_loan(loan.id).await
    }

    /// Get one loan with patient and equipment summaries
    pub async fn get_loan(&self, id: i32) -> AppResult<LoanDetails> {
        let row = self.repository.loans.get_row(id).await?;
        Ok(row.into_details(Utc::now()))
    }

    /// Search loans
    pub async fn list_loans(&self, query: &LoanQuery) -> AppResult<Page<LoanDetails>> {
        let (rows, total) = self.repository.loans.list(query).await?;
        let now = Utc::now();
        let items = rows.into_iter().map(|row| row.into_details(now)).collect();
        Ok(Page::new(items, total, &query.pagination()))
    }

    /// Loans of one patient, most recent first
    pub async fn patient_loans(&self, patient_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository.patients.get_by_id(patient_id).await?;
        let now = Utc::now();
        Ok(self
            .repository
            .loans
            .list_for_patient(patient_id)
            .await?
            .into_iter()
            .map(|row| row.into_details(now))
            .collect())
    }

    /// Loans of one equipment item, most recent first
    pub async fn equipment_loans(&self, equipment_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository.equipment.get_by_id(equipment_id).await?;
        let now = Utc::now();
        Ok(self
            .repository
            .loans
            .list_for_equipment(equipment_id)
            .await?
            .into_iter()
            .map(|row| row.into_details(now))
            .collect())
    }

    /// Close a loan as returned
    pub async fn return_loan(&self, id: i32, data: ReturnLoan, closed_by: i32) -> AppResult<LoanDetails> {
        self.repository
            .loans
            .return_loan(id, data.condition, data.notes.as_deref(), closed_by)
            .await?;
        self.get_loan(id).await
    }

    /// Cancel an open loan
    pub async fn cancel_loan(&self, id: i32, data: CancelLoan, closed_by: i32) -> AppResult<LoanDetails> {
        self.repository.loans.cancel(id, data.reason.trim(), closed_by).await?;
        self.get_loan(id).await
    }

    /// Edit the expected return date or notes of an open loan
    pub async fn update_loan(&self, id: i32, data: UpdateLoan) -> AppResult<LoanDetails> {
        self.repository.loans.update(id, &data).await?;
        self.get_loan(id).await
    }

    /// Delete a completed or cancelled loan
    pub async fn delete_loan(&self, id: i32) -> AppResult<()> {
        self.repository.loans.delete(id).await
    }

    /// Move several loans to `completed` or `cancelled`.
    ///
    /// Each loan goes through the same transition as the single-loan
    /// operations; failures are reported per id and do not stop the batch.
    pub async fn bulk_update_status(
        &self,
        data: BulkStatusUpdate,
        closed_by: i32,
    ) -> AppResult<BulkStatusResult> {
        if !data.status.is_closed() {
            return Err(AppError::Validation(format!(
                "Bulk status must be completed or cancelled, got {}",
                data.status
            )));
        }

        let mut ids = data.ids.clone();
        ids.sort_unstable();
        ids.dedup();

        let condition = data.condition.unwrap_or(EquipmentCondition::Good);
        let reason = data
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(BULK_CANCEL_REASON);

        let mut result = BulkStatusResult::default();
        for id in ids {
            let outcome: AppResult<Loan> = match data.status {
                LoanStatus::Completed => {
                    self.repository.loans.return_loan(id, condition, None, closed_by).await
                }
                _ => self.repository.loans.cancel(id, reason, closed_by).await,
            };
            match outcome {
                Ok(_) => result.updated.push(id),
                Err(e) => result.failed.push(BulkFailure {
                    id,
                    message: e.to_string(),
                }),
            }
        }

        tracing::info!(
            status = %data.status,
            updated = result.updated.len(),
            failed = result.failed.len(),
            "Bulk loan status update"
        );
        Ok(result)
    }

    /// Loan counters by status
    pub async fn stats(&self) -> AppResult<LoanStats> {
        self.repository.loans.stats().await
    }

    /// CSV rendition of the loans matching the query (pagination ignored)
    pub async fn export_csv(&self, query: &LoanQuery) -> AppResult<String> {
        let now = Utc::now();
        let loans: Vec<LoanDetails> = self
            .repository
            .loans
            .list_for_export(query)
            .await?
            .into_iter()
            .map(|row| row.into_details(now))
            .collect();
        Ok(export::loans_to_csv(&loans))
    }
}
