//! Equipment inventory service

use crate::{
    error::AppResult,
    models::{
        equipment::{
            CreateEquipment, CreateMaintenance, Equipment, EquipmentDetails, EquipmentQuery,
            MaintenanceRecord, UpdateEquipment,
        },
        Page,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<Page<Equipment>> {
        let (items, total) = self.repository.equipment.list(query).await?;
        Ok(Page::new(items, total, &query.pagination()))
    }

    pub async fn list_available(&self) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list_available().await
    }

    /// Equipment with the patient currently holding it
    pub async fn get(&self, id: i32) -> AppResult<EquipmentDetails> {
        let equipment = self.repository.equipment.get_by_id(id).await?;
        let current_borrower = self.repository.equipment.current_borrower(id).await?;
        Ok(EquipmentDetails {
            equipment,
            current_borrower,
        })
    }

    pub async fn create(&self, data: CreateEquipment) -> AppResult<Equipment> {
        let equipment = self.repository.equipment.create(&data).await?;
        tracing::info!(equipment_id = equipment.id, serial = %equipment.serial_number, "Equipment created");
        Ok(equipment)
    }

    pub async fn update(&self, id: i32, data: UpdateEquipment) -> AppResult<Equipment> {
        self.repository.equipment.update(id, &data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.equipment.delete(id).await?;
        tracing::info!(equipment_id = id, "Equipment deleted");
        Ok(())
    }

    pub async fn maintenance_history(&self, id: i32) -> AppResult<Vec<MaintenanceRecord>> {
        self.repository.equipment.get_by_id(id).await?;
        self.repository.equipment.list_maintenance(id).await
    }

    pub async fn add_maintenance(&self, id: i32, data: CreateMaintenance) -> AppResult<MaintenanceRecord> {
        let record = self.repository.equipment.add_maintenance(id, &data).await?;
        tracing::info!(equipment_id = id, record_id = record.id, "Maintenance recorded");
        Ok(record)
    }
}
