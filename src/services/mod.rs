//! Business logic services

pub mod donors;
pub mod equipment;
pub mod export;
pub mod loans;
pub mod patients;
pub mod uploads;
pub mod users;
pub mod volunteers;
pub mod zakat;

use crate::{
    config::{AuthConfig, UploadsConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub users: users::UsersService,
    pub loans: loans::LoansService,
    pub equipment: equipment::EquipmentService,
    pub patients: patients::PatientsService,
    pub donors: donors::DonorsService,
    pub volunteers: volunteers::VolunteersService,
    pub zakat: zakat::ZakatService,
    pub uploads: uploads::UploadsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, uploads_config: UploadsConfig) -> Self {
        let uploads = uploads::UploadsService::new(uploads_config);
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            loans: loans::LoansService::new(repository.clone()),
            equipment: equipment::EquipmentService::new(repository.clone()),
            patients: patients::PatientsService::new(repository.clone(), uploads.clone()),
            donors: donors::DonorsService::new(repository.clone()),
            volunteers: volunteers::VolunteersService::new(repository.clone()),
            zakat: zakat::ZakatService::new(repository.clone()),
            uploads,
            repository,
        }
    }
}
