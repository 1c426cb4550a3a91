//! Factory for creating device registration repositories

use crate::repositories::device_registration_sql::SqlDeviceRegistrationRepository;
use crate::{DbClient, RepositoryFactory};

/// Factory for creating device registration repositories
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistrationRepositoryFactory;

impl DeviceRegistrationRepositoryFactory {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlDeviceRegistrationRepository, DbClient>
    for DeviceRegistrationRepositoryFactory
{
    fn create_repository(&self, db_client: DbClient) -> SqlDeviceRegistrationRepository {
        SqlDeviceRegistrationRepository::new(db_client)
    }
}
