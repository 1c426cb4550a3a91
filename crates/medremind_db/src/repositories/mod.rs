//! Repository modules for database access

pub mod device_registration;
pub mod device_registration_factory;
pub mod device_registration_sql;

pub use device_registration::{DeviceRegistration, DeviceRegistrationRepository};
pub use device_registration_factory::DeviceRegistrationRepositoryFactory;
pub use device_registration_sql::SqlDeviceRegistrationRepository;
