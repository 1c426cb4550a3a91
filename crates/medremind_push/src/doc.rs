use utoipa::OpenApi;

use crate::handlers::{
    RegisterDeviceRequest, SendAlarmRequest, UnregisterDeviceRequest, UnregisterDeviceResponse,
};
use crate::models::{DeliveryOutcome, DeliveryStatus, DeviceRegistration, DispatchReport, Platform};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::register_device_handler,
        crate::handlers::unregister_device_handler,
        crate::handlers::send_alarm_handler,
    ),
    components(
        schemas(
            RegisterDeviceRequest,
            UnregisterDeviceRequest,
            UnregisterDeviceResponse,
            SendAlarmRequest,
            DeviceRegistration,
            Platform,
            DispatchReport,
            DeliveryOutcome,
            DeliveryStatus,
        )
    ),
    tags(
        (name = "Push", description = "Device registration and alarm push delivery")
    ),
    servers(
        (url = "/api", description = "MedRemind API server")
    )
)]
pub struct PushApiDoc;
