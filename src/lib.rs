pub mod config;
pub mod device_control_client;
pub mod error;
pub mod http_client;
pub mod services;

pub use device_control_client::{
    DeviceConfig, DeviceControlClient, DoorController, DoorState, OperationResult,
};
pub use error::{ClientError, ErrorKind};
