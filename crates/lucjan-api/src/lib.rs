// lucjan-api: Async Rust client for the Lucjan boiler controller HTTP API

pub mod auth;
pub mod client;
pub mod config_text;
pub mod config_write;
pub mod control;
pub mod error;
pub mod status;
pub mod system;
pub mod transport;

pub use auth::Credentials;
pub use client::{DEFAULT_PORT, DeviceClient};
pub use config_text::{DeviceConfig, replace_param};
pub use config_write::{BoilerMode, CO_CIRCUIT_DISABLED, CO_CIRCUIT_ENABLED};
pub use control::{Circuit, Output};
pub use error::{Error, ErrorKind};
pub use status::StatusMap;
pub use system::SystemCommand;
pub use transport::{Timings, TransportConfig};
