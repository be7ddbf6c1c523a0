pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpScaleReader, RawTcpPrinter};
pub use config::TomlConfig;
pub use core::{
    registry::EndpointRegistry,
    station::{DispatchReceipt, ScaleStation},
    worker::{spawn_worker, Intent, Outcome, StationHandle},
};
pub use domain::model::{Field, LabelDocument, Measurement, PrinterEndpoint, ScaleEndpoint, TemplateKind};
pub use utils::error::{Result, ScaleIotError};
