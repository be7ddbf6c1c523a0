pub mod barcode;
pub mod label;
pub mod parser;
pub mod registry;
pub mod station;
pub mod store;
pub mod worker;

pub use crate::domain::model::{Field, LabelDocument, Measurement, TemplateKind};
pub use crate::domain::ports::{LabelSink, ScaleSource};
pub use crate::utils::error::Result;
