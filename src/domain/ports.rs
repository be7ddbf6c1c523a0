use crate::domain::model::{LabelDocument, Measurement, PrinterEndpoint};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Something that can produce a fresh reading from a scale URL.
#[async_trait]
pub trait ScaleSource: Send + Sync {
    async fn poll(&self, url: &str) -> Result<Measurement>;
}

/// Something that can hand a finished label to a printer.
#[async_trait]
pub trait LabelSink: Send + Sync {
    async fn dispatch(&self, printer: &PrinterEndpoint, doc: &LabelDocument) -> Result<()>;
}
