use crate::domain::model::{PrinterEndpoint, ScaleEndpoint};

/// Static lookup table of named scales and printers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRegistry {
    scales: Vec<ScaleEndpoint>,
    printers: Vec<PrinterEndpoint>,
}

impl EndpointRegistry {
    pub fn new(scales: Vec<ScaleEndpoint>, printers: Vec<PrinterEndpoint>) -> Self {
        Self { scales, printers }
    }

    pub fn scales(&self) -> &[ScaleEndpoint] {
        &self.scales
    }

    pub fn printers(&self) -> &[PrinterEndpoint] {
        &self.printers
    }

    pub fn resolve_scale(&self, name: &str) -> Option<&ScaleEndpoint> {
        self.scales.iter().find(|s| s.name == name)
    }

    pub fn resolve_printer(&self, name: &str) -> Option<&PrinterEndpoint> {
        self.printers.iter().find(|p| p.name == name)
    }

    /// Initial scale selection.
    pub fn first_scale(&self) -> Option<&ScaleEndpoint> {
        self.scales.first()
    }

    /// Target of quick printing.
    pub fn default_printer(&self) -> Option<&PrinterEndpoint> {
        self.printers.first()
    }
}
