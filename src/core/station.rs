use crate::core::barcode::select_barcode;
use crate::core::label::render;
use crate::core::registry::EndpointRegistry;
use crate::core::store::{MeasurementStore, ReadingHistory};
use crate::domain::model::{LabelDocument, Measurement, PrinterEndpoint, ScaleEndpoint, TemplateKind};
use crate::domain::ports::{LabelSink, ScaleSource};
use crate::utils::error::{Result, ScaleIotError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Outcome of a label that left for a printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub printer: PrinterEndpoint,
    pub bytes: usize,
}

impl DispatchReceipt {
    pub fn status_line(&self) -> String {
        format!("[OK] {} → label sent.", self.printer.address())
    }
}

/// Everything the operator screen calls into.
///
/// Owns the measurement store and reading history and runs scale polls and
/// printer dispatches through the injected ports. Polls of the same scale
/// never overlap and dispatches to the same printer run one at a time.
pub struct ScaleStation<S: ScaleSource, P: LabelSink> {
    registry: EndpointRegistry,
    source: S,
    sink: P,
    store: MeasurementStore,
    history: ReadingHistory,
    selected: RwLock<ScaleEndpoint>,
    polls_in_flight: Mutex<HashSet<String>>,
    printer_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: ScaleSource, P: LabelSink> ScaleStation<S, P> {
    pub fn new(registry: EndpointRegistry, source: S, sink: P) -> Result<Self> {
        let first = registry
            .first_scale()
            .cloned()
            .ok_or_else(|| ScaleIotError::MissingConfigError {
                field: "scale.endpoints".to_string(),
            })?;

        Ok(Self {
            registry,
            source,
            sink,
            store: MeasurementStore::new(),
            history: ReadingHistory::new(),
            selected: RwLock::new(first),
            polls_in_flight: Mutex::new(HashSet::new()),
            printer_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn measurement(&self) -> Arc<Measurement> {
        self.store.snapshot()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.entries()
    }

    pub fn selected_scale(&self) -> ScaleEndpoint {
        self.selected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch the active scale. Unknown names keep the current selection.
    pub fn select_scale(&self, name: &str) -> ScaleEndpoint {
        match self.registry.resolve_scale(name) {
            Some(endpoint) => {
                let mut selected = self.selected.write().unwrap_or_else(PoisonError::into_inner);
                *selected = endpoint.clone();
                tracing::info!("🎯 {}", selected.selection_status());
                selected.clone()
            }
            None => {
                let current = self.selected_scale();
                tracing::warn!(
                    "Unknown scale '{}', keeping {}",
                    name,
                    current.name
                );
                current
            }
        }
    }

    /// Select `scale_name` and read it once.
    pub async fn poll_once(&self, scale_name: &str) -> Result<Arc<Measurement>> {
        self.select_scale(scale_name);
        self.poll_selected().await
    }

    /// Read the selected scale once and store the result.
    ///
    /// On failure the store and history are left untouched.
    pub async fn poll_selected(&self) -> Result<Arc<Measurement>> {
        let endpoint = self.selected_scale();
        let _guard = InFlightGuard::acquire(&self.polls_in_flight, &endpoint.url).ok_or_else(|| {
            tracing::warn!("⏳ Poll of {} rejected, one is already running", endpoint.name);
            ScaleIotError::PollInProgress {
                scale: endpoint.name.clone(),
            }
        })?;

        tracing::debug!("Polling scale {} at {}", endpoint.name, endpoint.url);
        let measurement = self.source.poll(&endpoint.url).await?;
        let line = measurement.audit_line();

        self.store.replace(measurement);
        self.history.append(line.clone());
        tracing::info!("⚖️ {}", line);

        Ok(self.store.snapshot())
    }

    pub fn load_test_label(&self) -> Result<LabelDocument> {
        render(TemplateKind::Test, &Measurement::default(), None)
    }

    pub fn load_plain_label(&self) -> Result<LabelDocument> {
        render(TemplateKind::PlainData, &self.store.snapshot(), None)
    }

    pub fn load_barcode_label(&self) -> Result<LabelDocument> {
        let measurement = self.store.snapshot();
        let barcode = select_barcode(&measurement);
        tracing::debug!("Barcode value selected: {}", barcode);
        render(TemplateKind::BarcodeData, &measurement, Some(&barcode))
    }

    pub fn load_label(&self, template: TemplateKind) -> Result<LabelDocument> {
        match template {
            TemplateKind::Test => self.load_test_label(),
            TemplateKind::PlainData => self.load_plain_label(),
            TemplateKind::BarcodeData => self.load_barcode_label(),
        }
    }

    /// Send operator-edited label text to a named printer.
    pub async fn print_current_document(
        &self,
        printer_name: Option<&str>,
        text: &str,
    ) -> Result<DispatchReceipt> {
        let printer = printer_name
            .and_then(|name| self.registry.resolve_printer(name))
            .cloned()
            .ok_or_else(|| ScaleIotError::validation("please select a printer"))?;
        let doc = LabelDocument::from_text(text)
            .ok_or_else(|| ScaleIotError::validation("label content is empty"))?;

        self.dispatch_to(&printer, &doc).await
    }

    /// Barcode label of the last reading, straight to the first printer.
    pub async fn quick_print_barcode_to_default_printer(&self) -> Result<DispatchReceipt> {
        let printer = self
            .registry
            .default_printer()
            .cloned()
            .ok_or_else(|| ScaleIotError::validation("no printers configured"))?;
        let doc = self.load_barcode_label()?;

        self.dispatch_to(&printer, &doc).await
    }

    async fn dispatch_to(
        &self,
        printer: &PrinterEndpoint,
        doc: &LabelDocument,
    ) -> Result<DispatchReceipt> {
        let lock = self.printer_lock(&printer.address());
        let _serialized = lock.lock().await;

        tracing::debug!("Sending {} bytes to {}", doc.len(), printer.address());
        match self.sink.dispatch(printer, doc).await {
            Ok(()) => {
                let receipt = DispatchReceipt {
                    printer: printer.clone(),
                    bytes: doc.len(),
                };
                tracing::info!("🖨️ {}", receipt.status_line());
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!("❌ {}", e);
                Err(e)
            }
        }
    }

    fn printer_lock(&self, address: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .printer_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(address.to_string()).or_default())
    }
}

/// Marks a scale URL busy until dropped.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, key: &str) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string());
        inserted.then(|| Self {
            set,
            key: key.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
