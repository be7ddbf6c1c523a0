use crate::core::station::{DispatchReceipt, ScaleStation};
use crate::domain::model::{LabelDocument, Measurement, ScaleEndpoint, TemplateKind};
use crate::domain::ports::{LabelSink, ScaleSource};
use crate::utils::error::{Result, ScaleIotError};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Something the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SelectScale(String),
    /// Poll the named scale, or the selected one.
    Poll(Option<String>),
    LoadLabel(TemplateKind),
    Print {
        printer: Option<String>,
        text: String,
    },
    QuickPrint,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Selected(ScaleEndpoint),
    Measured(Arc<Measurement>),
    Label(LabelDocument),
    Printed(DispatchReceipt),
}

impl Outcome {
    pub fn status_line(&self) -> String {
        match self {
            Outcome::Selected(endpoint) => endpoint.selection_status(),
            Outcome::Measured(m) => m.audit_line(),
            Outcome::Label(doc) => format!("Label loaded ({} bytes).", doc.len()),
            Outcome::Printed(receipt) => receipt.status_line(),
        }
    }
}

struct Request {
    intent: Intent,
    reply: oneshot::Sender<Result<Outcome>>,
}

/// Sending side of the station worker.
///
/// Every intent runs on its own task, so a slow printer never holds up a
/// poll. The station itself keeps same-scale polls and same-printer
/// dispatches from overlapping.
pub struct StationHandle<S: ScaleSource, P: LabelSink> {
    tx: mpsc::Sender<Request>,
    station: Arc<ScaleStation<S, P>>,
}

impl<S: ScaleSource, P: LabelSink> Clone for StationHandle<S, P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            station: Arc::clone(&self.station),
        }
    }
}

impl<S, P> StationHandle<S, P>
where
    S: ScaleSource + 'static,
    P: LabelSink + 'static,
{
    /// Submit an intent and wait for its result.
    pub async fn submit(&self, intent: Intent) -> Result<Outcome> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request { intent, reply })
            .await
            .map_err(|_| ScaleIotError::WorkerStopped)?;
        response.await.map_err(|_| ScaleIotError::WorkerStopped)?
    }

    /// Read-only access for display (current measurement, history).
    pub fn station(&self) -> &ScaleStation<S, P> {
        &self.station
    }
}

pub fn spawn_worker<S, P>(station: Arc<ScaleStation<S, P>>) -> StationHandle<S, P>
where
    S: ScaleSource + 'static,
    P: LabelSink + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Request>(32);
    let worker_station = Arc::clone(&station);

    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let station = Arc::clone(&worker_station);
            tokio::spawn(async move {
                let result = execute(&station, request.intent).await;
                if request.reply.send(result).is_err() {
                    tracing::debug!("Requester went away before the result was ready");
                }
            });
        }
        tracing::debug!("Station worker stopped");
    });

    StationHandle { tx, station }
}

async fn execute<S: ScaleSource, P: LabelSink>(
    station: &ScaleStation<S, P>,
    intent: Intent,
) -> Result<Outcome> {
    match intent {
        Intent::SelectScale(name) => Ok(Outcome::Selected(station.select_scale(&name))),
        Intent::Poll(Some(name)) => station.poll_once(&name).await.map(Outcome::Measured),
        Intent::Poll(None) => station.poll_selected().await.map(Outcome::Measured),
        Intent::LoadLabel(template) => station.load_label(template).map(Outcome::Label),
        Intent::Print { printer, text } => station
            .print_current_document(printer.as_deref(), &text)
            .await
            .map(Outcome::Printed),
        Intent::QuickPrint => station
            .quick_print_barcode_to_default_printer()
            .await
            .map(Outcome::Printed),
    }
}
