//! Raw socket printing (port 9100).
//!
//! One connection carries exactly one label. Nothing is read back, so a
//! successful dispatch only means the OS accepted every byte.

use crate::domain::model::{LabelDocument, PrinterEndpoint};
use crate::domain::ports::LabelSink;
use crate::utils::error::{DispatchCause, Result, ScaleIotError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

pub const RAW_PORT: u16 = 9100;
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect, write all of `doc`, close. The whole exchange shares one deadline.
pub async fn dispatch(ip: &str, port: u16, doc: &LabelDocument, timeout: Duration) -> Result<()> {
    tracing::debug!("Connecting to printer {}:{} ({} bytes)", ip, port, doc.len());

    let outcome = match tokio::time::timeout(timeout, send(ip, port, doc.as_bytes())).await {
        Ok(result) => result,
        Err(_) => Err(DispatchCause::TimedOut(timeout)),
    };

    outcome.map_err(|cause| ScaleIotError::PrinterDispatch {
        ip: ip.to_string(),
        port,
        cause,
    })
}

async fn send(ip: &str, port: u16, bytes: &[u8]) -> std::result::Result<(), DispatchCause> {
    let mut stream = TcpStream::connect((ip, port))
        .await
        .map_err(DispatchCause::Connect)?;

    stream.write_all(bytes).await.map_err(DispatchCause::Write)?;
    stream.flush().await.map_err(DispatchCause::Write)?;
    stream.shutdown().await.map_err(DispatchCause::Write)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RawTcpPrinter {
    timeout: Duration,
}

impl RawTcpPrinter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl LabelSink for RawTcpPrinter {
    async fn dispatch(&self, printer: &PrinterEndpoint, doc: &LabelDocument) -> Result<()> {
        dispatch(&printer.ip, printer.port, doc, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_dispatch_writes_whole_document() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let printer = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let doc = LabelDocument::from_text("^XA\n^CI28\n^FDÇay^FS\n^XZ").unwrap();
        dispatch("127.0.0.1", port, &doc, DEFAULT_DISPATCH_TIMEOUT)
            .await
            .unwrap();

        let received = printer.await.unwrap();
        assert_eq!(received, doc.as_bytes());
    }

    #[tokio::test]
    async fn test_nothing_listening_fails_fast() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let doc = LabelDocument::from_text("^XA^XZ").unwrap();
        let timeout = Duration::from_secs(2);
        let started = Instant::now();
        let err = dispatch("127.0.0.1", port, &doc, timeout).await.unwrap_err();

        assert!(started.elapsed() < timeout + Duration::from_secs(1));
        match err {
            ScaleIotError::PrinterDispatch { ip, port: p, .. } => {
                assert_eq!(ip, "127.0.0.1");
                assert_eq!(p, port);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stalled_printer_times_out_and_releases_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            // Returns once the sender's end is gone, by EOF or reset.
            let mut sink = Vec::new();
            let _ = socket.read_to_end(&mut sink).await;
            let _ = closed_tx.send(());
        });

        let doc = LabelDocument::new("A".repeat(64 * 1024 * 1024));
        let timeout = Duration::from_millis(500);
        let started = Instant::now();
        let err = dispatch("127.0.0.1", port, &doc, timeout).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(err.is_timeout(), "expected a timeout, got {:?}", err);
        assert!(matches!(
            err,
            ScaleIotError::PrinterDispatch {
                cause: DispatchCause::TimedOut(after),
                ..
            } if after == timeout
        ));
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_secs(1), "took {:?}", elapsed);
        assert!(err
            .user_friendly_message()
            .starts_with(&format!("[Error] 127.0.0.1:{} →", port)));

        tokio::time::timeout(Duration::from_secs(10), closed_rx)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_printer_sink_uses_endpoint_address() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let printer = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let endpoint = PrinterEndpoint {
            name: "Bench".to_string(),
            ip: "127.0.0.1".to_string(),
            port,
        };
        let doc = LabelDocument::from_text("^XA^FDok^FS^XZ").unwrap();
        RawTcpPrinter::new(DEFAULT_DISPATCH_TIMEOUT)
            .dispatch(&endpoint, &doc)
            .await
            .unwrap();

        assert_eq!(printer.await.unwrap(), b"^XA^FDok^FS^XZ");
    }
}
