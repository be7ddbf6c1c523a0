use httpmock::prelude::*;
use scaleiot::{
    spawn_worker, EndpointRegistry, Field, HttpScaleReader, Intent, Measurement, Outcome,
    PrinterEndpoint, RawTcpPrinter, ScaleEndpoint, ScaleIotError, ScaleStation,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const SCENARIO_XML: &str = "<root><net>120.5</net><brut>150.0</brut><dara>29.5</dara>\
<serino>SN42</serino><fisno>F7</fisno></root>";

/// Accept one connection and return everything written to it.
async fn fake_printer() -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        received
    });
    (port, handle)
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn station(
    scale_url: String,
    printer_port: u16,
    scale_timeout: Duration,
) -> ScaleStation<HttpScaleReader, RawTcpPrinter> {
    let registry = EndpointRegistry::new(
        vec![ScaleEndpoint {
            name: "Scale 1".to_string(),
            url: scale_url,
        }],
        vec![PrinterEndpoint {
            name: "Printer 1".to_string(),
            ip: "127.0.0.1".to_string(),
            port: printer_port,
        }],
    );
    ScaleStation::new(
        registry,
        HttpScaleReader::new(scale_timeout).unwrap(),
        RawTcpPrinter::new(Duration::from_secs(2)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_poll_then_quick_print_end_to_end() {
    let server = MockServer::start();
    let scale_mock = server.mock(|when, then| {
        when.method(GET).path("/xml");
        then.status(200)
            .header("Content-Type", "text/xml")
            .body(SCENARIO_XML);
    });
    let (port, printer) = fake_printer().await;
    let station = station(server.url("/xml"), port, Duration::from_secs(2));

    let measurement = station.poll_selected().await.unwrap();
    scale_mock.assert();
    assert_eq!(
        *measurement,
        Measurement {
            net: Field::from("120.5"),
            gross: Field::from("150.0"),
            tare: Field::from("29.5"),
            serial: Field::from("SN42"),
            ticket: Field::from("F7"),
        }
    );

    let receipt = station
        .quick_print_barcode_to_default_printer()
        .await
        .unwrap();
    assert_eq!(receipt.status_line(), format!("[OK] 127.0.0.1:{} → label sent.", port));

    let received = String::from_utf8(printer.await.unwrap()).unwrap();
    assert!(received.starts_with("^XA\n^CI28\n"));
    assert!(received.contains("^BCN,140,Y,N,N\n^FDF7^FS"));
    assert!(received.contains("^FO60,445^A0N,28,28^FDF7^FS"));
    assert!(received.trim_end().ends_with("^XZ"));
    assert_eq!(received.len(), receipt.bytes);
}

#[tokio::test]
async fn test_http_500_leaves_store_unchanged() {
    let server = MockServer::start();
    let mut ok_mock = server.mock(|when, then| {
        when.method(GET).path("/xml");
        then.status(200).body(SCENARIO_XML);
    });
    let station = station(server.url("/xml"), closed_port().await, Duration::from_secs(2));

    station.poll_selected().await.unwrap();
    ok_mock.delete();

    let failing_mock = server.mock(|when, then| {
        when.method(GET).path("/xml");
        then.status(500);
    });

    let err = station.poll_selected().await.unwrap_err();
    failing_mock.assert();

    assert!(matches!(err, ScaleIotError::HttpStatus { status: 500, .. }));
    assert_eq!(station.measurement().ticket, Field::from("F7"));
    assert_eq!(station.history().len(), 1);
}

#[tokio::test]
async fn test_slow_scale_times_out_distinctly() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/xml");
        then.status(200)
            .body(SCENARIO_XML)
            .delay(Duration::from_secs(3));
    });
    let timeout = Duration::from_millis(300);
    let station = station(server.url("/xml"), closed_port().await, timeout);

    let started = Instant::now();
    let err = station.poll_selected().await.unwrap_err();

    assert!(err.is_timeout(), "expected a timeout, got {:?}", err);
    assert!(matches!(err, ScaleIotError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(*station.measurement(), Measurement::default());
}

#[tokio::test]
async fn test_unreachable_scale_is_a_transport_error() {
    let url = format!("http://127.0.0.1:{}/xml", closed_port().await);
    let station = station(url, closed_port().await, Duration::from_secs(2));

    let err = station.poll_selected().await.unwrap_err();
    assert!(matches!(err, ScaleIotError::Transport { .. }), "{:?}", err);
    assert!(station.history().is_empty());
}

#[tokio::test]
async fn test_printer_not_listening_fails_within_bound() {
    let port = closed_port().await;
    let station = station("http://127.0.0.1:1/xml".to_string(), port, Duration::from_secs(2));

    let started = Instant::now();
    let err = station
        .print_current_document(Some("Printer 1"), "^XA^XZ")
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3));
    match &err {
        ScaleIotError::PrinterDispatch { ip, port: p, .. } => {
            assert_eq!(ip, "127.0.0.1");
            assert_eq!(*p, port);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err
        .user_friendly_message()
        .starts_with(&format!("[Error] 127.0.0.1:{} →", port)));
}

#[tokio::test]
async fn test_operator_flow_through_worker() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/xml");
        then.status(200)
            .body("<root><net>3</net><brut>4</brut><dara>1</dara><serino>S-77</serino></root>");
    });
    let (port, printer) = fake_printer().await;
    let handle = spawn_worker(Arc::new(station(server.url("/xml"), port, Duration::from_secs(2))));

    let outcome = handle.submit(Intent::Poll(None)).await.unwrap();
    assert_eq!(
        outcome.status_line(),
        "READ | Net:3 | Gross:4 | Tare:1 | Serial:S-77 | Ticket:-"
    );

    let label = match handle
        .submit(Intent::LoadLabel(scaleiot::TemplateKind::BarcodeData))
        .await
        .unwrap()
    {
        Outcome::Label(doc) => doc,
        other => panic!("expected a label, got {:?}", other),
    };
    assert!(label.as_str().contains("^FDS77^FS"));

    let outcome = handle
        .submit(Intent::Print {
            printer: Some("Printer 1".to_string()),
            text: label.to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Printed(_)));

    let received = printer.await.unwrap();
    assert_eq!(received, label.as_str().trim().as_bytes());
}

#[tokio::test]
async fn test_station_built_from_config_file() {
    use std::io::Write;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/line2/xml");
        then.status(200).body(SCENARIO_XML);
    });
    let (port, printer) = fake_printer().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[scale]
timeout_ms = 1500

[[scale.endpoints]]
name = "Line 2"
url = "{}"

[printer]
timeout_ms = 1000

[[printer.endpoints]]
name = "Bench"
ip = "127.0.0.1"
port = {}
"#,
        server.url("/line2/xml"),
        port
    )
    .unwrap();

    let config = scaleiot::TomlConfig::load_or_default(file.path()).unwrap();
    assert_eq!(config.scale_timeout(), Duration::from_millis(1500));

    let station = ScaleStation::new(
        config.to_registry().unwrap(),
        HttpScaleReader::new(config.scale_timeout()).unwrap(),
        RawTcpPrinter::new(config.printer_timeout()),
    )
    .unwrap();
    assert_eq!(
        station.selected_scale().selection_status(),
        format!("Selected Scale: Line 2  →  {}", server.url("/line2/xml"))
    );

    station.poll_once("Line 2").await.unwrap();
    let receipt = station
        .quick_print_barcode_to_default_printer()
        .await
        .unwrap();
    assert_eq!(receipt.printer.name, "Bench");

    let received = String::from_utf8(printer.await.unwrap()).unwrap();
    assert!(received.contains("^FDTicket: F7^FS"));
}
