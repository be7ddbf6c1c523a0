use anyhow::Context;
use clap::Parser;
use scaleiot::config::Command;
use scaleiot::utils::error::ErrorSeverity;
use scaleiot::utils::{logger, validation::Validate};
use scaleiot::{
    spawn_worker, CliConfig, HttpScaleReader, Intent, Outcome, RawTcpPrinter, ScaleIotError,
    ScaleStation, StationHandle, TemplateKind, TomlConfig,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

type Station = ScaleStation<HttpScaleReader, RawTcpPrinter>;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    logger::init_logger(cli.verbose, logger::LogFormat::from_flag(cli.log_json));
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ScaleIotError>() {
            Some(err) => {
                tracing::error!(
                    "❌ {} (Category: {:?}, Severity: {:?})",
                    err,
                    err.category(),
                    err.severity()
                );
                eprintln!("❌ {}", err.user_friendly_message());
                eprintln!("💡 Suggestion: {}", err.recovery_suggestion());

                let exit_code = match err.severity() {
                    ErrorSeverity::Low => 2,      // operator input
                    ErrorSeverity::Medium => 3,   // device or network
                    ErrorSeverity::High => 4,     // bad scale data
                    ErrorSeverity::Critical => 1, // configuration
                };
                std::process::exit(exit_code);
            }
            None => {
                tracing::error!("❌ {:#}", e);
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: CliConfig) -> anyhow::Result<()> {
    let config = TomlConfig::load_or_default(&cli.config)?;
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated successfully");

    let registry = config.to_registry()?;
    let reader = HttpScaleReader::new(config.scale_timeout())?;
    let printer = RawTcpPrinter::new(config.printer_timeout());
    let station = ScaleStation::new(registry, reader, printer)?;

    match cli.command {
        Command::Scales => {
            for scale in station.registry().scales() {
                println!("{}\t{}", scale.name, scale.url);
            }
        }
        Command::Printers => {
            for printer in station.registry().printers() {
                println!("{}\t{}", printer.name, printer.address());
            }
        }
        Command::Poll { scale, json } => {
            let measurement = poll(&station, scale.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&*measurement)?);
            } else {
                println!("{}", measurement.audit_line());
            }
        }
        Command::Label { template, scale } => {
            if template != TemplateKind::Test {
                poll(&station, scale.as_deref()).await?;
            }
            print!("{}", station.load_label(template)?);
        }
        Command::Print {
            printer,
            file,
            template,
            scale,
        } => {
            let text = match (file, template) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read label file {}", path.display()))?,
                (None, Some(template)) => {
                    if template != TemplateKind::Test {
                        poll(&station, scale.as_deref()).await?;
                    }
                    station.load_label(template)?.to_string()
                }
                (None, None) => return Err(ScaleIotError::validation("label content is empty").into()),
            };
            let receipt = station.print_current_document(Some(&printer), &text).await?;
            println!("{}", receipt.status_line());
        }
        Command::QuickPrint { scale } => {
            poll(&station, scale.as_deref()).await?;
            let receipt = station.quick_print_barcode_to_default_printer().await?;
            println!("{}", receipt.status_line());
        }
        Command::Session => {
            let handle = spawn_worker(Arc::new(station));
            session(handle).await?;
        }
    }

    Ok(())
}

async fn poll(
    station: &Station,
    scale: Option<&str>,
) -> scaleiot::Result<Arc<scaleiot::Measurement>> {
    match scale {
        Some(name) => station.poll_once(name).await,
        None => station.poll_selected().await,
    }
}

const SESSION_HELP: &str = "commands: scales | printers | select <scale> | poll [scale] | \
test | plain | barcode | doc | print <printer> | quick | show | history | help | quit";

/// Line-oriented operator loop. Keeps the last reading, the loaded label
/// and the history for as long as it runs.
async fn session(handle: StationHandle<HttpScaleReader, RawTcpPrinter>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut document = handle.station().load_test_label()?.to_string();

    println!("{}", handle.station().selected_scale().selection_status());
    println!("{}", SESSION_HELP);

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (line, None),
        };

        let intent = match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{}", SESSION_HELP);
                continue;
            }
            "scales" => {
                for scale in handle.station().registry().scales() {
                    println!("  {}  →  {}", scale.name, scale.url);
                }
                continue;
            }
            "printers" => {
                for printer in handle.station().registry().printers() {
                    println!("  {}", printer.name);
                }
                continue;
            }
            "show" => {
                let m = handle.station().measurement();
                println!("Net: {}\nGross: {}\nTare: {}", m.net, m.gross, m.tare);
                continue;
            }
            "history" => {
                for entry in handle.station().history() {
                    println!("{}", entry);
                }
                continue;
            }
            "doc" => {
                println!("{}", document);
                continue;
            }
            "select" => match arg {
                Some(name) => Intent::SelectScale(name.to_string()),
                None => {
                    println!("usage: select <scale>");
                    continue;
                }
            },
            "poll" | "+" => Intent::Poll(arg.map(str::to_string)),
            "test" => Intent::LoadLabel(TemplateKind::Test),
            "plain" => Intent::LoadLabel(TemplateKind::PlainData),
            "barcode" => Intent::LoadLabel(TemplateKind::BarcodeData),
            "print" => Intent::Print {
                printer: arg.map(str::to_string),
                text: document.clone(),
            },
            "quick" => Intent::QuickPrint,
            other => {
                println!("unknown command '{}'; {}", other, SESSION_HELP);
                continue;
            }
        };

        match handle.submit(intent).await {
            Ok(Outcome::Label(doc)) => {
                document = doc.to_string();
                println!("{}", document);
            }
            Ok(outcome) => println!("{}", outcome.status_line()),
            Err(e) => println!("{}", e.user_friendly_message()),
        }
    }

    Ok(())
}
