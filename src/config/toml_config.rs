use crate::adapters::http::DEFAULT_SCALE_TIMEOUT;
use crate::adapters::raw_tcp::{DEFAULT_DISPATCH_TIMEOUT, RAW_PORT};
use crate::core::registry::EndpointRegistry;
use crate::domain::model::{PrinterEndpoint, ScaleEndpoint};
use crate::utils::error::{Result, ScaleIotError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub scale: ScaleSection,
    #[serde(default)]
    pub printer: PrinterSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSection {
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_scale_endpoints")]
    pub endpoints: Vec<ScaleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleEntry {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterSection {
    pub port: Option<u32>,
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_printer_endpoints")]
    pub endpoints: Vec<PrinterEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterEntry {
    pub name: String,
    pub ip: String,
    /// Overrides `printer.port` for this printer only.
    pub port: Option<u32>,
}

fn default_scale_endpoints() -> Vec<ScaleEntry> {
    [
        ("Scale 1 (Main Line)", "http://192.168.1.15/xml"),
        ("Scale 2", "http://192.168.1.16/xml"),
        ("Scale 3", "http://192.168.1.17/xml"),
    ]
    .into_iter()
    .map(|(name, url)| ScaleEntry {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

fn default_printer_endpoints() -> Vec<PrinterEntry> {
    (5..=8)
        .enumerate()
        .map(|(i, host)| {
            let ip = format!("192.168.1.{}", host);
            PrinterEntry {
                name: format!("Printer {} ({})", i + 1, ip),
                ip,
                port: None,
            }
        })
        .collect()
}

impl Default for ScaleSection {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            endpoints: default_scale_endpoints(),
        }
    }
}

impl Default for PrinterSection {
    fn default() -> Self {
        Self {
            port: None,
            timeout_ms: None,
            endpoints: default_printer_endpoints(),
        }
    }
}

impl TomlConfig {
    /// Read and parse a TOML file. Fails if it does not exist.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScaleIotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, otherwise fall back to the built-in endpoints.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::info!(
                "📁 No configuration at {}, using built-in endpoints",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScaleIotError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScaleIotError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn scale_timeout(&self) -> Duration {
        self.scale
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SCALE_TIMEOUT)
    }

    pub fn printer_timeout(&self) -> Duration {
        self.printer
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DISPATCH_TIMEOUT)
    }

    fn printer_port(&self, entry: &PrinterEntry) -> Result<u16> {
        let port = entry.port.or(self.printer.port).unwrap_or(u32::from(RAW_PORT));
        u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ScaleIotError::InvalidConfigValueError {
                field: "printer.port".to_string(),
                value: port.to_string(),
                reason: "Value must be between 1 and 65535".to_string(),
            })
    }

    /// Build the endpoint lookup table. Validates first.
    pub fn to_registry(&self) -> Result<EndpointRegistry> {
        self.validate()?;

        let scales = self
            .scale
            .endpoints
            .iter()
            .map(|e| ScaleEndpoint {
                name: e.name.clone(),
                url: e.url.clone(),
            })
            .collect();

        let printers = self
            .printer
            .endpoints
            .iter()
            .map(|e| {
                Ok(PrinterEndpoint {
                    name: e.name.clone(),
                    ip: e.ip.trim().to_string(),
                    port: self.printer_port(e)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EndpointRegistry::new(scales, printers))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if self.scale.endpoints.is_empty() {
            return Err(ScaleIotError::MissingConfigError {
                field: "scale.endpoints".to_string(),
            });
        }

        validation::validate_unique_names(
            "scale.endpoints.name",
            self.scale.endpoints.iter().map(|e| e.name.as_str()),
        )?;
        for entry in &self.scale.endpoints {
            validation::validate_url("scale.endpoints.url", &entry.url)?;
        }

        validation::validate_unique_names(
            "printer.endpoints.name",
            self.printer.endpoints.iter().map(|e| e.name.as_str()),
        )?;
        for entry in &self.printer.endpoints {
            validation::validate_non_empty_string("printer.endpoints.ip", &entry.ip)?;
            self.printer_port(entry)?;
        }

        if let Some(ms) = self.scale.timeout_ms {
            validation::validate_range("scale.timeout_ms", ms, 100, 60_000)?;
        }
        if let Some(ms) = self.printer.timeout_ms {
            validation::validate_range("printer.timeout_ms", ms, 100, 60_000)?;
        }

        Ok(())
    }
}
