//! ZPL label templates.
//!
//! Field values are interpolated as-is. Text from the scale that contains
//! the ZPL command prefixes `^` or `~` is still emitted unchanged, and a
//! warning is logged for it. Barcode payloads must already be alphanumeric.

use crate::domain::model::{LabelDocument, Measurement, TemplateKind};
use crate::utils::error::{Result, ScaleIotError};

/// Static connectivity check label.
pub const TEST_LABEL: &str = "^XA
^CI28
^PW800
^LL560
^CF0,50
^FO100,200^FDTEST LABEL^FS
^XZ
";

/// Render a label for `template`.
///
/// `barcode` is required for [`TemplateKind::BarcodeData`] and ignored by
/// the other templates.
pub fn render(
    template: TemplateKind,
    m: &Measurement,
    barcode: Option<&str>,
) -> Result<LabelDocument> {
    let markup = match template {
        TemplateKind::Test => TEST_LABEL.to_string(),
        TemplateKind::PlainData => {
            warn_on_control_chars(m);
            plain_markup(m)
        }
        TemplateKind::BarcodeData => {
            let barcode = barcode.ok_or_else(|| {
                ScaleIotError::validation("barcode label requested without a barcode value")
            })?;
            if barcode.is_empty() || !barcode.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ScaleIotError::validation(format!(
                    "barcode value '{}' is not alphanumeric",
                    barcode
                )));
            }
            warn_on_control_chars(m);
            barcode_markup(m, barcode)
        }
    };

    Ok(LabelDocument::new(markup))
}

fn plain_markup(m: &Measurement) -> String {
    format!(
        "^XA
^CI28
^PW800
^LL560
^CF0,40
^FO40,40^FDNet: {net}^FS
^FO40,100^FDGross: {gross}^FS
^FO40,160^FDTare: {tare}^FS
^FO40,220^FDSerial: {serial}^FS
^FO40,280^FDTicket: {ticket}^FS
^XZ
",
        net = m.net,
        gross = m.gross,
        tare = m.tare,
        serial = m.serial,
        ticket = m.ticket,
    )
}

fn barcode_markup(m: &Measurement, barcode: &str) -> String {
    format!(
        "^XA
^CI28
^PW800
^LL560
^CF0,36
^FO40,30^FDNet: {net}^FS
^FO40,80^FDGross: {gross}^FS
^FO40,130^FDTare: {tare}^FS
^FO40,180^FDSerial: {serial}^FS
^FO40,230^FDTicket: {ticket}^FS

^BY2,3,140
^FO60,290^BCN,140,Y,N,N
^FD{barcode}^FS

^FO60,445^A0N,28,28^FD{barcode}^FS
^XZ
",
        net = m.net,
        gross = m.gross,
        tare = m.tare,
        serial = m.serial,
        ticket = m.ticket,
        barcode = barcode,
    )
}

fn warn_on_control_chars(m: &Measurement) {
    for (name, field) in [
        ("net", &m.net),
        ("gross", &m.gross),
        ("tare", &m.tare),
        ("serial", &m.serial),
        ("ticket", &m.ticket),
    ] {
        if field.as_str().contains(['^', '~']) {
            tracing::warn!(
                "⚠️ {} value '{}' contains ZPL control characters and is printed unescaped",
                name,
                field
            );
        }
    }
}
