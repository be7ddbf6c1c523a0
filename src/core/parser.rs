use crate::domain::model::{Field, Measurement};
use crate::utils::error::{Result, ScaleIotError};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Scale tag names, in measurement field order.
const TAGS: [&[u8]; 5] = [b"net", b"brut", b"dara", b"serino", b"fisno"];

/// Parse the scale's XML document.
///
/// Only direct children of the root element are considered; the first
/// occurrence of a tag wins and anything else is ignored. A missing weight
/// tag (`net`, `brut`, `dara`) reads as unreadable, a missing `serino` or
/// `fisno` as absent. A captured tag keeps only the text before its first
/// child element. Non-whitespace text outside the root is rejected.
pub fn parse_measurement(xml: &str) -> Result<Measurement> {
    let mut reader = Reader::from_str(xml);

    let mut found: [Option<String>; 5] = Default::default();
    let mut capturing: Option<usize> = None;
    let mut text = String::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    // Set once a child opens inside a captured tag; later text is not the tag's own.
    let mut leading_only = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if depth == 0 {
                    if saw_root {
                        return Err(ScaleIotError::parse("more than one root element"));
                    }
                    saw_root = true;
                } else if depth == 1 {
                    capturing = slot_for(e.name().as_ref()).filter(|&i| found[i].is_none());
                    text.clear();
                    leading_only = false;
                } else if capturing.is_some() {
                    leading_only = true;
                }
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 0 {
                    if saw_root {
                        return Err(ScaleIotError::parse("more than one root element"));
                    }
                    saw_root = true;
                } else if depth == 1 {
                    if let Some(i) = slot_for(e.name().as_ref()) {
                        if found[i].is_none() {
                            found[i] = Some(String::new());
                        }
                    }
                } else if capturing.is_some() {
                    leading_only = true;
                }
            }
            Ok(Event::Text(ref t)) if depth == 0 => {
                let stray = t
                    .unescape()
                    .map_err(|e| ScaleIotError::parse(format!("bad text content: {}", e)))?;
                if !stray.trim().is_empty() {
                    return Err(ScaleIotError::parse("text outside the root element"));
                }
            }
            Ok(Event::Text(ref t)) if depth == 2 && capturing.is_some() && !leading_only => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| ScaleIotError::parse(format!("bad text content: {}", e)))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(ref c)) if depth == 2 && capturing.is_some() && !leading_only => {
                text.push_str(&String::from_utf8_lossy(&c.clone().into_inner()));
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    if let Some(i) = capturing.take() {
                        found[i] = Some(std::mem::take(&mut text));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ScaleIotError::parse(format!(
                    "XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ScaleIotError::parse("document has no root element"));
    }
    if depth != 0 {
        return Err(ScaleIotError::parse("unexpected end of document"));
    }

    let [net, brut, dara, serino, fisno] = found;
    Ok(Measurement {
        net: weight_field(net),
        gross: weight_field(brut),
        tare: weight_field(dara),
        serial: optional_field(serino),
        ticket: optional_field(fisno),
    })
}

fn slot_for(name: &[u8]) -> Option<usize> {
    TAGS.iter().position(|tag| *tag == name)
}

fn weight_field(raw: Option<String>) -> Field {
    raw.map(|s| Field::from_wire(s.trim())).unwrap_or(Field::Unreadable)
}

fn optional_field(raw: Option<String>) -> Field {
    raw.map(|s| Field::from_wire(s.trim())).unwrap_or(Field::Absent)
}
