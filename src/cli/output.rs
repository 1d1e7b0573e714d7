//! Output formatting for CLI tools.
//!
//! Supports human-readable, JSON, and raw output formats.

use crate::cli::args::OutputFormat;
use crate::cli::hints;
use crate::util::hex;
use crate::{Oid, Trap, Value, VarBind, Version};
use serde::Serialize;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::time::Duration;

/// A table walk, ready for output.
#[derive(Debug, Serialize)]
pub struct TableResult {
    pub target: String,
    pub version: String,
    pub results: Vec<VarBindResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_ms: Option<f64>,
}

/// A received notification, ready for output.
#[derive(Debug, Serialize)]
pub struct TrapResult {
    pub source: String,
    pub version: String,
    pub community: String,
    pub pdu_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trap_oid: Option<String>,
    pub results: Vec<VarBindResult>,
}

/// A single varbind result.
#[derive(Debug, Serialize)]
pub struct VarBindResult {
    pub oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_hex: Option<String>,
}

/// Output context for formatting.
pub struct OutputContext {
    pub format: OutputFormat,
    pub show_hints: bool,
    pub force_hex: bool,
    pub show_timing: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_hints: true,
            force_hex: false,
            show_timing: false,
        }
    }

    /// Write a walked table to stdout.
    pub fn write_table(
        &self,
        target: SocketAddr,
        version: Version,
        varbinds: &[VarBind],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let result = TableResult {
            target: target.to_string(),
            version: version.to_string(),
            results: self.format_varbinds(varbinds),
            timing_ms: elapsed.map(|d| d.as_secs_f64() * 1000.0),
        };
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Human => {
                self.write_human(&mut stdout, &result.results)?;
                if self.show_timing
                    && let Some(ms) = result.timing_ms
                {
                    writeln!(stdout, "\nTiming: {:.1}ms", ms)?;
                }
                Ok(())
            }
            OutputFormat::Json => write_json(&mut stdout, &result),
            OutputFormat::Raw => write_raw(&mut stdout, &result.results),
        }
    }

    /// Write one notification to stdout.
    pub fn write_trap(&self, source: SocketAddr, trap: &Trap) -> io::Result<()> {
        let result = self.trap_result(source, trap);
        let mut stdout = io::stdout().lock();
        self.write_trap_to(&mut stdout, &result)
    }

    fn trap_result(&self, source: SocketAddr, trap: &Trap) -> TrapResult {
        TrapResult {
            source: source.to_string(),
            version: trap.version.to_string(),
            community: String::from_utf8_lossy(&trap.community).into_owned(),
            pdu_type: trap.kind.to_string(),
            uptime: trap
                .uptime()
                .map(|d| format_timeticks((d.as_millis() / 10) as u32)),
            trap_oid: trap.trap_oid().map(|oid| self.name_oid(oid)),
            results: self.format_varbinds(&trap.varbinds),
        }
    }

    fn write_trap_to<W: Write>(&self, w: &mut W, result: &TrapResult) -> io::Result<()> {
        match self.format {
            OutputFormat::Human => {
                write!(
                    w,
                    "{} from {} ({}, community \"{}\")",
                    result.pdu_type, result.source, result.version, result.community
                )?;
                if let Some(ref trap_oid) = result.trap_oid {
                    write!(w, ": {}", trap_oid)?;
                }
                if let Some(ref uptime) = result.uptime {
                    write!(w, " uptime {}", uptime)?;
                }
                writeln!(w)?;
                self.write_human(w, &result.results)
            }
            OutputFormat::Json => {
                let json = serde_json::to_string(result).map_err(io::Error::other)?;
                writeln!(w, "{}", json)
            }
            OutputFormat::Raw => write_raw(w, &result.results),
        }
    }

    fn name_oid(&self, oid: &Oid) -> String {
        match hints::lookup(oid).filter(|_| self.show_hints) {
            Some(name) => format!("{} ({})", oid, name),
            None => oid.to_string(),
        }
    }

    fn format_varbinds(&self, varbinds: &[VarBind]) -> Vec<VarBindResult> {
        varbinds.iter().map(|vb| self.format_varbind(vb)).collect()
    }

    fn format_varbind(&self, vb: &VarBind) -> VarBindResult {
        let hint = if self.show_hints {
            hints::lookup(&vb.oid).map(String::from)
        } else {
            None
        };
        let (value_type, value, formatted, raw_hex) = format_value(&vb.value, self.force_hex);

        VarBindResult {
            oid: vb.oid.to_string(),
            hint,
            value_type,
            value,
            formatted,
            raw_hex,
        }
    }

    fn write_human<W: Write>(&self, w: &mut W, results: &[VarBindResult]) -> io::Result<()> {
        for vb in results {
            if let Some(ref hint) = vb.hint {
                write!(w, "{} ({})", vb.oid, hint)?;
            } else {
                write!(w, "{}", vb.oid)?;
            }
            write!(w, " = {}: ", vb.value_type)?;

            if let Some(ref formatted) = vb.formatted {
                writeln!(w, "{}", formatted)?;
            } else {
                match &vb.value {
                    serde_json::Value::String(s) => writeln!(w, "\"{}\"", s)?,
                    serde_json::Value::Null => writeln!(w)?,
                    other => writeln!(w, "{}", other)?,
                }
            }
        }
        Ok(())
    }
}

fn write_json<W: Write, T: Serialize>(w: &mut W, result: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
    writeln!(w, "{}", json)
}

fn write_raw<W: Write>(w: &mut W, results: &[VarBindResult]) -> io::Result<()> {
    for vb in results {
        let value = match &vb.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        writeln!(w, "{}\t{}", vb.oid, value)?;
    }
    Ok(())
}

/// Format a value, returning (type_name, json_value, formatted_string, raw_hex).
fn format_value(
    value: &Value,
    force_hex: bool,
) -> (String, serde_json::Value, Option<String>, Option<String>) {
    match value {
        Value::Integer(v) => ("INTEGER".into(), (*v).into(), None, None),

        Value::Boolean(v) => ("BOOLEAN".into(), (*v).into(), None, None),

        Value::OctetString(bytes) => {
            let raw = hex::encode(bytes);
            if force_hex || !is_printable(bytes) {
                (
                    "Hex-STRING".into(),
                    serde_json::Value::String(raw.clone()),
                    Some(format_hex_string(bytes)),
                    Some(raw),
                )
            } else {
                (
                    "STRING".into(),
                    serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
                    None,
                    Some(raw),
                )
            }
        }

        Value::Null => ("NULL".into(), serde_json::Value::Null, None, None),

        Value::ObjectIdentifier(oid) => (
            "OID".into(),
            serde_json::Value::String(oid.to_string()),
            None,
            None,
        ),

        Value::IpAddress(addr) => (
            "IpAddress".into(),
            serde_json::Value::String(addr.to_string()),
            None,
            None,
        ),

        Value::Counter(v) => ("Counter32".into(), (*v).into(), None, None),

        Value::Gauge(v) => ("Gauge32".into(), (*v).into(), None, None),

        Value::TimeTicks(v) => (
            "TimeTicks".into(),
            (*v).into(),
            Some(format!("({}) {}", v, format_timeticks(*v))),
            None,
        ),

        Value::NoSuchInstance => (
            "NoSuchInstance".into(),
            serde_json::Value::Null,
            Some("No Such Instance currently exists".into()),
            None,
        ),

        Value::EndOfMibView => (
            "EndOfMibView".into(),
            serde_json::Value::Null,
            Some("No more variables left in this MIB View".into()),
            None,
        ),

        Value::Tag(_) | Value::Sequence(_) => (
            value.type_name().into(),
            serde_json::Value::String(value.to_string()),
            None,
            None,
        ),
    }
}

/// Check if bytes are printable ASCII/UTF-8.
fn is_printable(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(s) => s
            .chars()
            .all(|c| c.is_ascii_graphic() || c.is_ascii_whitespace()),
        Err(_) => false,
    }
}

/// Format bytes as spaced hex for display.
fn format_hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format TimeTicks as human-readable duration.
fn format_timeticks(centiseconds: u32) -> String {
    let total_seconds = centiseconds / 100;
    let cs = centiseconds % 100;

    let days = total_seconds / 86400;
    let hours = (total_seconds % 86400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!(
            "{}d {:02}:{:02}:{:02}.{:02}",
            days, hours, minutes, seconds, cs
        )
    } else {
        format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, cs)
    }
}

/// Write an error message to stderr.
pub fn write_error(err: &crate::Error) {
    eprintln!("Error: {}", err);
}
