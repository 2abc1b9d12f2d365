use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rpcprims_wire::{encode_value, OperationDescriptor, Protocol, Value};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CallOutput<'a> {
    schema_id: &'a str,
    command: &'a str,
    result: serde_json::Value,
    timestamp: String,
}

pub fn print_result(command: &str, value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = CallOutput {
                schema_id: "https://schemas.3leaps.dev/rpcprims/cli/v1/call-result.schema.json",
                command,
                result: value_to_json(value),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "TYPE", "RESULT"])
                .add_row(vec![
                    command.to_string(),
                    value.type_name().to_string(),
                    render_value(value),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "command={} type={} result={}",
                command,
                value.type_name(),
                render_value(value)
            );
        }
        OutputFormat::Raw => match value {
            // A bare string prints without JSON quoting.
            Value::Str(text) => {
                print_raw(text.as_bytes());
                println!();
            }
            other => println!("{}", render_value(other)),
        },
    }
}

#[derive(Serialize)]
struct OperationOutput<'a> {
    name: &'a str,
    doc: &'a str,
}

#[derive(Serialize)]
struct CatalogOutput<'a> {
    schema_id: &'a str,
    server: &'a str,
    port: u16,
    count: usize,
    operations: Vec<OperationOutput<'a>>,
}

pub fn print_catalog(server: &str, port: u16, ops: &[OperationDescriptor], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = CatalogOutput {
                schema_id: "https://schemas.3leaps.dev/rpcprims/cli/v1/operation-catalog.schema.json",
                server,
                port,
                count: ops.len(),
                operations: ops
                    .iter()
                    .map(|op| OperationOutput {
                        name: &op.name,
                        doc: &op.doc,
                    })
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPERATION", "DOC"]);
            for op in ops {
                table.add_row(vec![op.name.clone(), doc_summary(&op.doc).to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} operations on {}:{}", ops.len(), server, port);
            for op in ops {
                println!("  {}: {}", op.name, doc_summary(&op.doc));
            }
        }
        OutputFormat::Raw => {
            for op in ops {
                println!("{}", op.name);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// First line of a documentation string, for one-row summaries.
pub fn doc_summary(doc: &str) -> &str {
    doc.lines().next().unwrap_or("").trim()
}

/// Render a value as JSON text. Falls back to the debug form for the rare
/// value the JSON protocol cannot carry.
pub fn render_value(value: &Value) -> String {
    match encode_value(value, Protocol::Json) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| format!("{value:?}")),
        Err(_) => format!("{value:?}"),
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    encode_value(value, Protocol::Json)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or(serde_json::Value::Null)
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
