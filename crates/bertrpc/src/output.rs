use std::io::{IsTerminal, Write};

use bertrpc_etf::Term;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{json, Value};

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
struct TermOutput {
    kind: &'static str,
    term: String,
    value: Value,
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    module: &'a str,
    function: &'a str,
    framed: bool,
    size: usize,
    hex: String,
}

/// Print a decoded term. `context` labels the table row (e.g. `reply`).
pub fn print_term(term: &Term, context: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = TermOutput {
                kind: term.kind(),
                term: term.to_string(),
                value: term_to_json(term),
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
                .set_header(vec!["FIELD", "KIND", "VALUE"]);
            match term.as_tuple() {
                Some(elems) => {
                    for (i, elem) in elems.iter().enumerate() {
                        table.add_row(vec![
                            format!("{context}.{i}"),
                            elem.kind().to_string(),
                            elem.to_string(),
                        ]);
                    }
                }
                None => {
                    table.add_row(vec![
                        context.to_string(),
                        term.kind().to_string(),
                        term.to_string(),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => println!("{term}"),
    }
}

/// Print an encoded call.
pub fn print_encoded(
    module: &str,
    function: &str,
    framed: bool,
    bytes: &[u8],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                module,
                function,
                framed,
                size: bytes.len(),
                hex: to_hex(bytes),
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
                .set_header(vec!["CALL", "FRAMED", "SIZE", "HEX"])
                .add_row(vec![
                    format!("{module}:{function}"),
                    framed.to_string(),
                    bytes.len().to_string(),
                    to_hex(bytes),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", to_hex(bytes)),
        OutputFormat::Raw => print_raw(bytes),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// JSON view of a term. Atoms, binaries and charlists become strings,
/// tuples and lists become arrays. Binaries that are not UTF-8 become
/// arrays of byte values.
pub fn term_to_json(term: &Term) -> Value {
    match term {
        Term::SmallInt(v) => json!(v),
        Term::Int(v) => json!(v),
        Term::Atom(atom) => json!(atom.as_str()),
        Term::Binary(bytes) | Term::LegacyString(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => json!(text),
            Err(_) => json!(bytes.to_vec()),
        },
        Term::CharList(text) => json!(text.as_str()),
        Term::Tuple(elems) | Term::List(elems) => {
            Value::Array(elems.iter().map(term_to_json).collect())
        }
        Term::Nil => Value::Array(Vec::new()),
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn from_hex(input: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err("odd number of hex digits".to_string());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|_| "non-ASCII input".to_string())?;
            u8::from_str_radix(text, 16).map_err(|_| format!("invalid hex byte {text:?}"))
        })
        .collect()
}
