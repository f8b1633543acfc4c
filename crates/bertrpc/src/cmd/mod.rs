use std::path::PathBuf;
use std::time::Duration;

use bertrpc_etf::{atom, binary, charlist, Term};
use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod call;
pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Call a remote function and print the reply.
    Call(CallArgs),
    /// Encode a call without sending it.
    Encode(EncodeArgs),
    /// Decode an ETF term or a BERP reply frame.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Call(args) => call::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Server endpoint (http://host:port/path, or host:port with --tcp).
    pub endpoint: String,
    /// Remote module.
    pub module: String,
    /// Remote function.
    pub function: String,
    /// Arguments: atom:NAME, int:N, charlist:TEXT, str:TEXT or bare TEXT.
    pub args: Vec<String>,
    /// Bearer token for the HTTP transport.
    #[arg(long, env = "BERTRPC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Request timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "30s")]
    pub timeout: String,
    /// Send raw BERP packets over TCP instead of HTTP.
    #[arg(long)]
    pub tcp: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Module name.
    pub module: String,
    /// Function name.
    pub function: String,
    /// Arguments: atom:NAME, int:N, charlist:TEXT, str:TEXT or bare TEXT.
    pub args: Vec<String>,
    /// Prefix the 4-byte BERP length header.
    #[arg(long)]
    pub framed: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read the encoded bytes from a file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Hex-encoded bytes. Stdin is read when neither --file nor --hex is set.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Input is a BERP-framed `{reply, _}` / `{error, _}` envelope.
    #[arg(long)]
    pub reply: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Turn a command-line argument into a term using its prefix.
pub fn parse_term_arg(input: &str) -> CliResult<Term> {
    if let Some(name) = input.strip_prefix("atom:") {
        if name.is_empty() {
            return Err(CliError::usage("atom argument must not be empty"));
        }
        return Ok(atom(name));
    }
    if let Some(number) = input.strip_prefix("int:") {
        let value: i32 = number
            .trim()
            .parse()
            .map_err(|_| CliError::usage(format!("invalid 32-bit integer argument: {number}")))?;
        return Ok(Term::int(value));
    }
    if let Some(text) = input.strip_prefix("charlist:") {
        return Ok(charlist(text));
    }
    Ok(binary(input.strip_prefix("str:").unwrap_or(input)))
}

pub fn parse_term_args(inputs: &[String]) -> CliResult<Vec<Term>> {
    inputs.iter().map(|arg| parse_term_arg(arg)).collect()
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
