use std::fmt;
use std::io;

use bertrpc_berp::BerpError;
use bertrpc_etf::EtfError;
use bertrpc_rpc::{ApplicationError, RpcError};
use bertrpc_transport::TransportError;

// Process exit codes. 64 and 70 follow sysexits; 124 matches timeout(1).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
/// The remote function failed or returned an `error` result.
pub const APPLICATION_ERROR: i32 = 70;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        io::ErrorKind::NotFound => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn etf_error(context: &str, err: EtfError) -> CliError {
    match err {
        EtfError::Io(source) => io_error(context, source),
        EtfError::OutOfRange { .. } | EtfError::UnsupportedType(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::InvalidEndpoint { .. } | TransportError::InvalidConfig { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::ReplyTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        TransportError::Frame(BerpError::Io(source)) => io_error(context, source),
        TransportError::Frame(BerpError::PayloadTooLarge { .. }) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn rpc_error(context: &str, err: RpcError) -> CliError {
    match err {
        RpcError::Etf(err) => etf_error(context, err),
        RpcError::Transport(err) => transport_error(context, err),
        RpcError::Protocol(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        RpcError::Application(ApplicationError::Remote(remote)) => {
            CliError::new(APPLICATION_ERROR, format!("{context}: {remote}"))
        }
        RpcError::Application(err) => CliError::new(APPLICATION_ERROR, format!("{context}: {err}")),
        RpcError::NilTarget => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}
