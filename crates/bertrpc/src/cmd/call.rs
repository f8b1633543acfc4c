use bertrpc_etf::Term;
use bertrpc_rpc::{ApplicationError, Call, Client, RpcError};
use bertrpc_transport::{HttpTransport, TcpTransport, Transport, TransportConfig, TCP_SCHEME};
use tracing::debug;

use crate::cmd::{parse_duration, parse_term_args, CallArgs};
use crate::exit::{rpc_error, transport_error, CliResult, APPLICATION_ERROR, SUCCESS};
use crate::output::{print_term, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let call = Call::with_args(&args.module, &args.function, parse_term_args(&args.args)?);

    let mut config = TransportConfig::new(&args.endpoint).with_timeout(timeout);
    config.token = args.token.filter(|token| !token.is_empty());

    let use_tcp = args.tcp || args.endpoint.starts_with(TCP_SCHEME);
    let transport: Box<dyn Transport> = if use_tcp {
        Box::new(TcpTransport::new(config).map_err(|err| transport_error("invalid endpoint", err))?)
    } else {
        Box::new(HttpTransport::new(config).map_err(|err| transport_error("invalid endpoint", err))?)
    };
    debug!(
        endpoint = %args.endpoint,
        tcp = use_tcp,
        module = call.module(),
        function = call.function(),
        "calling"
    );

    let mut client = Client::new(transport);
    let mut reply = Term::Nil;
    match client.exec(&call, &mut reply) {
        Ok(()) => {
            print_term(&reply, "reply", format);
            Ok(SUCCESS)
        }
        // The reply decoded fine but carries the `error` tag: show it.
        Err(RpcError::Application(ApplicationError::Returned { .. })) => {
            print_term(&reply, "reply", format);
            Ok(APPLICATION_ERROR)
        }
        Err(err) => Err(rpc_error("call failed", err)),
    }
}
