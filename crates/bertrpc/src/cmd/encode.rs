use bertrpc_rpc::{encode_call, Call};

use crate::cmd::{parse_term_args, EncodeArgs};
use crate::exit::{rpc_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let call = Call::with_args(&args.module, &args.function, parse_term_args(&args.args)?);
    let bytes = if args.framed {
        call.to_berp()
    } else {
        encode_call(&call)
    }
    .map_err(|err| rpc_error("encode failed", err))?;

    print_encoded(call.module(), call.function(), args.framed, &bytes, format);
    Ok(SUCCESS)
}
