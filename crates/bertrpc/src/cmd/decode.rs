use std::io::Read;

use bertrpc_etf::{decode_term, Term};
use bertrpc_rpc::decode_reply;

use crate::cmd::DecodeArgs;
use crate::exit::{etf_error, io_error, rpc_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{from_hex, print_term, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args)?;
    if input.is_empty() {
        return Err(CliError::new(DATA_INVALID, "no input bytes"));
    }

    let term = if args.reply {
        let mut term = Term::Nil;
        decode_reply(&mut input.as_slice(), Some(&mut term))
            .map_err(|err| rpc_error("decode failed", err))?;
        term
    } else {
        decode_term(&input).map_err(|err| etf_error("decode failed", err))?
    };

    print_term(&term, if args.reply { "reply" } else { "term" }, format);
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        return from_hex(hex).map_err(|reason| CliError::usage(format!("--hex: {reason}")));
    }
    if let Some(path) = &args.file {
        return std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(buf)
}
