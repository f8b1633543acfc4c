use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("bertrpc {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: bertrpc");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("BERTRPC_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: http={}, async={}, cli=true",
        cfg!(feature = "http"),
        cfg!(feature = "async")
    );
    println!("etf_version_tag: {}", bertrpc_etf::tag::VERSION);
    println!("berp_max_payload: {}", bertrpc_berp::DEFAULT_MAX_PAYLOAD);

    Ok(SUCCESS)
}
