use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("fsci {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: fsci");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("FSCI_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    let features = fsci_dispatch::Features::from_build();
    println!(
        "tables: extended_adv={}, channel_sounding={}",
        features.extended_advertising, features.channel_sounding
    );
    println!(
        "features: async={}, cli=true",
        cfg!(feature = "async")
    );
    println!(
        "opcodes: commands={:#04x}, events={:#04x}",
        fsci_records::COMMAND_TABLE_LEN,
        fsci_records::EVENT_TABLE_LEN
    );

    Ok(SUCCESS)
}
