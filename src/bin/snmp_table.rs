//! snmp-table: dump an SNMP table with repeated GETBULK.

use clap::Parser;
use snmp_session::cli::args::{CommonArgs, OutputArgs, TableArgs, V3Args};
use snmp_session::cli::hints::parse_oid;
use snmp_session::cli::output::{OutputContext, write_error};
use snmp_session::{Oid, VarBind};
use std::process::ExitCode;
use std::time::Instant;

/// Retrieve every object under a table (or any subtree) root.
#[derive(Debug, Parser)]
#[command(name = "snmp-table", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    v3: V3Args,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    table: TableArgs,

    /// Table root (dotted notation or well-known name).
    #[arg(value_name = "OID")]
    oid: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    if let Err(e) = args.v3.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let root = match parse_oid(&args.oid) {
        Ok(oid) => oid,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    match run(&args, &root).await {
        Ok((target, version, varbinds)) => {
            let ctx = OutputContext {
                format: args.output.format,
                show_hints: !args.output.no_hints,
                force_hex: args.output.hex,
                show_timing: args.output.timing,
            };
            let timing = args.output.timing.then(|| start.elapsed());
            if let Err(e) = ctx.write_table(target, version, &varbinds, timing) {
                eprintln!("Error writing output: {}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    args: &Args,
    root: &Oid,
) -> snmp_session::Result<(std::net::SocketAddr, snmp_session::Version, Vec<VarBind>)> {
    let mut session =
        snmp_session::cli::connect(&args.common, &args.v3, args.table.max_repetitions).await?;
    let target = session.peer_addr();
    let version = session.config().version;

    let table = session.get_table(root).await?;
    session.close();

    let varbinds = table
        .into_iter()
        .map(|(oid, value)| VarBind::new(oid, value))
        .collect();
    Ok((target, version, varbinds))
}
