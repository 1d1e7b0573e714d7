//! snmp-trapd: print SNMPv2c notifications as they arrive.

use clap::Parser;
use snmp_session::cli::args::{ListenArgs, OutputArgs};
use snmp_session::cli::output::OutputContext;
use snmp_session::parse_trap;
use snmp_session::util::bind_udp_socket;
use std::process::ExitCode;

/// Listen for SNMPv2c traps and informs and print each one.
#[derive(Debug, Parser)]
#[command(name = "snmp-trapd", version, about)]
struct Args {
    #[command(flatten)]
    listen: ListenArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let socket = match bind_udp_socket(args.listen.listen, Some(args.listen.recv_buffer_size)).await
    {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("Error: cannot listen on {}: {}", args.listen.listen, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(target: "snmp_session::trapd", { listen = %args.listen.listen }, "listening for notifications");

    let ctx = OutputContext {
        format: args.output.format,
        show_hints: !args.output.no_hints,
        force_hex: args.output.hex,
        show_timing: false,
    };
    let mut buf = vec![0u8; args.listen.recv_buffer_size];

    loop {
        let (len, source) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                eprintln!("Error: receive failed: {}", e);
                return ExitCode::FAILURE;
            }
        };

        match parse_trap(&buf[..len]) {
            Ok(trap) => {
                if let Err(e) = ctx.write_trap(source, &trap) {
                    eprintln!("Error writing output: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                tracing::warn!(target: "snmp_session::trapd", { source = %source, error = %e }, "dropping datagram");
            }
        }
    }
}
