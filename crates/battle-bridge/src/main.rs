//! battle-mcp-bridge: MCP tool server for the D&D Battle Manager API

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

use battle_bridge::cli::{Cli, Command};
use battle_bridge::{filter, telemetry, BridgeConfig};

fn main() -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(bootstrap());
    // A stdin read may still be parked on its blocking thread after a signal
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn bootstrap() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing()?;

    match cli.into_command() {
        Command::Serve(args) => battle_bridge::run(BridgeConfig::from(args))
            .await
            .context("MCP server failed"),
        Command::Filter(args) => {
            let report = filter::filter_spec_file(&args.input, &args.output, &args.tag)
                .context("failed to filter OpenAPI spec")?;
            eprintln!(
                "Wrote {} ({} of {} operations)",
                args.output.display(),
                report.kept,
                report.total
            );
            Ok(())
        }
        Command::Forward(args) => {
            battle_bridge::forward(&args.url, Duration::from_secs(args.timeout_secs))
                .await
                .context("forwarder failed")
        }
    }
}
