use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use leaddesk_lib::cli::{run, Cli};
use leaddesk_lib::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let state = AppState::new().map_err(|e| anyhow::anyhow!("Failed to start LeadDesk: {e}"))?;

    let output = run(&state, cli).await;
    std::io::stdout().write_all(output.text.as_bytes())?;

    Ok(if output.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
