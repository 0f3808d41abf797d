use std::process::ExitCode;
use topomap::{CliError, Settings, run, setup_logging};

fn main() -> ExitCode {
    setup_logging();
    let settings = Settings::from_cli();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
        .and_then(|rt| rt.block_on(run(settings)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
