// src/main.rs

use respawn::supervisor::ExitReason;
use respawn::{cli, run};

#[tokio::main]
async fn main() {
    match run(cli::parse()).await {
        // Graceful shutdown always exits 0, even if stray tasks remain.
        Ok(Some(ExitReason::Shutdown)) => std::process::exit(0),
        Ok(Some(ExitReason::InitialStartFailed)) | Ok(None) => {}
        Err(err) => {
            eprintln!("respawn error: {err:?}");
            std::process::exit(1);
        }
    }
}
