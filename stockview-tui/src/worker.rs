//! Run threads: every submitted run fetches on its own named thread.
//!
//! Communication with the TUI main thread is via an `mpsc` channel. Runs are
//! never aborted; a superseded run still reports, and the main thread drops
//! its result by generation.

use std::io;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use stockview_core::domain::RunGeneration;
use stockview_core::{PipelineError, RequestOrchestrator, RunOutput, RunTicket};

/// Responses sent from run threads back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    RunFinished {
        generation: RunGeneration,
        result: Result<RunOutput, PipelineError>,
    },
}

/// Spawn a thread that executes `ticket` and reports the outcome.
pub fn spawn_run(
    orchestrator: RequestOrchestrator,
    ticket: RunTicket,
    tx: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    let generation = ticket.generation();
    thread::Builder::new()
        .name(format!("stockview-run-{}", generation.0))
        .spawn(move || {
            let result = orchestrator.execute(&ticket);
            if let Err(e) = &result {
                tracing::debug!(%generation, error = %e, "run thread finished with error");
            }
            // Receiver gone means the UI is shutting down.
            let _ = tx.send(WorkerResponse::RunFinished { generation, result });
        })
}
