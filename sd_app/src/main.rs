mod tracing_setup;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use sd_ratelimit::DispatchFuture;
use sd_ratelimit::Dispatcher;
use sd_ratelimit::SlidingWindow;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing::warn;

/// Caller-owned payload; the limiter never looks inside it
#[derive(Debug, Serialize)]
struct Consignment {
    id: u64,
    reference: String,
}

#[derive(Debug, Error)]
enum DispatchError {
    #[error("payload serialisation failed: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Stand-in for the real downstream API client: encodes the payload and logs
/// it with a little simulated latency
struct LoggingDispatcher;

impl Dispatcher for LoggingDispatcher {
    type Payload = Consignment;
    type Response = ();
    type Error = DispatchError;

    fn dispatch<'a>(&'a self, payload: Consignment, signature: &'a str) -> DispatchFuture<'a, (), DispatchError> {
        Box::pin(async move {
            let body = serde_json::to_string(&payload)?;
            tokio::time::sleep(Duration::from_millis(25)).await;
            info!(signature, body, "dispatched consignment");
            Ok(())
        })
    }
}

/// Parses the worker count from command-line arguments
fn worker_count(default: usize) -> usize {
    std::env::args().nth(1).and_then(|arg| arg.parse().ok()).unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep guard alive for entire application lifetime
    let _guard = tracing_setup::init("sd_dispatch", "./logs", tracing::Level::INFO);

    let workers = worker_count(4);
    let limiter = Arc::new(SlidingWindow::per_second(5)?);
    let dispatcher = Arc::new(LoggingDispatcher);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            tracing::info!("Shutdown signal received");
            running.store(false, Ordering::Relaxed);
        })?;
    }

    info!(workers, capacity = limiter.capacity(), window_ms = limiter.window().as_millis() as u64, "starting dispatch workers");

    let mut handles = Vec::new();
    for worker in 0..workers as u64 {
        let limiter = Arc::clone(&limiter);
        let dispatcher = Arc::clone(&dispatcher);
        let running = Arc::clone(&running);

        handles.push(tokio::spawn(async move {
            let signature = format!("worker-{worker}-signature");
            let mut batch = 0u64;

            while running.load(Ordering::Relaxed) {
                let payload = Consignment { id: worker * 1_000_000 + batch, reference: format!("batch-{worker}-{batch}") };

                if let Err(err) = limiter.admit(dispatcher.as_ref(), payload, &signature).await {
                    warn!(worker, %err, "admission failed");
                }

                batch += 1;
            }

            info!(worker, batches = batch, "worker stopped");
        }));
    }

    for handle in handles {
        handle.await?;
    }

    info!("shutdown complete");
    Ok(())
}
