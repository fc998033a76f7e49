//! Process bring-up: parse the CLI, initialise logging, build the runtime,
//! wire the pipeline, and join the scheduler on shutdown.

use std::process::ExitCode;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use evcap::cli::{self, Cli};
use evcap::input::demo::{DemoBackend, DemoSource};
use evcap::input::TransformerBuilder;
use evcap::pipeline::{EventHandler, EventLoop, StopHandle};
use evcap::runtime::Scheduler;
use evcap::storage::{StorageManager, Store};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if cli.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    // Log level comes from RUST_LOG; stdout JSON output turns logging off
    // so documents and log lines never interleave.
    let filter = if cli.logging_disabled() {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("evcap=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let workers = thread::available_parallelism()
        .map(|parallelism| parallelism.get() * 2)
        .unwrap_or(2)
        .max(2);
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!("failed to build runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(exit_code) => exit_code,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let scheduler = Arc::new(Scheduler::new());

    let manager = StorageManager::new(
        Arc::clone(&scheduler),
        Vec::new(),
        cli.store_n_events,
        cli.store_after(),
    );
    for store in cli::build_stores(&cli.output)? {
        manager.add_store(store);
    }
    let storage: Arc<dyn Store> = Arc::new(manager);

    let exit_code = Arc::new(AtomicI32::new(0));

    match cli.simulate {
        Some(count) => {
            let stop = StopHandle::new();
            let source = DemoSource::new(count, stop.clone());
            let transformer = TransformerBuilder::new()
                .pointer_key()
                .touch()
                .build(DemoBackend::new());
            let handler = EventHandler::new(Arc::clone(&storage), transformer);
            let event_loop = EventLoop::new(source, vec![handler], stop.clone());

            let loop_stop = stop.clone();
            Scheduler::spawn_result(
                &scheduler,
                event_loop.run(),
                move || loop_stop.stop(),
                Arc::clone(&exit_code),
            );
        }
        None => {
            anyhow::bail!(
                "no host input backend is compiled into this build; \
                 use --simulate to drive the pipeline with synthetic events"
            );
        }
    }

    scheduler.join().await;

    if exit_code.load(Ordering::SeqCst) == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
