//! `finch run` – activate the fetch job when it is ready and serve the bridge socket.

use anyhow::Result;
use finch_core::bridge::MetricsBridge;
use finch_core::fetcher::{Activation, SeedFetcher};
use finch_core::platform::{
    AlwaysCharging, BackoffPolicy, DeviceConditions, JobControl, JobRunner, RunResult, SysfsPower,
};
use std::sync::Arc;
use std::time::Duration;

use super::Context;
use crate::cli::bridge_socket;

pub async fn run_jobs(ctx: &Context, once: bool) -> Result<()> {
    let fetcher = Arc::new(ctx.fetcher());
    let decision = fetcher.schedule_if_needed().await?;
    tracing::debug!(?decision, "startup schedule check");

    let conditions: Arc<dyn DeviceConditions> = if ctx.cfg.require_charging_check {
        Arc::new(SysfsPower::default())
    } else {
        Arc::new(AlwaysCharging)
    };
    let bridge = MetricsBridge::start(ctx.records_path())?;
    let control = Arc::new(JobControl::new());
    let runner = JobRunner::new(
        Arc::clone(&fetcher),
        ctx.scheduler.clone(),
        conditions,
        Arc::clone(&ctx.clock),
    )
    .with_backoff(BackoffPolicy::from_config(&ctx.cfg.backoff_or_default()))
    .with_control(Arc::clone(&control))
    .with_bridge(bridge.clone());

    if once {
        let result = runner.run_once().await?;
        bridge.add_task_to_block().await;
        print_result(&result, ctx.settings.max_request_count);
        return Ok(());
    }

    let socket_path = ctx.socket_path();
    let server =
        bridge_socket::spawn_bridge_listener(bridge.clone(), Arc::clone(&control), &socket_path)?;
    tracing::debug!(path = %socket_path.display(), "bridge socket listening");

    let poll = Duration::from_secs(ctx.cfg.poll_interval_secs.max(1));
    let ticker = spawn_schedule_ticker(Arc::clone(&fetcher), poll);
    let signal_control = Arc::clone(&control);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            signal_control.shutdown();
        }
    });

    runner.run_until_shutdown(poll).await;

    ticker.abort();
    server.abort();
    let _ = std::fs::remove_file(&socket_path);
    bridge.add_task_to_block().await;
    Ok(())
}

/// Re-check the schedule every `poll` so a long-running loop picks up an expired stamp.
fn spawn_schedule_ticker(fetcher: Arc<SeedFetcher>, poll: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = fetcher.schedule_if_needed().await {
                tracing::warn!("schedule check failed: {:#}", e);
            }
        }
    })
}

fn print_result(result: &RunResult, max_request_count: u32) {
    match result {
        RunResult::NotReady => println!("No seed fetch job is ready."),
        RunResult::NotCharging => println!("Seed fetch job is waiting for the charger."),
        RunResult::Stopped { .. } => println!("Seed fetch job was stopped."),
        RunResult::Finished {
            finished,
            rescheduled,
        } => {
            match &finished.activation {
                Activation::Completed {
                    result_code,
                    outcome,
                } => println!("Seed fetch finished: {} ({:?}).", result_code, outcome),
                Activation::ConfigurationInvalid(e) => println!("Seed fetch not attempted: {}.", e),
            }
            if let Some(next) = rescheduled {
                println!(
                    "Attempt {} of {} scheduled.",
                    next.extras.request_count + 1,
                    max_request_count
                );
            }
        }
    }
}
