use anyhow::Result;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use clap::Args;

use crate::config::AppConfig;
use crate::run::{self as pipeline, RunOutcome};
use crate::telemetry::{self};
use crate::telemetry::ops::schedule::Phase as SchedulePhase;

#[derive(Args)]
pub struct ScheduleCmd {
    /// Daily fire time, UTC
    #[arg(long, default_value = "16:00", value_parser = parse_time)]
    pub at: NaiveTime,
    /// Run once immediately before waiting for the first fire time
    #[arg(long, default_value_t = false)]
    pub run_on_startup: bool,
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM ({e})"))
}

/// The first instant strictly after `now` whose time of day is `at`.
pub fn next_fire(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now { today } else { today + TimeDelta::days(1) }
}

pub async fn run(cfg: &AppConfig, args: ScheduleCmd) -> Result<()> {
    let log = telemetry::schedule();
    let _g = log.root_span_kv([
        ("at", args.at.format("%H:%M:%S").to_string()),
        ("run_on_startup", args.run_on_startup.to_string()),
    ]).entered();

    if args.run_on_startup {
        invoke(cfg).await;
    }

    loop {
        let now = Utc::now();
        let fire_at = next_fire(now, args.at);
        let wait = (fire_at - now).to_std().unwrap_or_default();
        log.info(format!("⏰ next run at {}", fire_at.to_rfc3339()));

        let _w = log.span(&SchedulePhase::Wait).entered();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                log.info("👋 interrupted, stopping scheduler");
                return Ok(());
            }
        }
        drop(_w);

        invoke(cfg).await;
    }
}

/// A failed invocation is logged; the next one still fires.
async fn invoke(cfg: &AppConfig) {
    let log = telemetry::schedule();
    let _s = log.span(&SchedulePhase::Invocation).entered();
    match pipeline::execute(cfg, true).await {
        Ok(RunOutcome::Posted { record, .. }) => log.info_kv("✅ posted", [("uri", record.uri)]),
        Ok(other) => log.info(format!("invocation finished without a post: {other:?}")),
        Err(e) => log.error(format!("❌ invocation failed: {e:#}")),
    }
}
