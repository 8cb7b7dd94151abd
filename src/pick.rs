use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::config::ScrapeConfig;
use crate::ranges;
use crate::telemetry::{self};
use crate::telemetry::ops::pick::Phase as PickPhase;

#[derive(Args)]
pub struct PickCmd {
    /// Use this index into the id space instead of a random draw
    #[arg(long)]
    pub draw: Option<u64>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Picked {
    pub id: u64,
    pub total: u64,
    pub summary_url: String,
    pub posters_url: String,
}

pub fn run(cfg: &ScrapeConfig, args: PickCmd) -> Result<()> {
    let log = telemetry::pick();
    let _g = log.root_span_kv([("draw", format!("{:?}", args.draw))]).entered();

    let picked = { let _s = log.span(&PickPhase::Draw).entered(); pick(cfg, args.draw)? };

    if telemetry::config::json_mode() {
        log.result(&picked)?;
    } else {
        log.info(format!("🎲 id={} (of {} addressable)", picked.id, picked.total));
        log.info(format!("  summary: {}", picked.summary_url));
        log.info(format!("  posters: {}", picked.posters_url));
    }
    Ok(())
}

pub fn pick(cfg: &ScrapeConfig, draw: Option<u64>) -> Result<Picked> {
    let total = ranges::total_count(&cfg.ranges);
    let id = match draw {
        Some(d) => ranges::pick_with_draw(&cfg.ranges, d),
        None => ranges::pick_random(&cfg.ranges, &mut rand::rng()),
    };
    let Some(id) = id else {
        bail!("draw {:?} is outside the {} addressable ids", draw, total);
    };
    Ok(Picked { id, total, summary_url: cfg.summary_url(id), posters_url: cfg.posters_url(id) })
}
