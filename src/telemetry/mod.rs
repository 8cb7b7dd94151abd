pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

pub fn run() -> LogCtx<ops::run::Run> { LogCtx::new(config::logs_are_json()) }
pub fn pick() -> LogCtx<ops::pick::Pick> { LogCtx::new(config::logs_are_json()) }
pub fn schedule() -> LogCtx<ops::schedule::Schedule> { LogCtx::new(config::logs_are_json()) }
