use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Schedule;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Wait, Invocation }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Wait => "wait",
        Phase::Invocation => "invocation",
    }}
    fn span(&self) -> Span { match self {
        Phase::Wait => info_span!("wait"),
        Phase::Invocation => info_span!("invocation"),
    }}
}

impl OpMarker for Schedule {
    const NAME: &'static str = "schedule";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("schedule") }
}
