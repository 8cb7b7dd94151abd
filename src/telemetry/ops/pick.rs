use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Pick;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Draw }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Draw => "draw" } }
    fn span(&self) -> Span { match self { Phase::Draw => info_span!("draw") } }
}

impl OpMarker for Pick {
    const NAME: &'static str = "pick";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("pick") }
}
