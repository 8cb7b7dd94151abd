use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Run;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Pick, FetchSummary, FetchPoster, DownloadImage, Compose, Session, UploadBlob, CreateRecord }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Pick => "pick",
        Phase::FetchSummary => "fetch_summary",
        Phase::FetchPoster => "fetch_poster",
        Phase::DownloadImage => "download_image",
        Phase::Compose => "compose",
        Phase::Session => "session",
        Phase::UploadBlob => "upload_blob",
        Phase::CreateRecord => "create_record",
    }}
    fn span(&self) -> Span { match self {
        Phase::Pick => info_span!("pick"),
        Phase::FetchSummary => info_span!("fetch_summary"),
        Phase::FetchPoster => info_span!("fetch_poster"),
        Phase::DownloadImage => info_span!("download_image"),
        Phase::Compose => info_span!("compose"),
        Phase::Session => info_span!("session"),
        Phase::UploadBlob => info_span!("upload_blob"),
        Phase::CreateRecord => info_span!("create_record"),
    }}
}

impl OpMarker for Run {
    const NAME: &'static str = "run";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("run") }
}
