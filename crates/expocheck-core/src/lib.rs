pub mod client;
pub mod render;

pub use client::{
    controller::{
        CancelToken, ProgressView, ScanController, ScanOutcome, SubmitError, POLL_INTERVAL,
    },
    http::HttpTransport,
    settings::ClientSettings,
    ClientState, Finding, ScanAck, ScanRequest, ScanStatus, ScanTransport, TransportError,
};
pub use render::{render_findings, OutputFormat, NO_FINDINGS_PLACEHOLDER};
