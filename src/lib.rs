//! formguard - Behavioral scoring engine for detecting automated form
//! interaction
//!
//! formguard consumes a stream of classified human-interface events (key
//! presses, clicks, pointer movement, focus transitions, clipboard actions)
//! and maintains a continuously updated bot-likelihood score with an
//! associated confidence level. It flags automation without ever blocking
//! interaction itself.
//!
//! Pipeline: classified event → channel buffer → channel metrics →
//! weighted aggregation → score/confidence (+ hooks and report snapshots).

pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod metrics;
pub mod report;
pub mod score;
pub mod similarity;
pub mod state;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::DetectorConfig;
pub use detector::{BehaviorDetector, HookDecision, ProcessOutcome};
pub use error::ScoreError;
pub use events::{InteractionEvent, InteractionKind};
pub use report::{Report, ReportEnvelope, ReportSink};
pub use similarity::text_similarity;
pub use state::BehaviorState;

/// formguard version embedded in all report envelopes
pub const FORMGUARD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report envelopes
pub const PRODUCER_NAME: &str = "formguard";
