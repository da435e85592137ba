//! Provider abstractions for the remote corpus service and stage invocation
//!
//! Trait seams keep the sync engine and the pipeline independent of the
//! concrete backend; the GCP implementations live in [`gcp`].

pub mod corpus;
pub mod gcp;
pub mod stage;

pub use corpus::CorpusService;
pub use stage::StageRunner;
