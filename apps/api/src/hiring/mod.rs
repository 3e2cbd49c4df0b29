// Hiring pipeline: the canonical stage catalog and the candidate stage state machine.
// catalog, engine, metrics and models are pure; handlers own all I/O.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;

pub use error::StageError;
