//! Sequencing of the search workflow: stoplist, submission, polling, results.

pub mod orchestrator;
pub mod phase;
pub mod poll;

pub use orchestrator::{SearchOrchestrator, SearchOutcome, SearchRequest};
pub use phase::{PhaseTransition, SearchMachine, SearchPhase};
pub use poll::PollPolicy;
