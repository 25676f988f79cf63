//! Client for the Tesserae intertext search service.
//!
//! A search resolves a stoplist, submits the search, polls the job until it
//! is done and publishes the first page of normalized results. Each step is a
//! single request through a [`transport::Transport`]; the
//! [`workflow::SearchOrchestrator`] sequences them and reports progress as
//! [`state::StateUpdate`] events.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod state;
pub mod transport;
pub mod workflow;

pub use config::Config;
pub use error::{AppError, Result};
