//! diarisk: train a diabetes-risk classifier and serve predictions over HTTP.
//!
//! Two subcommands share this library: `train` fits the network and writes
//! the model artifact; `serve` loads the artifact and answers
//! `POST /predict`. The feature schema in [`schema`] is the contract both
//! sides compile against.

pub mod api;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ml;
pub mod schema;
