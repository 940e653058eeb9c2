//! EC Compass - comparison-shopping pipeline.
//!
//! EC Compass directs an autonomous browsing agent to visit e-commerce
//! sites, extracts product listings matching a keyword search, and asks a
//! language model to synthesize a Markdown comparison report. The agent
//! itself is an external collaborator behind the [`agent::BrowsingAgent`]
//! trait; this crate owns instruction compilation, result normalization,
//! and report synthesis.
//!
//! # Quick Start
//!
//! ```ignore
//! use ec_compass::{agent::ChatCompletionAgent, config::Settings, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load("settings.yaml".as_ref())?;
//!     let artifacts = pipeline::run(&settings, &ChatCompletionAgent, ".".as_ref()).await?;
//!     println!("report at {}", artifacts.report_path.display());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod report;

pub use error::{Error, Result};
