//! CLI module for the RAG pipeline
//!
//! Provides subcommands for running the service:
//! - `serve`: HTTP API server (default)

pub mod serve;

use clap::{Parser, Subcommand};

/// RAG Pipeline - retrieval-augmented chat over vector and graph backends
#[derive(Parser)]
#[command(name = "rag-pipeline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The chosen subcommand, `serve` when none is given
    pub fn into_command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Serve(serve::ServeArgs::default()))
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve(serve::ServeArgs),
}
