//! CLI argument parsing
//!
//! The query is the only argument. Settings come from `leakhunt.toml` and the
//! environment, log verbosity from `RUST_LOG`.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "leakhunt")]
#[command(author, version, about = "Hunt for leaked secrets in public GitHub repositories")]
pub struct Args {
    /// Brand name, GitHub repository URL or domain to investigate
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

impl Args {
    /// The request text, words joined by single spaces
    pub fn request(&self) -> String {
        self.query.join(" ")
    }
}
