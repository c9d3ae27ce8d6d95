//! Command-line front end
//!
//! Each invocation is one session.
//!
//! # Example
//!
//! ```bash
//! # Humanize two documents and write the results next to them
//! docuhuman --token "$ID_TOKEN" process thesis.docx chapter_1.pdf --output out/
//!
//! # Show who the credential belongs to
//! docuhuman --token "$ID_TOKEN" whoami
//! ```

pub mod process;
pub mod whoami;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// DocuHuman - humanize AI-written documents
#[derive(Parser, Debug)]
#[command(
    name = "docuhuman",
    version,
    about = "Upload documents to the DocuHuman paraphrasing service"
)]
pub struct Cli {
    /// Processing endpoint URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Identity credential from the sign-in provider
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Abandon a request that takes longer than this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one or more documents
    Process(ProcessArgs),
    /// Show the profile carried by the credential
    Whoami,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Documents to process (.docx or .pdf)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory for processed documents
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Start with an empty history instead of the sample entries
    #[arg(long)]
    pub no_seed: bool,

    /// Print the whole history instead of the most recent entries
    #[arg(long)]
    pub all: bool,

    /// Only print history entries whose title contains this text
    #[arg(long, default_value = "")]
    pub search: String,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint.url = endpoint.clone();
        }
        if let Some(token) = &self.token {
            config.auth.token = Some(token.clone());
        }
        if let Some(secs) = self.timeout {
            config.endpoint.request_timeout = Some(std::time::Duration::from_secs(secs));
        }
        if let Commands::Process(args) = &self.command {
            if let Some(output) = &args.output {
                config.session.output_dir = output.clone();
            }
            if args.no_seed {
                config.session.seed_history = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process() {
        let cli = Cli::parse_from([
            "docuhuman",
            "--token",
            "abc",
            "process",
            "a.docx",
            "b.pdf",
            "-o",
            "out",
            "--no-seed",
        ]);

        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.auth.token.as_deref(), Some("abc"));
        assert_eq!(config.session.output_dir, PathBuf::from("out"));
        assert!(!config.session.seed_history);
        match cli.command {
            Commands::Process(args) => assert_eq!(args.files.len(), 2),
            _ => panic!("expected process command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "docuhuman",
            "whoami",
            "--endpoint",
            "http://example.test/paraphrase",
            "--timeout",
            "90",
        ]);

        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.endpoint.url, "http://example.test/paraphrase");
        assert_eq!(
            config.endpoint.request_timeout,
            Some(std::time::Duration::from_secs(90))
        );
    }

    #[test]
    fn test_process_requires_files() {
        assert!(Cli::try_parse_from(["docuhuman", "process"]).is_err());
    }
}
