// `docuhuman process` - run one session over the given documents

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::auth::UserProfile;
use crate::cli::ProcessArgs;
use crate::config::Config;
use crate::history::HistoryEntry;
use crate::session::{JobStatus, SessionEvent, SourceFile, UploadJobManager, ACCEPTED_EXTENSIONS};

pub async fn run_process(args: &ProcessArgs, config: Config) -> Result<()> {
    let mut manager = UploadJobManager::from_config(&config)?;
    if !manager.is_signed_in() {
        bail!("Authentication required: pass --token or set DOCUHUMAN_TOKEN");
    }

    println!("Welcome back, {}!", UserProfile::greeting_name(manager.profile()));

    // Log session changes as they happen
    let mut events = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::JobFailed { job_id, message } = &event {
                warn!(job = %job_id, %message, "Job failed");
            } else {
                tracing::debug!(?event, "Session event");
            }
        }
    });

    // Ctrl-C abandons the request in flight and stops the run
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let failures =
        process_files(&mut manager, &args.files, &config.session.output_dir, &cancel).await?;

    println!();
    print_history(&manager, &args.search, args.all);

    info!(files = args.files.len(), failures, "Run finished");
    if failures > 0 {
        bail!("{} of {} documents failed", failures, args.files.len());
    }
    Ok(())
}

/// Submit each file in turn and save what comes back. Returns how many failed.
///
/// A document that was processed but could not be saved counts as failed; the
/// remaining files still run.
async fn process_files(
    manager: &mut UploadJobManager,
    files: &[PathBuf],
    output_dir: &Path,
    cancel: &CancellationToken,
) -> Result<usize> {
    let mut failures = 0usize;

    for path in files {
        let file = SourceFile::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        if !file.has_accepted_extension() {
            warn!(
                file = %file.name,
                "Expected one of .{}; sending anyway",
                ACCEPTED_EXTENSIONS.join(", .")
            );
        }

        println!("{} ({})", file.name, file.size_label());
        manager.select_file(file);

        match manager.submit(cancel).await? {
            JobStatus::Completed { .. } => match manager.save_result(output_dir).await {
                Ok(saved) => println!("  Humanized -> {}", saved.display()),
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, "Failed to save processed document");
                    eprintln!("  Processed but not saved: {}", e);
                }
            },
            JobStatus::Failed { message } => {
                failures += 1;
                eprintln!("  Failed: {}", message);
            }
            JobStatus::Cancelled => {
                println!("  Cancelled");
                break;
            }
        }
    }

    Ok(failures)
}

fn print_history(manager: &UploadJobManager, search: &str, all: bool) {
    let entries = manager.displayed_history(search, all);

    println!("History");
    if entries.is_empty() {
        println!("  No history found");
        return;
    }
    for entry in entries {
        println!("{}", format_entry(entry));
    }
}

fn format_entry(entry: &HistoryEntry) -> String {
    format!("  {:<32} {:<12} {}", entry.title, entry.date, entry.status)
}
