//! # tarball CLI
//!
//! Archive a directory tree into a gzip-compressed tar file.
//!
//! ## Usage
//! ```bash
//! # Write ./rootbase.tar.gz with every file under data/
//! tarball data
//!
//! # Choose the output, name members relative to the root, check the result
//! tarball data -o /backups/data.tar.gz --relative --verify
//! ```

use clap::Parser;
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tarball::{
    format_bytes, ArchiveReport, ArchiverBuilder, EntryNaming, Result, TarballError,
    DEFAULT_OUTPUT_NAME,
};
use tracing_subscriber::EnvFilter;

/// Archive a directory into a gzip-compressed tar file
#[derive(Parser)]
#[command(name = "tarball")]
#[command(version)]
#[command(about = "Recursively archive a directory into a .tar.gz")]
#[command(long_about = None)]
struct Cli {
    /// Directory to archive
    root: PathBuf,

    /// Output archive path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_NAME)]
    output: PathBuf,

    /// Name members relative to ROOT instead of by their walked path
    #[arg(long)]
    relative: bool,

    /// Descend into symlinked directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Keep filesystem order instead of sorting by name
    #[arg(long)]
    unsorted: bool,

    /// Write to a temporary file and rename it over the output only on success
    #[arg(long)]
    atomic: bool,

    /// Read the archive back and compare it with ROOT
    #[arg(long)]
    verify: bool,

    /// Show progress
    #[arg(long)]
    progress: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let naming = if cli.relative {
        EntryNaming::RelativeToRoot
    } else {
        EntryNaming::AsWalked
    };

    let progress = if cli.progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {pos} files {msg}")
                .map_err(|e| TarballError::internal(e.to_string()))?,
        );
        Some(pb)
    } else {
        None
    };

    let mut builder = ArchiverBuilder::new()
        .output_path(&cli.output)
        .naming(naming)
        .follow_symlinks(cli.follow_symlinks)
        .sort_entries(!cli.unsorted)
        .atomic(cli.atomic);
    if let Some(pb) = &progress {
        let pb = pb.clone();
        builder = builder.progress_callback(move |info| {
            pb.set_position(info.processed as u64);
            if let Some(item) = info.current_item {
                pb.set_message(item);
            }
        });
    }
    let archiver = builder.build()?;

    if !cli.json {
        println!(
            "{} {}",
            "Archiving".blue().bold(),
            cli.root.display().to_string().cyan()
        );
    }

    let result = archiver.archive(&cli.root);
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = result?;

    let verification = if cli.verify {
        let verification = archiver.verify(&cli.root)?;
        if !verification.is_valid() {
            return Err(TarballError::VerificationFailed(verification.summary()));
        }
        Some(verification)
    } else {
        None
    };

    if cli.json {
        let json = serde_json::json!({
            "report": report,
            "verification": verification,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    print_report(&report);
    if let Some(verification) = verification {
        println!(
            "{} Verified {} members",
            "✓".green().bold(),
            verification.members_checked.to_string().cyan()
        );
    }
    Ok(())
}

fn print_report(report: &ArchiveReport) {
    println!(
        "{} Created {}",
        "✓".green().bold(),
        report.output_path.display().to_string().yellow().bold()
    );
    println!("  Files: {}", report.files_added.to_string().cyan());
    if report.symlinks_added > 0 {
        println!("  Symlinks: {}", report.symlinks_added.to_string().cyan());
    }
    if report.entries_skipped > 0 {
        println!("  Skipped: {}", report.entries_skipped.to_string().yellow());
    }
    println!("  Read: {}", format_bytes(report.bytes_read).cyan());
    println!("  Archive: {}", format_bytes(report.archive_size).cyan());
    println!("  Time: {}", format_duration(report.duration).to_string().cyan());
}
