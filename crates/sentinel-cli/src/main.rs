use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod enroll;
mod summary;

#[derive(Parser)]
#[command(name = "sentinel", about = "Sentinel face-identification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a gallery from labeled reference images
    Enroll {
        /// Folder with one subfolder of images per person
        #[arg(long, default_value = "references")]
        ref_dir: PathBuf,
        /// Gallery file to write
        #[arg(long, default_value = "encodings/gallery.json")]
        out: PathBuf,
    },
    /// Count frames per identity across event logs
    Summarize {
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Enroll { ref_dir, out } => {
            let mut detector = sentinel_hw::SidecarDetector::new();
            let report = enroll::collect_entries(&ref_dir, &mut detector)?;
            if !report.skipped.is_empty() {
                tracing::info!(skipped = report.skipped.len(), "some reference images were skipped");
            }
            if report.entries.is_empty() {
                println!(
                    "No encodings created; add images under {}/<name>/",
                    ref_dir.display()
                );
                return Ok(());
            }

            // Validate before writing so a bad gallery never lands on disk.
            let gallery = sentinel_core::Gallery::load(report.entries)?;
            sentinel_core::gallery::save_file(&out, gallery.entries())?;
            println!(
                "Saved {} encodings for {} people -> {}",
                gallery.len(),
                gallery.labels().len(),
                out.display()
            );
        }
        Commands::Summarize { log_dir } => {
            let files = summary::event_logs(&log_dir)?;
            if files.is_empty() {
                println!("No logs found.");
                return Ok(());
            }
            let counts = summary::identity_counts(&files)?;
            println!("Identity counts ({} logs):", files.len());
            for (identity, count) in counts {
                println!("  {identity:<16} {count}");
            }
        }
    }

    Ok(())
}
