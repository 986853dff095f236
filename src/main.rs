//! mediagrab - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use mediagrab::{
    cli::Args,
    config::Settings,
    download::download_media_list,
    error::{exit_codes, Error, Result},
    extractor::{extract, DEFAULT_REGISTRY},
    http,
    output::{download_bar, print_banner, print_error, print_info, print_warning, progress_updater_for},
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::TomlParse(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::NoMatchingExtractor(_)
                | Error::TooManyRedirects(_)
                | Error::RedirectCycle(_)
                | Error::Extractor(_)
                | Error::NoMediaFound => ExitCode::from(exit_codes::EXTRACT_ERROR as u8),
                Error::DownloadFailed(_)
                | Error::SegmentDownloadFailed { .. }
                | Error::RemuxFailed(_)
                | Error::FFmpegNotFound => ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8),
                Error::Cancelled => ExitCode::from(exit_codes::ABORT as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    if !args.quiet {
        print_banner();
    }

    // Load settings
    let mut settings = if args.config.exists() {
        Settings::load(&args.config)?
    } else {
        Settings::default()
    };

    // Merge CLI arguments into settings
    args.merge_into_settings(&mut settings);

    // Apply HTTP settings before any extractor runs
    http::configure(&settings.http);

    // Wire Ctrl-C to the cancellation token
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                print_warning("Interrupted, cleaning up...");
                cancel.cancel();
            }
        });
    }

    let mut failures = 0usize;
    for url in &args.urls {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        print_info(&format!("Extracting: {url}"));

        match process_url(url, &settings, args.quiet, &cancel).await {
            Ok(paths) => {
                for path in paths {
                    print_info(&format!("Saved: {}", path.display()));
                }
            }
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                // Keep going; remaining URLs may still work.
                print_error(&format!("Failed: {url}: {e}"));
                failures += 1;

                if args.urls.len() == 1 {
                    return Err(e);
                }
            }
        }
    }

    if failures > 0 {
        return Err(Error::DownloadFailed(format!(
            "{failures} of {} URLs failed",
            args.urls.len()
        )));
    }

    Ok(())
}

/// Extract one URL and download its media list.
async fn process_url(
    url: &str,
    settings: &Settings,
    quiet: bool,
    cancel: &CancellationToken,
) -> Result<Vec<std::path::PathBuf>> {
    let media_list = extract(&DEFAULT_REGISTRY, url, cancel).await?;

    tracing::info!("Extracted {} media item(s)", media_list.len());

    let (bar, progress) = if quiet {
        (None, None)
    } else {
        let bar = download_bar();
        let progress = progress_updater_for(&bar);
        (Some(bar), Some(progress))
    };

    let config = settings.download_config(progress);
    let result = download_media_list(&media_list, &config, cancel).await;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    result
}
