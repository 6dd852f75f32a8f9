//! CLI entry point for the linksave tool.

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result, bail};
use clap::Parser;
use linksave_core::{Config, FetchClient, Interceptor, scan_document};
use tracing::{debug, info, warn};
use url::Url;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    info!("Linksave starting");

    let mut config = resolve_config(&args)?;
    let client = FetchClient::with_timeouts(config.connect_timeout_secs, config.read_timeout_secs);

    // Read the page snapshot: from a URL, a local file, or stdin
    let html = match args.page.as_deref() {
        Some(page) if is_url(page) => {
            // A page URL also supplies the origin when none was configured
            if config.origin.is_empty() {
                if let Some(origin) = url_origin(page) {
                    debug!(origin = %origin, "derived origin from page URL");
                    config.origin = origin;
                }
            }
            client
                .fetch_text(page)
                .await
                .with_context(|| format!("failed to fetch page {page}"))?
        }
        Some(page) => std::fs::read_to_string(page)
            .with_context(|| format!("failed to read page file {page}"))?,
        None if !io::stdin().is_terminal() => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        None => {
            info!("No page provided. Pass a URL or file, or pipe HTML via stdin.");
            info!("Example: linksave http://localhost:8082/");
            return Ok(());
        }
    };

    let scan = scan_document(&html);

    for skipped in &scan.skipped {
        warn!(href = %skipped, "Skipped non-interceptable href");
    }

    if scan.is_empty() {
        info!("No interceptable links found on the page");
        return Ok(());
    }

    if args.list {
        for href in scan.hrefs() {
            println!("{href}");
        }
        return Ok(());
    }

    if config.origin.is_empty() {
        bail!("no origin available: pass --origin or use a page URL");
    }

    let interceptor = Interceptor::new(&config, client)?;
    let stats = interceptor.intercept_all(&scan.anchors).await?;

    info!(
        completed = stats.completed(),
        failed = stats.failed(),
        total = stats.total(),
        "Interception complete"
    );

    Ok(())
}

/// Builds the effective configuration: file config (if any) with CLI flags
/// layered on top.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(origin) = &args.origin {
        config.origin = origin.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.endpoint_prefix = prefix.clone();
    }
    if let Some(save_dir) = &args.save_dir {
        config.save_dir = save_dir.clone();
    }
    if args.concurrency.is_some() {
        config.concurrency = args.effective_concurrency();
    }

    Ok(config.normalized())
}

fn is_url(page: &str) -> bool {
    page.starts_with("http://") || page.starts_with("https://")
}

/// Extracts `scheme://host[:port]` from a page URL.
fn url_origin(page: &str) -> Option<String> {
    let url = Url::parse(page).ok()?;
    let host = url.host_str()?;
    let origin = match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    };
    Some(origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url_detects_schemes() {
        assert!(is_url("http://localhost:8082/"));
        assert!(is_url("https://example.com/page"));
        assert!(!is_url("page.html"));
        assert!(!is_url("/tmp/page.html"));
    }

    #[test]
    fn test_url_origin_with_port() {
        assert_eq!(
            url_origin("http://localhost:8082/some/page").as_deref(),
            Some("http://localhost:8082")
        );
    }

    #[test]
    fn test_url_origin_without_port() {
        assert_eq!(
            url_origin("https://example.com/page").as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_url_origin_invalid_is_none() {
        assert_eq!(url_origin("not a url"), None);
    }

    #[test]
    fn test_resolve_config_cli_flags_override_defaults() {
        let args = Args::try_parse_from([
            "linksave",
            "-o",
            "http://localhost:9000/",
            "-p",
            "files",
            "-c",
            "3",
        ])
        .unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.origin, "http://localhost:9000");
        assert_eq!(config.endpoint_prefix, "/files/");
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn test_resolve_config_defaults_without_flags() {
        let args = Args::try_parse_from(["linksave"]).unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.origin, "");
        assert_eq!(config.endpoint_prefix, "/upload/");
    }
}
