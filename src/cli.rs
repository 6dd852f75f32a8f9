//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use linksave_core::DEFAULT_CONCURRENCY;

/// Turn a page's download links into saved files.
///
/// Linksave scans an HTML page for anchors, then intercepts each one:
/// instead of following the link, the target resource is fetched as a
/// binary body and saved under a filename derived from the link.
#[derive(Parser, Debug)]
#[command(name = "linksave")]
#[command(author, version, about)]
pub struct Args {
    /// Page to scan: a URL, a local HTML file, or omitted to read stdin
    pub page: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Origin requests are sent to, e.g. http://localhost:8082
    /// (defaults to the page URL's origin when the page is a URL)
    #[arg(short, long)]
    pub origin: Option<String>,

    /// Endpoint prefix download requests are addressed under
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Directory saved files land in
    #[arg(short = 'd', long)]
    pub save_dir: Option<PathBuf>,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List the interceptable links found on the page without downloading
    #[arg(short = 'l', long)]
    pub list: bool,
}

impl Args {
    /// Returns the effective concurrency, falling back to the default.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency
            .map_or(DEFAULT_CONCURRENCY, usize::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["linksave"]).unwrap();
        assert_eq!(args.page, None);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.concurrency, None);
        assert!(!args.list);
        assert_eq!(args.effective_concurrency(), 10); // DEFAULT_CONCURRENCY
    }

    #[test]
    fn test_cli_positional_page() {
        let args = Args::try_parse_from(["linksave", "http://localhost:8082/"]).unwrap();
        assert_eq!(args.page.as_deref(), Some("http://localhost:8082/"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["linksave", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["linksave", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["linksave", "--verbose", "--verbose"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["linksave", "-q"]).unwrap();
        assert!(args.quiet);

        let args = Args::try_parse_from(["linksave", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["linksave", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["linksave", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["linksave", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_origin_flag() {
        let args =
            Args::try_parse_from(["linksave", "-o", "http://localhost:9000", "page.html"]).unwrap();
        assert_eq!(args.origin.as_deref(), Some("http://localhost:9000"));
        assert_eq!(args.page.as_deref(), Some("page.html"));
    }

    #[test]
    fn test_cli_prefix_flag() {
        let args = Args::try_parse_from(["linksave", "--prefix", "/files/"]).unwrap();
        assert_eq!(args.prefix.as_deref(), Some("/files/"));
    }

    #[test]
    fn test_cli_save_dir_flag() {
        let args = Args::try_parse_from(["linksave", "-d", "/tmp/out"]).unwrap();
        assert_eq!(args.save_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_cli_concurrency_short_flag() {
        let args = Args::try_parse_from(["linksave", "-c", "5"]).unwrap();
        assert_eq!(args.concurrency, Some(5));
        assert_eq!(args.effective_concurrency(), 5);
    }

    #[test]
    fn test_cli_concurrency_min_value() {
        let args = Args::try_parse_from(["linksave", "-c", "1"]).unwrap();
        assert_eq!(args.concurrency, Some(1));
    }

    #[test]
    fn test_cli_concurrency_max_value() {
        let args = Args::try_parse_from(["linksave", "-c", "100"]).unwrap();
        assert_eq!(args.concurrency, Some(100));
    }

    #[test]
    fn test_cli_concurrency_zero_rejected() {
        let result = Args::try_parse_from(["linksave", "-c", "0"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_concurrency_over_max_rejected() {
        let result = Args::try_parse_from(["linksave", "-c", "101"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_list_flag() {
        let args = Args::try_parse_from(["linksave", "-l", "page.html"]).unwrap();
        assert!(args.list);

        let args = Args::try_parse_from(["linksave", "--list", "page.html"]).unwrap();
        assert!(args.list);
    }

    #[test]
    fn test_cli_config_flag() {
        let args = Args::try_parse_from(["linksave", "--config", "/etc/linksave.json"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/linksave.json")));
    }

    #[test]
    fn test_cli_combined_flags() {
        let args = Args::try_parse_from([
            "linksave",
            "-c",
            "5",
            "-o",
            "http://localhost:8082",
            "-d",
            "/tmp/dl",
            "http://localhost:8082/",
        ])
        .unwrap();
        assert_eq!(args.concurrency, Some(5));
        assert_eq!(args.origin.as_deref(), Some("http://localhost:8082"));
        assert_eq!(args.save_dir, Some(PathBuf::from("/tmp/dl")));
        assert_eq!(args.page.as_deref(), Some("http://localhost:8082/"));
    }
}
