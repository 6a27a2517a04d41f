use clap::Parser;
use std::path::PathBuf;

/// siteaudit: technical SEO audits from the command line
#[derive(Parser, Debug)]
#[command(name = "siteaudit", version, about = "Technical SEO audit scanner")]
pub struct Args {
    /// Domains or URLs to audit (e.g. example.com, https://www.example.com)
    #[arg(value_name = "DOMAIN", required_unless_present = "file")]
    pub domains: Vec<String>,

    /// Read additional domains from a file, one per line (# starts a comment)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// TOML config file with scanner settings
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Per-request timeout in milliseconds (overrides the config file)
    #[arg(long = "timeout-ms", value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Print results as JSON instead of the text report
    #[arg(long = "json")]
    pub json: bool,

    /// Write persistence records (issues, summaries, run log) as JSON lines
    #[arg(short = 'o', long = "records", value_name = "PATH")]
    pub records: Option<PathBuf>,

    /// Increase verbosity level (use -v, -vv or -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
