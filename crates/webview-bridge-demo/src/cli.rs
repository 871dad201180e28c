use clap::Parser;

/// Open a webview window wired to a few Rust handlers.
#[derive(Parser, Debug)]
#[command(name = "webview-demo", version, about)]
pub struct Args {
    /// Config file path (TOML).
    #[arg(long)]
    pub config: Option<String>,

    /// Native webview library path override.
    #[arg(long)]
    pub library: Option<String>,

    /// URL to open instead of the built-in page.
    #[arg(long)]
    pub url: Option<String>,

    /// Enable native developer tools.
    #[arg(long)]
    pub debug: bool,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
