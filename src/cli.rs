use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "picup",
    about = "Minimal picture board — `picup /path/to/data` and it works",
    long_about = None,
    version = env!("GIT_VERSION"),
)]
pub struct Args {
    /// Data directory holding the site/ assets and the images.json store [default: .]
    pub root: Option<PathBuf>,

    /// HTTP port to listen on [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to TOML config file (overrides default search: ./picup.toml, ~/.config/picup/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind to localhost only (127.0.0.1) instead of all interfaces (0.0.0.0 + :::)
    #[arg(long)]
    pub localhost: bool,

    /// Fail requests with a server error when images.json is unparsable,
    /// instead of treating the store as empty
    #[arg(long)]
    pub strict_store: bool,
}
