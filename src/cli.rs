use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "memberroster")]
#[command(about = "Downloads the Premier HISCI supplier roster and builds the classified member roster workbook")]
#[command(version)]
pub struct Cli {
    /// Portal username (prompted on stdin when omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Portal password (prompted on stdin when omitted)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Working directory for downloaded and generated files
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Create the default configuration file at ./config/memberroster.toml and exit
    #[arg(long)]
    pub init: bool,

    /// Skip opening the finished workbook with the system default handler
    #[arg(long)]
    pub no_open: bool,

    /// Verbose logging (use -v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
