use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[arg(help = "The main XSD file; its global elements become the root tables")]
    pub input: PathBuf,

    #[arg(help = "Additional XSD files providing type definitions")]
    pub type_files: Vec<PathBuf>,

    #[arg(short, long, help = "Domain config to use, by name")]
    pub domain: Option<String>,

    #[arg(short, long, help = "Domain config file; overrides --domain and detection")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        default_value = "config/domains",
        help = "Directory with one <domain>.yaml per domain"
    )]
    pub config_dir: PathBuf,

    #[arg(short, long, help = "Write the DDL to this file instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,

    #[arg(long, help = "Do not load the files of <xs:include> and <xs:import>")]
    pub no_follow_includes: bool,
}
