use clap::{ArgAction, Parser};
use keepfan::naming::NameStrategy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "keepfan", bin_name = "keepfan", version)]
#[command(
    about = "Export a Google Keep takeout archive to text, markdown, OPML and PDF",
    long_about = None
)]
pub struct Cli {
    /// Takeout zip to read
    pub archive: Option<PathBuf>,

    /// Only export entries whose name contains this string
    #[arg(long, value_name = "PATH", help_heading = "Input")]
    pub sub_folder: Option<String>,

    /// Tag added to every note (repeatable)
    #[arg(long = "tag", value_name = "TAG", help_heading = "Input")]
    pub tags: Vec<String>,

    /// Dump every note to stdout
    #[arg(long, help_heading = "Outputs")]
    pub console: bool,

    /// Write one .txt per note into DIR
    #[arg(long, value_name = "DIR", help_heading = "Outputs")]
    pub text_dir: Option<PathBuf>,

    /// Write one .md per note into DIR
    #[arg(long, value_name = "DIR", help_heading = "Outputs")]
    pub markdown_dir: Option<PathBuf>,

    /// Write every note into a single OPML file
    #[arg(long, value_name = "FILE", help_heading = "Outputs")]
    pub outline_file: Option<PathBuf>,

    /// Write word-limited PDF batches into DIR
    #[arg(long, value_name = "DIR", help_heading = "Outputs")]
    pub paged_dir: Option<PathBuf>,

    /// How file names are derived: direct, favor_date or date_and_title
    #[arg(long, value_name = "STRATEGY", help_heading = "Naming")]
    pub name_strategy: Option<NameStrategy>,

    /// Group files into YYYY/ folders
    #[arg(long, help_heading = "Naming")]
    pub year_folders: bool,

    /// Group files into YYYY/MM-Month/ folders (needs --year-folders)
    #[arg(long, help_heading = "Naming")]
    pub month_folders: bool,

    /// Fail instead of creating missing output directories
    #[arg(long, help_heading = "Naming")]
    pub no_create_dirs: bool,

    /// Maximum words per PDF batch
    #[arg(long, value_name = "N", help_heading = "Options")]
    pub word_limit: Option<usize>,

    /// Worker threads for the dispatcher
    #[arg(long, value_name = "N", help_heading = "Options")]
    pub workers: Option<usize>,

    /// Config file (defaults to the per-user config location)
    #[arg(long, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, help_heading = "Options")]
    pub verbose: u8,
}
