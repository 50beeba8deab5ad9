//! CLI tool for pkarchive ZIP operations.

mod commands;
mod exit_codes;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ZIP archive tool
#[derive(Parser)]
#[command(name = "pkarchive")]
#[command(author, version, about = "ZIP archive tool", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract files from archive (alias: x)
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = ".")]
        output: PathBuf,

        /// What to do with files that already exist
        #[arg(long, value_enum, default_value = "always")]
        overwrite: OverwriteMode,

        /// Skip CRC verification
        #[arg(long)]
        no_verify: bool,
    },

    /// Create archive (alias: a)
    #[command(alias = "a")]
    Create {
        /// Archive file to create
        archive: PathBuf,

        /// Files and directories to add
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write entries as they are read, without seeking
        #[arg(long)]
        streaming: bool,

        /// Compression level (0-9)
        #[arg(short = 'l', long, default_value = "6")]
        level: u32,

        /// Store files without compression
        #[arg(long)]
        store: bool,

        /// Archive comment
        #[arg(short = 'c', long)]
        comment: Option<String>,
    },

    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Only list paths starting with this prefix
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Test archive integrity (alias: t)
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OverwriteMode {
    Always,
    Never,
    Error,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Extract {
            archive,
            output,
            overwrite,
            no_verify,
        } => commands::extract(&archive, &output, overwrite, !no_verify, cli.quiet),

        Commands::Create {
            archive,
            files,
            streaming,
            level,
            store,
            comment,
        } => commands::create(&commands::CreateConfig {
            archive_path: &archive,
            files: &files,
            streaming,
            level,
            store,
            comment: comment.as_deref(),
            quiet: cli.quiet,
        }),

        Commands::List { archive, prefix } => commands::list(&archive, &prefix),

        Commands::Test { archive } => commands::test(&archive, cli.quiet),
    };

    std::process::exit(exit_code.code());
}
