//! Command line interface of the `marcbench` binary.
//!
//! Defines the [`Cli`] struct with subcommands [`Command`] (count,
//! convert, split, merge, health) and global transport flags
//! (--engine, --server).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use marcbench_core::RecordFormat;

/// Batch driver for the marclite record-processing engine.
#[derive(Debug, Parser)]
#[command(name = "marcbench", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the engine executable for local runs.
    #[arg(long, global = true)]
    pub engine: Option<PathBuf>,

    /// Base URL of an engine service, e.g. `http://localhost:8000`.
    /// When set, jobs run over HTTP instead of a local process.
    #[arg(long, global = true)]
    pub server: Option<String>,
}

/// Serialization format accepted on the command line, mapped to
/// [`RecordFormat`] internally.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// ISO 2709 binary records.
    Mrc,
    /// Line-mode mnemonic records.
    Mrk,
    /// MARCXML documents.
    Marcxml,
}

impl From<FormatArg> for RecordFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Mrc => RecordFormat::Binary,
            FormatArg::Mrk => RecordFormat::Mnemonic,
            FormatArg::Marcxml => RecordFormat::Xml,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Count the records in a file.
    Count {
        /// Record file to read.
        input: PathBuf,
    },

    /// Convert a file to another serialization format.
    Convert {
        /// Record file to read.
        input: PathBuf,

        /// Where to write the converted records.
        #[arg(short, long)]
        output: PathBuf,

        /// Target serialization format.
        #[arg(long)]
        to: FormatArg,
    },

    /// Split a file into fixed-size chunks.
    Split {
        /// Record file to read.
        input: PathBuf,

        /// Records per output chunk.
        #[arg(long)]
        every: u64,

        /// Directory that receives the chunk files.
        #[arg(long)]
        out_dir: PathBuf,

        /// Convert chunks to this format while splitting.
        #[arg(long)]
        to: Option<FormatArg>,
    },

    /// Merge several files into one.
    Merge {
        /// Record files to read, in order.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Where to write the merged records.
        #[arg(short, long)]
        output: PathBuf,

        /// Target serialization format.
        #[arg(long)]
        to: FormatArg,
    },

    /// Probe a running engine service.
    Health,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_count_subcommand() {
        let cli = Cli::parse_from(["marcbench", "count", "records.mrc"]);
        match cli.command {
            Command::Count { input } => assert_eq!(input, PathBuf::from("records.mrc")),
            _ => panic!("expected Count command"),
        }
    }

    #[test]
    fn cli_parses_convert_subcommand() {
        let cli = Cli::parse_from([
            "marcbench",
            "convert",
            "records.mrc",
            "-o",
            "records.xml",
            "--to",
            "marcxml",
        ]);
        match cli.command {
            Command::Convert { input, output, to } => {
                assert_eq!(input, PathBuf::from("records.mrc"));
                assert_eq!(output, PathBuf::from("records.xml"));
                assert!(matches!(to, FormatArg::Marcxml));
            }
            _ => panic!("expected Convert command"),
        }
    }

    #[test]
    fn cli_parses_split_without_a_target_format() {
        let cli = Cli::parse_from([
            "marcbench",
            "split",
            "big.mrc",
            "--every",
            "1000",
            "--out-dir",
            "chunks",
        ]);
        match cli.command {
            Command::Split {
                input,
                every,
                out_dir,
                to,
            } => {
                assert_eq!(input, PathBuf::from("big.mrc"));
                assert_eq!(every, 1000);
                assert_eq!(out_dir, PathBuf::from("chunks"));
                assert!(to.is_none());
            }
            _ => panic!("expected Split command"),
        }
    }

    #[test]
    fn cli_parses_merge_inputs_in_order() {
        let cli = Cli::parse_from([
            "marcbench",
            "merge",
            "a.mrc",
            "b.mrc",
            "-o",
            "all.mrk",
            "--to",
            "mrk",
        ]);
        match cli.command {
            Command::Merge { inputs, output, to } => {
                assert_eq!(inputs, [PathBuf::from("a.mrc"), PathBuf::from("b.mrc")]);
                assert_eq!(output, PathBuf::from("all.mrk"));
                assert!(matches!(to, FormatArg::Mrk));
            }
            _ => panic!("expected Merge command"),
        }
    }

    #[test]
    fn cli_rejects_merge_without_inputs() {
        let parsed = Cli::try_parse_from(["marcbench", "merge", "-o", "all.mrc", "--to", "mrc"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_parses_global_transport_flags() {
        let cli = Cli::parse_from([
            "marcbench",
            "--server",
            "http://localhost:8000",
            "health",
        ]);
        assert_eq!(cli.server.as_deref(), Some("http://localhost:8000"));
        assert!(matches!(cli.command, Command::Health));
    }

    #[test]
    fn format_args_map_to_wire_tags() {
        assert_eq!(RecordFormat::from(FormatArg::Mrc).as_tag(), "mrc");
        assert_eq!(RecordFormat::from(FormatArg::Mrk).as_tag(), "mrk");
        assert_eq!(RecordFormat::from(FormatArg::Marcxml).as_tag(), "marcxml");
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
