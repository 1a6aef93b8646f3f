use clap::Args;
use flysync_core::config::{ConfigError, Manifold};
use flysync_core::service::input::{read_rows, read_rows_from_file, InputError};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Flags shared by every program.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Database manifold (prod or dev)
    #[arg(long, default_value = "prod", value_parser = parse_manifold)]
    pub manifold: Manifold,
    /// Commit database changes
    #[arg(long)]
    pub write: bool,
    /// Chatty
    #[arg(long)]
    pub verbose: bool,
    /// Very chatty
    #[arg(long)]
    pub debug: bool,
}

/// Flags for read-only programs, which always report on production.
#[derive(Debug, Clone, Args)]
pub struct ReadOnlyArgs {
    /// Chatty
    #[arg(long)]
    pub verbose: bool,
    /// Very chatty
    #[arg(long)]
    pub debug: bool,
}

impl ReadOnlyArgs {
    pub fn as_common(&self) -> CommonArgs {
        CommonArgs {
            manifold: Manifold::Prod,
            write: false,
            verbose: self.verbose,
            debug: self.debug,
        }
    }
}

fn parse_manifold(value: &str) -> Result<Manifold, String> {
    value.parse().map_err(|err: ConfigError| err.to_string())
}

/// Row input from a file or piped stdin.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// File of tab-separated rows; stdin when omitted
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    pub fn read_rows(&self) -> Result<Vec<String>, InputError> {
        if let Some(path) = &self.file {
            return read_rows_from_file(path);
        }
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(InputError::NoInput);
        }
        read_rows(stdin.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        input: InputArgs,
    }

    #[test]
    fn defaults_to_a_prod_dry_run() {
        let cli = TestCli::try_parse_from(["prog"]).unwrap();
        assert_eq!(cli.common.manifold, Manifold::Prod);
        assert!(!cli.common.write);
        assert!(cli.input.file.is_none());
    }

    #[test]
    fn manifold_and_flags_parse() {
        let cli = TestCli::try_parse_from([
            "prog",
            "--manifold",
            "dev",
            "--write",
            "--debug",
            "--file",
            "lines.tsv",
        ])
        .unwrap();
        assert_eq!(cli.common.manifold, Manifold::Dev);
        assert!(cli.common.write);
        assert!(cli.common.debug);
        assert_eq!(cli.input.file, Some(PathBuf::from("lines.tsv")));
    }

    #[derive(Debug, Parser)]
    struct ReportCli {
        #[command(flatten)]
        common: ReadOnlyArgs,
    }

    #[test]
    fn read_only_programs_have_no_write_or_manifold() {
        let cli = ReportCli::try_parse_from(["prog", "--verbose"]).unwrap();
        let common = cli.common.as_common();
        assert_eq!(common.manifold, Manifold::Prod);
        assert!(!common.write);
        assert!(common.verbose);

        assert!(ReportCli::try_parse_from(["prog", "--write"]).is_err());
        assert!(ReportCli::try_parse_from(["prog", "--manifold", "dev"]).is_err());
    }

    #[test]
    fn unknown_manifold_is_rejected() {
        assert!(TestCli::try_parse_from(["prog", "--manifold", "staging"]).is_err());
    }
}
