use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doorman")]
#[command(author, version, about = "Telegram bot that auto-approves join requests and welcomes new members", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file instead of `.env`
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Print aggregated statistics from the database
    Stats,

    /// Write all users to a CSV file without starting the bot
    ExportUsers {
        /// Output file
        #[arg(short, long, default_value = "users.csv")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["doorman"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.env_file.is_none());
    }

    #[test]
    fn test_run_webhook() {
        let cli = Cli::try_parse_from(["doorman", "run", "--webhook"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Run { webhook: true }));
    }

    #[test]
    fn test_export_users_with_env_file() {
        let cli = Cli::try_parse_from(["doorman", "export-users", "--output", "out.csv", "--env-file", ".env.prod"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::ExportUsers {
                output: PathBuf::from("out.csv")
            })
        );
        assert_eq!(cli.env_file, Some(PathBuf::from(".env.prod")));
    }
}
