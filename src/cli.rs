//! Command-line arguments for the `clara-ao` binary.

use clap::{Parser, Subcommand};

/// AO message adapter for Clara marketplace agents
#[derive(Parser, Debug)]
#[command(name = "clara-ao")]
#[command(about = "Read and post AO messages with a Clara agent configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch one message with its body
    Message {
        /// Transaction id of the message
        id: String,
    },
    /// List the newest incoming messages
    Incoming {
        /// Number of messages to return
        #[arg(default_value_t = 10)]
        count: usize,
    },
    /// Read a profile through a dry run
    Profile {
        /// Profile process id
        process_id: String,
    },
    /// Reply to a message. This build has no signer, so it always fails with a configuration error
    Send {
        /// Message being replied to
        message_id: String,
        /// Reply text
        text: String,
    },
    /// Poll for incoming messages until interrupted
    Poll,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_incoming_count_defaults_to_ten() {
        let cli = Cli::try_parse_from(["clara-ao", "incoming"]).unwrap();
        assert_eq!(cli.command, Command::Incoming { count: 10 });

        let cli = Cli::try_parse_from(["clara-ao", "incoming", "3"]).unwrap();
        assert_eq!(cli.command, Command::Incoming { count: 3 });
    }

    #[test]
    fn test_send_takes_id_and_text() {
        let cli = Cli::try_parse_from(["clara-ao", "send", "abc123", "hello world"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Send {
                message_id: "abc123".to_string(),
                text: "hello world".to_string(),
            }
        );
    }

    #[test]
    fn test_bad_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["clara-ao"]).is_err());
        assert!(Cli::try_parse_from(["clara-ao", "incoming", "many"]).is_err());
        assert!(Cli::try_parse_from(["clara-ao", "message"]).is_err());
        assert!(Cli::try_parse_from(["clara-ao", "poll", "extra"]).is_err());
    }

    #[test]
    fn test_send_help_mentions_missing_signer() {
        let help = Cli::command()
            .find_subcommand_mut("send")
            .map(|c| c.render_help().to_string())
            .unwrap();
        assert!(help.contains("no signer"));
    }
}
