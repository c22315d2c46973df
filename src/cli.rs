use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Configuration file, defaults to `<config dir>/weatherdesk/config.toml`.
    #[clap(long, short)]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[clap(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the weather for a place name or `<lat>,<lon>`.
    #[clap(alias = "w")]
    Weather {
        /// Location query, e.g. `Paris` or `37.7749,-122.4194`.
        #[clap(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show the weather for the current position.
    Here,

    /// Serve the JSON API.
    Serve {
        #[clap(long, short, default_value = "3000")]
        port: u16,
    },
}

impl Command {
    /// Query words joined back into one string
    #[must_use]
    pub fn query(&self) -> Option<String> {
        match self {
            Self::Weather { query } => Some(query.join(" ")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_query_words() {
        let cli = Cli::try_parse_from(["weatherdesk", "weather", "New", "York"]).unwrap();
        assert_eq!(cli.command.query().as_deref(), Some("New York"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_serve_port() {
        let cli = Cli::try_parse_from(["weatherdesk", "-v", "serve", "--port", "8080"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Serve { port: 8080 }));
    }

    #[test]
    fn test_weather_requires_query() {
        assert!(Cli::try_parse_from(["weatherdesk", "weather"]).is_err());
    }
}
