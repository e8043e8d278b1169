use clap::{Args, Parser, Subcommand};

use formbind_http::RequestConfig;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "formbind", about = "Inspect how form keys bind")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a key into path segments
    Paths(PathsArgs),
    /// Show the element plan for a sequence prefix
    Layout(LayoutArgs),
    /// Print the effective configuration
    CheckConfig,
}

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    /// Path to a TOML config file (defaults apply when omitted)
    #[arg(long, global = true, env = "FORMBIND_CONFIG")]
    pub config: Option<String>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<RequestConfig, CliError> {
        match &self.config {
            Some(path) => {
                let config = RequestConfig::load(path)?;
                tracing::info!(config = %path, "loaded config");
                Ok(config)
            }
            None => Ok(RequestConfig::default()),
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct PathsArgs {
    /// Key in dot/bracket notation, e.g. `user.Phones[0].Label`
    pub key: String,
}

#[derive(Args, Clone, Debug)]
pub struct LayoutArgs {
    /// URL-encoded query string, e.g. `ids[]=a&ids[3]=b`
    pub query: String,

    /// Sequence prefix to inspect
    pub prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["formbind", "layout", "ids[]=a", "ids", "--config", "f.toml"]).unwrap();
        assert_eq!(cli.config.config.as_deref(), Some("f.toml"));
        match cli.command {
            Commands::Layout(args) => assert_eq!(args.prefix, "ids"),
            _ => panic!("expected layout"),
        }
    }

    #[test]
    fn no_config_means_defaults() {
        let args = ConfigArgs { config: None };
        assert_eq!(args.load().unwrap(), RequestConfig::default());
    }
}
