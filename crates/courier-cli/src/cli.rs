use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "courier",
    about = "Courier: claim-check message relay and blob lifecycle tools",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file; COURIER_* environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory backing the local object store, one subdirectory per account
    #[arg(long, global = true, default_value = ".courier/store")]
    pub store_root: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encode a payload into a channel body, offloading it if oversized
    Encode(EncodeArgs),
    /// Resolve a channel body back into its payload
    Decode(DecodeArgs),
    /// Encode a message and print it as it would be published
    Send(SendArgs),
    /// Delete a blob by URL, and its container if it was the last blob
    Delete(DeleteArgs),
    /// Handle a deletion event body
    Trigger(TriggerArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct EncodeArgs {
    /// Payload file; read as-is. Reads stdin when omitted, dropping one trailing newline
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Body file; read as-is. Reads stdin when omitted, dropping one trailing newline
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct SendArgs {
    /// Queue or topic name
    pub destination: String,
    /// Message body file; read as-is. Reads stdin when omitted, dropping one trailing newline
    pub input: Option<PathBuf>,
    #[arg(long)]
    pub correlation_id: Option<String>,
    #[arg(long)]
    pub session_id: Option<String>,
    /// Application property as KEY=VALUE; may be repeated
    #[arg(long = "property", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// https://<account>.blob.<suffix>/<container>/<blob-path>
    pub blob_url: String,
}

#[derive(Args)]
pub struct TriggerArgs {
    /// Event body file; read as-is. Reads stdin when omitted, dropping one trailing newline
    pub input: Option<PathBuf>,
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn property_pairs_split_on_first_equals() {
        assert_eq!(
            parse_property("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert!(parse_property("novalue").is_err());
    }

    #[test]
    fn send_parses_repeated_properties() {
        let cli = Cli::parse_from([
            "courier",
            "send",
            "status-queue",
            "--property",
            "kind=status",
            "--property",
            "step=2",
        ]);
        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.destination, "status-queue");
                assert_eq!(args.properties.len(), 2);
            }
            _ => panic!("expected send"),
        }
    }
}
