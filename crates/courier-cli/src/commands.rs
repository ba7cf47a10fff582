use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use colored::Colorize;
use courier_channel::{ChannelGateway, ChannelMessage, InMemoryChannel};
use courier_codec::PayloadCodec;
use courier_identity::StaticCredentialProvider;
use courier_lifecycle::{DeletionOutcome, DeletionTrigger, LifecycleCoordinator};
use courier_store::{FsConnector, StoreAccess};
use courier_types::CourierConfig;

use crate::cli::*;

/// Collaborators shared by every command: the effective configuration and
/// a store rooted on local disk.
struct Context {
    config: CourierConfig,
    store: StoreAccess,
    credentials: Arc<StaticCredentialProvider>,
}

impl Context {
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config = match &cli.config {
            Some(path) => CourierConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => CourierConfig::default(),
        };
        let config = config.with_env().context("applying COURIER_* overrides")?;

        let credentials = Arc::new(StaticCredentialProvider::new());
        let connector = Arc::new(FsConnector::new(&cli.store_root));
        tracing::debug!(store_root = %cli.store_root.display(), "using local object store");
        let store = StoreAccess::from_config(&config, connector, credentials.clone());
        Ok(Self {
            config,
            store,
            credentials,
        })
    }

    fn codec(&self) -> PayloadCodec {
        PayloadCodec::new(&self.config, self.store.clone())
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load(&cli)?;
    match cli.command {
        Command::Encode(args) => cmd_encode(&ctx, args).await,
        Command::Decode(args) => cmd_decode(&ctx, args).await,
        Command::Send(args) => cmd_send(&ctx, args).await,
        Command::Delete(args) => cmd_delete(&ctx, args).await,
        Command::Trigger(args) => cmd_trigger(&ctx, args).await,
        Command::Config => cmd_config(&ctx),
    }
}

async fn cmd_encode(ctx: &Context, args: EncodeArgs) -> anyhow::Result<()> {
    let text = read_input(args.input.as_deref())?;
    let encoded = ctx.codec().encode_text(text).await?;
    if let Some(locator) = encoded.locator() {
        eprintln!("{} offloaded to {}", "✓".green().bold(), locator.to_string().cyan());
    }
    println!("{}", encoded.into_body());
    Ok(())
}

async fn cmd_decode(ctx: &Context, args: DecodeArgs) -> anyhow::Result<()> {
    let raw = read_input(args.input.as_deref())?;
    let text = ctx.codec().decode(&raw).await?;
    println!("{text}");
    Ok(())
}

async fn cmd_send(ctx: &Context, args: SendArgs) -> anyhow::Result<()> {
    let body = read_input(args.input.as_deref())?;
    let mut message = ChannelMessage::new(body);
    message.correlation_id = args.correlation_id;
    message.session_id = args.session_id;
    message.application_properties.extend(args.properties);

    let channel = Arc::new(InMemoryChannel::new());
    let gateway = ChannelGateway::new(
        &ctx.config,
        ctx.codec(),
        channel.clone(),
        ctx.credentials.clone(),
    );
    let outcome = gateway.send(message, &args.destination).await?;

    for published in channel.drain(&outcome.destination) {
        println!("{}", serde_json::to_string_pretty(&published)?);
    }
    match &outcome.claim_check {
        Some(locator) => eprintln!(
            "{} {} bytes to {} via claim check {}",
            "✓".green().bold(),
            outcome.body_len,
            outcome.destination.yellow(),
            locator.to_string().cyan()
        ),
        None => eprintln!(
            "{} {} bytes to {}",
            "✓".green().bold(),
            outcome.body_len,
            outcome.destination.yellow()
        ),
    }
    Ok(())
}

async fn cmd_delete(ctx: &Context, args: DeleteArgs) -> anyhow::Result<()> {
    let coordinator = LifecycleCoordinator::new(ctx.store.clone());
    let outcome = coordinator
        .delete_blob_and_container_if_last(&args.blob_url)
        .await?;
    print_outcome(&outcome);
    Ok(())
}

async fn cmd_trigger(ctx: &Context, args: TriggerArgs) -> anyhow::Result<()> {
    let body = read_input(args.input.as_deref())?;
    let trigger = DeletionTrigger::new(ctx.codec(), LifecycleCoordinator::new(ctx.store.clone()));
    let outcome = trigger.handle(&body).await?;
    print_outcome(&outcome);
    Ok(())
}

fn cmd_config(ctx: &Context) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(&ctx.config)?);
    let threshold = ctx.config.threshold();
    let state = if threshold.offload_enabled {
        "enabled".green()
    } else {
        "disabled".yellow()
    };
    eprintln!("offloading {state}");
    Ok(())
}

fn print_outcome(outcome: &DeletionOutcome) {
    match outcome {
        DeletionOutcome::ContainerDeleted { container } => {
            println!("{} Deleted container {}", "✓".green().bold(), container.yellow());
        }
        DeletionOutcome::BlobDeleted {
            container,
            blob,
            container_deleted,
        } => {
            println!("{} Deleted {}/{}", "✓".green().bold(), container.yellow(), blob);
            if *container_deleted {
                println!(
                    "  {} container {} was empty and is gone",
                    "✓".green(),
                    container.yellow()
                );
            }
        }
    }
}

/// Read a body from `path`, byte-for-byte, or from stdin without the one
/// line ending a shell or `echo` appends.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(strip_line_ending(buf))
        }
    }
}

fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse_cli(store_root: &Path, args: &[&str]) -> Cli {
        let root = store_root.to_string_lossy().into_owned();
        let mut argv = vec!["courier", "--store-root", root.as_str()];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, "{\"a\":1}").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "{\"a\":1}");
        assert!(read_input(Some(&dir.path().join("missing"))).is_err());
    }

    #[test]
    fn file_input_keeps_trailing_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.txt");
        std::fs::write(&path, "status: ok\n\n").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "status: ok\n\n");
    }

    #[test]
    fn only_one_line_ending_is_stripped() {
        assert_eq!(strip_line_ending("{}\n".into()), "{}");
        assert_eq!(strip_line_ending("{}\r\n".into()), "{}");
        assert_eq!(strip_line_ending("line\n\n".into()), "line\n");
        assert_eq!(strip_line_ending("no newline".into()), "no newline");
    }

    #[tokio::test]
    async fn delete_last_blob_removes_container_directory() {
        let dir = tempfile::tempdir().unwrap();
        let container = dir.path().join("stlocal").join("req-1");
        std::fs::create_dir_all(&container).unwrap();
        std::fs::write(container.join("input.csv"), "a,b").unwrap();

        let cli = parse_cli(
            dir.path(),
            &["delete", "https://stlocal.blob.core.windows.net/req-1/input.csv"],
        );
        run_command(cli).await.unwrap();
        assert!(!container.exists());
    }

    #[tokio::test]
    async fn delete_with_bad_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse_cli(dir.path(), &["delete", "not-a-url"]);
        assert!(run_command(cli).await.is_err());
    }
}
