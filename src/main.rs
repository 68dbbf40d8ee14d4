use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use promptpix::client::{save_image, ClientApp, FileStateStore, HttpRelayClient, SubmitOutcome};
use promptpix::config::{ClientConfig, RelayConfig};
use promptpix::relay;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "promptpix")]
#[command(about = "Generate images from text prompts through a credential-holding relay")]
struct CliArgs {
    /// Relay base URL (overrides RELAY_URL).
    #[arg(long, global = true)]
    relay_url: Option<String>,

    /// Directory holding client state (overrides PROMPTPIX_STATE_DIR).
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the relay server
    Serve {
        /// Port to listen on (overrides PORT).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show the stored prompt, or replace it
    Prompt { text: Option<String> },

    /// Generate images for the stored prompt, optionally replacing it first
    Generate { prompt: Option<String> },

    /// List stored images, newest first
    List,

    /// Delete the image at a 1-based position
    Delete {
        #[arg(value_parser = parse_position)]
        position: usize,
    },

    /// Save the image at a 1-based position to disk
    Download {
        #[arg(value_parser = parse_position)]
        position: usize,

        /// Output directory.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn parse_position(input: &str) -> std::result::Result<usize, String> {
    match input.parse::<usize>() {
        Ok(position) if position >= 1 => Ok(position),
        _ => Err(format!(
            "Invalid position '{}'. Expected a number starting at 1",
            input
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptpix=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Serve { port } => {
            let mut config = RelayConfig::from_env()?;
            if let Some(port) = port {
                config.port = port;
            }
            info!("Starting relay with {:?}", config);
            relay::serve(config).await?;
        }
        Command::Prompt { text: Some(text) } => {
            let app = load_client(args.relay_url, args.state_dir)?;
            app.set_prompt(&text)?;
            println!("Prompt saved.");
        }
        Command::Prompt { text: None } => {
            let app = load_client(args.relay_url, args.state_dir)?;
            println!("{}", app.snapshot().prompt);
        }
        Command::Generate { prompt } => {
            let app = load_client(args.relay_url, args.state_dir)?;
            if let Some(prompt) = prompt {
                app.set_prompt(&prompt)?;
            }

            match app.submit().await? {
                SubmitOutcome::Generated(count) => {
                    println!("Generated {} image(s).", count);
                    print_images(&app);
                }
                _ => {
                    let state = app.snapshot();
                    bail!(state
                        .error
                        .unwrap_or_else(|| "Generation did not run".to_string()));
                }
            }
        }
        Command::List => {
            let app = load_client(args.relay_url, args.state_dir)?;
            print_images(&app);
        }
        Command::Delete { position } => {
            let app = load_client(args.relay_url, args.state_dir)?;
            if !app.delete(position - 1)? {
                bail!("No image at position {}", position);
            }
            println!("Deleted image {}.", position);
        }
        Command::Download { position, output } => {
            let app = load_client(args.relay_url, args.state_dir)?;
            let state = app.snapshot();
            let Some(record) = state.images.get(position - 1) else {
                bail!("No image at position {}", position);
            };
            let path = save_image(record, position - 1, &output)?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

fn load_client(relay_url: Option<String>, state_dir: Option<PathBuf>) -> Result<ClientApp> {
    let mut config = ClientConfig::from_env();
    if let Some(relay_url) = relay_url {
        config.relay_url = relay_url;
    }
    if let Some(state_dir) = state_dir {
        config.state_dir = state_dir;
    }

    info!(
        "Using relay at {} with state in {}",
        config.relay_url,
        config.state_dir.display()
    );

    let store = FileStateStore::new(&config.state_dir)?;
    let relay = HttpRelayClient::new(config.relay_url);
    Ok(ClientApp::load(Arc::new(relay), Arc::new(store))?)
}

fn print_images(app: &ClientApp) {
    let state = app.snapshot();
    if state.images.is_empty() {
        println!("No images yet. Try a prompt like: \"a neon cyberpunk city at night, rain, reflections\"");
        return;
    }

    for (index, record) in state.images.iter().enumerate() {
        println!(
            "{:>3}. {}  {}  {} chars",
            index + 1,
            record.created_at_display(),
            record.media_type().unwrap_or("unknown"),
            record.data_url.len()
        );
    }
}
