use filesession::cli::{Args, ConfigDiscovery, ConfigOverrides, execute};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(if args.verbose {
            "filesession=debug"
        } else {
            "filesession=info"
        })
        .with_writer(std::io::stderr)
        .init();

    info!("Starting filesession v{}", env!("CARGO_PKG_VERSION"));

    let config = ConfigDiscovery::resolve(ConfigOverrides {
        config_file: args.config,
        name: args.name,
        directory: args.directory,
    })?;
    info!(
        "Using session '{}' in {}",
        config.name, config.storage.directory
    );

    match execute(args.command, config).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
