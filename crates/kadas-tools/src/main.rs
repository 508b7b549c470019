//! Replay a scripted min/max session on a headless canvas

use std::path::PathBuf;

use clap::Parser;
use kadas_tools::config::ConfigManager;
use kadas_tools::session::{Session, format_report};

#[derive(Parser)]
#[command(name = "kadas-replay")]
#[command(about = "Replay a scripted map tool session and print the min/max results")]
struct Args {
    /// Session file (RON)
    session: PathBuf,

    /// Config file, defaults to the user config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reduce on a background thread
    #[arg(long)]
    background: bool,
}

fn main() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kadas_tools=debug,kadas_raster=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let mut session = Session::load(&args.session)?;
    session.background |= args.background;
    tracing::info!(
        "Replaying {} actions from {}",
        session.actions.len(),
        args.session.display()
    );

    let report = session.run(manager.config());
    println!("{}", format_report(&report));
    Ok(())
}
