use clap::Parser as _;
use isg_climate_tools::commands;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(clap::Parser)]
#[clap(version, about)]
enum Commands {
    Points(commands::points::Args),
    Climate(commands::climate::Args),
    Numbers(commands::numbers::Args),
    Set(commands::set::Args),
}

fn end<E: std::error::Error>(r: Result<(), E>) {
    std::process::exit(match r {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            let mut cause = e.source();
            while let Some(e) = cause {
                eprintln!("  because: {e}");
                cause = e.source();
            }
            1
        }
    });
}

fn main() {
    let warnings = || tracing_subscriber::filter::Targets::new().with_default(tracing::Level::WARN);
    let filter = match std::env::var("ISG_CLIMATE_TOOLS_LOG") {
        Ok(description) => match description.parse::<tracing_subscriber::filter::Targets>() {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("warning: ignoring malformed ISG_CLIMATE_TOOLS_LOG: {e}");
                warnings()
            }
        },
        Err(_) => warnings(),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    match Commands::parse() {
        Commands::Points(args) => end(commands::points::run(args)),
        Commands::Climate(args) => end(commands::climate::run(args)),
        Commands::Numbers(args) => end(commands::numbers::run(args)),
        Commands::Set(args) => end(commands::set::run(args)),
    }
}
