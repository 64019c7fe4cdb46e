use resource_tail::{FollowConfig, Sink, follow_to_sink};
use std::env;
use std::process;

/// Log level comes from RESOURCE_TAIL_LOG (error/warn/info/debug/trace),
/// defaulting to info.
fn init_logging() {
    let level = env::var("RESOURCE_TAIL_LOG")
        .ok()
        .and_then(|value| value.trim().parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <path-or-url>", args[0]);
        process::exit(1);
    }

    let target = &args[1];

    match follow_to_sink(target, FollowConfig::default(), Vec::new(), &Sink::Stdout).await {
        Ok(stats) => {
            eprintln!(
                "Done following {}: {} deltas, {} bytes",
                target, stats.deltas, stats.bytes
            );
        }
        Err(e) => {
            eprintln!("Error following {}: {}", target, e);
            process::exit(1);
        }
    }
}
