//! Console-driven digital watch
//!
//! Run with: cargo run --example watch

mod machine;

use std::io::{self, BufRead, Write};

use hsm_engine::EventCode;
use machine::WatchEvent;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut watch = machine::watch()?;
    watch.on_start()?;
    println!("\nThe sequence of adjustments in setting mode is: hour, minute, day, month.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nEvent[0=mode, 1=set, 2=tick, other=exit]->");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let Some(event) = line?
            .trim()
            .parse::<EventCode>()
            .ok()
            .and_then(WatchEvent::from_code)
        else {
            break;
        };

        watch.on_event(event)?;
    }

    println!("\n\nWatch application finished.");
    Ok(())
}
