//! Console-driven car
//!
//! Run with: cargo run --example car
//! Set RUST_LOG=debug to watch the engine's transitions.

mod machine;

use std::io::{self, BufRead, Write};

use hsm_engine::EventCode;
use machine::CarEvent;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut car = machine::car()?;
    car.on_start()?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nSet Event[0=back, 1=forward, 2=status, 3=reverseGear, other=exit]=");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let Some(event) = line?
            .trim()
            .parse::<EventCode>()
            .ok()
            .and_then(CarEvent::from_code)
        else {
            break;
        };

        car.on_event(event)?;
        if let Some(state) = car.current_state() {
            println!("🚗 {}", car.hierarchy().name(&state).unwrap_or_default());
        }
    }

    println!("\n\nCar application finished.");
    Ok(())
}
