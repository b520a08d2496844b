use std::time::Duration;

use ntp_clock::util::init_tracing;
use ntp_clock::{TimeSyncConfig, TimeSyncService};
use tokio::time::interval;

#[tokio::main]
async fn main() -> ntp_clock::Result<()> {
    init_tracing("info");

    // Optional server override: `cargo run --example clock -- pool.ntp.org`
    let config = match std::env::args().nth(1) {
        Some(server) => TimeSyncConfig::with_server(server),
        None => TimeSyncConfig::default(),
    };

    let service = TimeSyncService::new(config)?;
    service.start();
    let clock = service.handle();

    let mut ticker = interval(Duration::from_secs(1));
    for _ in 0..15 {
        ticker.tick().await;

        let local = chrono::Local::now();
        println!("Local: {}", local.format("%x %X"));

        if clock.is_synchronized() {
            println!("NTP:   {}", clock.now().format("%x %X"));
        } else {
            println!("NTP:   Synchronization in progress...");
        }
    }

    service.shutdown().await;
    Ok(())
}
