// Fragmenter -> Defragmenter reassembly, gated by the ready flag or a rendezvous.
//
// Usage: observer_reassembly [num_fragments] [--rendezvous]
use fragment_exchange::Core::{RawCodec, Surface};
use fragment_exchange::Exchange::{ExchangeBuilder, HandoffMode};
use std::env;
use std::time::Duration;

fn main() -> fragment_exchange::Result<()> {
    let logenv = env_logger::Env::default().default_filter_or("info");
    env_logger::builder().parse_env(logenv).format_timestamp_micros().init();

    let args: Vec<String> = env::args().collect();
    let fragments = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(16);
    let mode = if args.iter().any(|a| a == "--rendezvous") {
        HandoffMode::Rendezvous
    } else {
        HandoffMode::Handshake
    };

    let width = 640;
    let height = 64;
    let pixels = (0..width * height * 3).map(|i| (i % 250) as u8 + 1).collect();
    let source = Surface::from_pixels(width, height, 3, pixels)?;

    let run = ExchangeBuilder::new()
        .with_fragment_count(fragments)
        .with_handoff_mode(mode)
        .with_handshake_timeout(Duration::from_millis(50))
        .run_observer(&source, &RawCodec::new())?;

    println!("Mode: {:?}", mode);
    println!(
        "Produced {}, delivered {}, timed out {:?}",
        run.notified.produced,
        run.notified.delivered,
        run.notified.timeouts()
    );
    Ok(())
}
