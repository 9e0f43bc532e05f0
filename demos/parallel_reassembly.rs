// Producer/consumer reassembly over a FragmentChannel.
//
// Usage: parallel_reassembly [num_fragments] [seed]
use fragment_exchange::Core::{RawCodec, Surface};
use fragment_exchange::Exchange::ExchangeBuilder;
use std::env;

fn gradient(width: usize, height: usize) -> Surface {
    let mut pixels = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x % 251) as u8 + 1, (y % 251) as u8 + 1, ((x + y) % 251) as u8 + 1]);
        }
    }
    Surface::from_pixels(width, height, 3, pixels).expect("gradient dimensions are consistent")
}

fn main() -> fragment_exchange::Result<()> {
    let logenv = env_logger::Env::default().default_filter_or("info");
    env_logger::builder().parse_env(logenv).format_timestamp_micros().init();

    let args: Vec<String> = env::args().collect();
    let fragments = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(48);
    let seed = args.get(2).and_then(|s| s.parse().ok());

    let source = gradient(1000, 120);
    let mut builder = ExchangeBuilder::new().with_fragment_count(fragments);
    if let Some(seed) = seed {
        builder = builder.with_seed(seed);
    }

    let start = std::time::Instant::now();
    let run = builder.run_channel(&source, &RawCodec::new())?;
    let elapsed = start.elapsed();

    println!(
        "Reassembled {}/{} fragments in {} passes ({:.2?})",
        run.drained.applied, fragments, run.drained.passes, elapsed
    );
    println!("Duplicate visits skipped: {}", run.drained.duplicate_visits);
    if !run.drained.missing.is_empty() {
        println!("Missing fragments: {:?}", run.drained.missing);
    }

    let covered = run.produced.layout.sliced_width();
    let resized = if run.produced.layout.needs_resize() {
        source.resize_width(covered)?
    } else {
        source.clone()
    };
    let matches = (0..covered).all(|x| run.surface.pixel(x, 0) == resized.pixel(x, 0));
    println!("Row 0 matches source: {}", matches);
    Ok(())
}
