//! Run the approximation pipeline on a PACE-format instance.
//! Results go to stdout, progress and diagnostics to the log (stderr).

use goemans_steiner::{
    goemans_steiner_approximation_with, takahashi_matsuyama_steiner_approximation, Graph,
    SteinerTreeOptions,
};
use std::error::Error;
use std::time::{Duration, Instant};
use std::{env, fs, process};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() || args.len() > 3 {
        eprintln!("usage: goemans-steiner <FILENAME> [MAX_COMPONENT_SIZE] [SEED]");
        eprintln!("  FILENAME is a Steiner tree instance in the PACE .gr format.");
        process::exit(1);
    }
    let mut options = SteinerTreeOptions {
        use_2approx: true,
        ..SteinerTreeOptions::default()
    };
    if let Some(size) = args.get(1) {
        options.max_component_size = size.parse()?;
    }
    if let Some(seed) = args.get(2) {
        options.seed = seed.parse()?;
    }

    let content = fs::read_to_string(&args[0])?;
    let graph: Graph = content.parse()?;

    let (baseline, baseline_time) = measure_time(|| takahashi_matsuyama_steiner_approximation(&graph));
    println!(
        "takahashi-matsuyama: weight {:?} ({} ms)",
        baseline.weight_in(&graph),
        baseline_time.as_millis()
    );

    let (result, time) = measure_time(|| goemans_steiner_approximation_with(&graph, &options));
    let result = result?;
    println!(
        "goemans (k = {}, seed {}): weight {:?} ({} ms)",
        options.max_component_size,
        options.seed,
        result.cost,
        time.as_millis()
    );
    let mut edges: Vec<_> = result.tree.edges().iter().copied().collect();
    edges.sort_unstable();
    for (a, b) in edges {
        // report 1-based node indices as in the input format
        println!("E {} {}", a + 1, b + 1);
    }
    Ok(())
}

fn measure_time<F: FnOnce() -> R, R>(closure: F) -> (R, Duration) {
    let before = Instant::now();
    let result = closure();
    (result, before.elapsed())
}
