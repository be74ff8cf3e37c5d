use std::path::PathBuf;

use clap::Parser;

use safra_rs::config::Config;
use safra_rs::dot::DotConfig;
use safra_rs::explore::determinize;
use safra_rs::io::load_automaton;
use safra_rs::transform::Engine;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Input file with a BUECHI automaton.
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Transformer: `single` or `multi`.
    #[clap(long, value_name = "ENGINE", default_value = "single")]
    engine: Engine,

    /// State table size (in bits, so at most `2^size - 1` states).
    #[clap(long, value_name = "INT", default_value = "20")]
    storage_bits: usize,

    /// Run both transformers on every step and check they agree.
    #[clap(long)]
    cross_check: bool,

    /// Write the determinized automaton in DOT format.
    #[clap(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Label states with their Safra trees in the DOT output.
    #[clap(long)]
    show_trees: bool,

    /// Print the Rabin pairs.
    #[clap(long)]
    pairs: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    let automaton = load_automaton(&args.path)?;
    println!(
        "automaton: {} states, {} symbols, {} transitions",
        automaton.state_count(),
        automaton.alphabet_size(),
        automaton.transitions().len()
    );

    let config = Config::default()
        .with_storage_bits(args.storage_bits)
        .with_engine(args.engine)
        .with_cross_check(args.cross_check);

    let time_total = std::time::Instant::now();
    let det = determinize(&automaton, &config);
    let time_total = time_total.elapsed();
    println!("time: {:.3} states: {}", time_total.as_secs_f64(), det.state_count());

    if args.pairs {
        for pair in det.rabin_pairs() {
            println!("{}", pair);
        }
    }

    if let Some(path) = &args.dot {
        let config = DotConfig {
            show_trees: args.show_trees,
            ..DotConfig::default()
        };
        std::fs::write(path, det.to_dot_with_config(&config)?)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
