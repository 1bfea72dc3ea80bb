//! Gapminder CLI - merge wide time-series tables into one timeline
//!
//! ```bash
//! gapminder --dir data/ --out timeline.csv          # global tables + derived series
//! gapminder --dir data/ --out us.csv --us           # US county tables
//! gapminder --dir data/ --plan plan.json            # custom derived series
//! gapminder --print-plan                            # show the default plan
//! ```

use std::path::PathBuf;

use clap::Parser;
use gapminder::config::{DEFAULT_OUTPUT, DEFAULT_POPULATION_FILE};
use gapminder::error::PipelineResult;
use gapminder::{run_pipeline, ConsoleSink, DerivationPlan, Mode, PipelineConfig};

#[derive(Parser)]
#[command(name = "gapminder")]
#[command(about = "Convert wide time-series CSV tables into one Gapminder timeline", long_about = None)]
struct Cli {
    /// Output file
    #[arg(long, env = "GAPMINDER_OUT", default_value = DEFAULT_OUTPUT)]
    out: PathBuf,

    /// Directory whose csv tables are converted
    #[arg(long, env = "GAPMINDER_DIR", default_value = ".")]
    dir: PathBuf,

    /// Read US county tables instead of global ones
    #[arg(long = "US", alias = "us")]
    us: bool,

    /// Population reference; normalized series are built only if it exists
    #[arg(long, env = "GAPMINDER_POPULATION", default_value = DEFAULT_POPULATION_FILE)]
    population: PathBuf,

    /// JSON derivation plan replacing the default one
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Print the effective derivation plan and exit
    #[arg(long)]
    print_plan: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> PipelineResult<()> {
    let plan = match cli.plan {
        Some(ref path) => DerivationPlan::from_json_file(path)?,
        None => DerivationPlan::default(),
    };

    if cli.print_plan {
        println!("{}", plan.to_json()?);
        return Ok(());
    }

    let config = PipelineConfig {
        input_dir: cli.dir,
        output: cli.out,
        population: cli.population,
        mode: if cli.us { Mode::Us } else { Mode::Global },
        plan,
    };

    let sink = if cli.quiet { ConsoleSink::quiet() } else { ConsoleSink::new() };
    let summary = run_pipeline(&config, &sink)?;

    if !cli.quiet {
        eprintln!("\n📊 {} tables read, {} derived", summary.ingested.len(), summary.derived.len());
        if !summary.skipped.is_empty() {
            eprintln!("   Skipped: {}", summary.skipped.join(", "));
        }
        eprintln!("💾 Output written to: {}", summary.output.display());
        eprintln!("\n✨ Done!");
    }

    Ok(())
}
