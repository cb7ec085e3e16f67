use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use isocorr::{run_study, CorrectionConfig, IsolationCorrection, Region, StudyConfig};

#[derive(Debug, Parser)]
#[command(name = "isocorr")]
#[command(about = "Stochastic pileup correction for isolation energies")]
struct Cli {
    /// TOML file overriding the calibration layout and defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the binning and multiplicities of a calibration file
    Inspect {
        calibration: Option<PathBuf>,
    },
    /// Repeat one query and print a JSON summary
    Sample {
        calibration: Option<PathBuf>,
        #[arg(long, allow_hyphen_values = true)]
        eta: f64,
        #[arg(long)]
        rho: f64,
        #[arg(long)]
        trials: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Read `eta,rho` rows and write `eta,rho,extra` rows
    Apply {
        calibration: Option<PathBuf>,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    eta: f64,
    rho: f64,
}

#[derive(Debug, Serialize)]
struct CorrectedRow {
    eta: f64,
    rho: f64,
    extra: f64,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = try_main() {
        eprintln!("isocorr failed: {error:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CorrectionConfig::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => CorrectionConfig::default(),
    };

    match cli.command {
        Command::Inspect { calibration } => {
            let correction = load(&config, calibration.as_deref())?;
            inspect(&correction);
        }
        Command::Sample {
            calibration,
            eta,
            rho,
            trials,
            seed,
        } => {
            let correction = load(&config, calibration.as_deref())?;
            let study = StudyConfig {
                eta,
                rho,
                trials: trials.unwrap_or(config.trials),
                seed: seed.unwrap_or(config.seed),
            };
            if study.trials == 0 {
                bail!("--trials must be greater than zero");
            }
            let summary = run_study(&correction, &study);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Apply {
            calibration,
            input,
            output,
            seed,
        } => {
            let correction = load(&config, calibration.as_deref())?;
            let rows = apply(&correction, &input, &output, seed.unwrap_or(config.seed))?;
            tracing::info!(rows, output = %output.display(), "wrote corrected candidates");
        }
    }

    Ok(())
}

fn load(config: &CorrectionConfig, calibration: Option<&Path>) -> Result<IsolationCorrection> {
    let path = match (calibration, config.calibration.as_deref()) {
        (Some(path), _) | (None, Some(path)) => path,
        (None, None) => bail!("no calibration file given on the command line or in the config"),
    };

    IsolationCorrection::open_with_layout(path, &config.layout)
        .with_context(|| format!("failed to load calibration: {}", path.display()))
}

fn inspect(correction: &IsolationCorrection) {
    let table = correction.table();
    println!("eta bins: {}", table.eta_centers().len());
    for (eta_bin, eta) in table.eta_centers().iter().enumerate() {
        let region = table.region(eta_bin);
        println!(
            "  [{eta_bin:>3}] eta={eta:<8.3} {:<6} extra_multiplicity={:.3}",
            region.label(),
            correction.multiplicity().expected(eta_bin)
        );
    }
    for region in [Region::Barrel, Region::Endcap] {
        let centers = table.rho_centers(region);
        let listed: Vec<String> = centers.iter().map(|rho| format!("{rho:.2}")).collect();
        println!(
            "{} rho bins ({}): {}",
            region.label(),
            centers.len(),
            listed.join(", ")
        );
    }
    println!(
        "histograms: {} (stride {})",
        table.populated_cells(),
        table.n_rho_centers()
    );
}

fn apply(
    correction: &IsolationCorrection,
    input: &Path,
    output: &Path,
    seed: u64,
) -> Result<usize> {
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("failed to open input: {}", input.display()))?;
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("failed to open output: {}", output.display()))?;
    let mut sampler = correction.seeded_sampler(seed);

    let mut rows = 0usize;
    for record in reader.deserialize() {
        let row: CandidateRow =
            record.with_context(|| format!("bad row {} in {}", rows + 1, input.display()))?;
        writer.serialize(CorrectedRow {
            eta: row.eta,
            rho: row.rho,
            extra: sampler.get_extra(row.eta, row.rho),
        })?;
        rows += 1;
    }

    writer.flush()?;
    Ok(rows)
}
