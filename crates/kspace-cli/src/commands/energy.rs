use super::load_configuration;
use crate::cli::EnergyArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use kspace::workflows::energy::{self, ReciprocalReport};
use tracing::info;

pub fn run(args: EnergyArgs) -> Result<ReciprocalReport> {
    let partial_config = PartialRunConfig::from_file(&args.input.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let run_config = partial_config.merge_with_cli(&args.ewald)?;
    let configuration = load_configuration(&run_config, &args.input.input)?;

    info!("Invoking the reciprocal energy workflow...");
    let result = energy::run(&configuration, &run_config.ewald)?;
    let report = result.report;

    if args.check {
        result.engine.check(&configuration)?;
        info!("Consistency check passed.");
    }
    if let Some(path) = &args.checkpoint {
        result.engine.save(path)?;
        println!("Checkpoint written to: {}", path.display());
    }

    println!("Reciprocal energy: {:.10} kJ/mol", report.energy);
    println!("Net charge:        {:.6e} e", report.net_charge);
    println!("Alpha:             {:.8} 1/Å", report.params.alpha);
    println!(
        "kmax:              ({}, {}, {})",
        report.params.kxmax, report.params.kymax, report.params.kzmax
    );
    println!("kmax squared:      {:.6} 1/Å²", report.kmax_squared);
    println!("Wave vectors:      {}", report.num_vectors);

    Ok(report)
}
