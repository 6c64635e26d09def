use super::load_configuration;
use crate::cli::ParamsArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use kspace::engine::params::EwaldParams;
use kspace::workflows::energy;
use tracing::info;

pub fn run(args: ParamsArgs) -> Result<EwaldParams> {
    let run_config = PartialRunConfig::from_file(&args.input.config)?.merge_with_cli(&args.ewald)?;
    let configuration = load_configuration(&run_config, &args.input.input)?;

    info!("Resolving Ewald parameters...");
    let params = energy::resolve(&configuration, &run_config.ewald)?;
    let kmax_squared = params.kmax_squared_cutoff(configuration.domain());

    println!("Alpha:        {:.8} 1/Å", params.alpha);
    println!(
        "kmax:         ({}, {}, {})",
        params.kxmax, params.kymax, params.kzmax
    );
    println!("kmax squared: {:.6} 1/Å²", kmax_squared);

    Ok(params)
}
