use crate::cli::DesignArgs;
use crate::config::PartialDesignConfig;
use crate::error::Result;
use crate::params::ParamsLocator;
use crate::utils::progress::CliProgressHandler;
use cyclobind::engine::bridge::ProcessBackend;
use cyclobind::engine::cache::PreparationCache;
use cyclobind::engine::error::EngineError;
use cyclobind::engine::progress::ProgressReporter;
use cyclobind::engine::state::DesignReport;
use cyclobind::workflows;
use tracing::info;

pub fn run(args: DesignArgs) -> Result<()> {
    info!("Locating AlphaFold parameters...");
    let params_locator = ParamsLocator::new()?;

    let partial_config = match &args.config {
        Some(path) => PartialDesignConfig::from_file(path)?,
        None => PartialDesignConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let app_config = partial_config.merge_with_cli(&args, &params_locator)?;
    let config = &app_config.core_config;

    info!("Starting engine bridge: {}", app_config.engine.display());
    let mut backend = ProcessBackend::spawn(&app_config.engine).map_err(EngineError::from)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let mut cache = PreparationCache::new();

    println!(
        "Designing {}-residue {} binders against {} chain {} ({} trials, optimizer {})...",
        config.binder.effective_len(),
        if config.binder.cyclic { "cyclic" } else { "linear" },
        config.target.pdb,
        config.target.chain,
        config.run.trials,
        config.optimizer.kind
    );

    let report = workflows::design::run(&mut backend, config, &mut cache, &reporter)?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &DesignReport) {
    println!("Design complete. {} structure(s) written:", report.trials.len());
    for outcome in &report.trials {
        println!(
            "  Trial {}: {} [{}]",
            outcome.index,
            outcome.output_path.display(),
            outcome.offset
        );
    }
    match &report.best_log {
        Some(log) => println!("✓ Best trial: {}", log),
        None => println!("Engine did not report a best trial."),
    }
}
