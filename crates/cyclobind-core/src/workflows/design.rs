use crate::core::offset::OffsetError;
use crate::engine::backend::DesignBackend;
use crate::engine::cache::PreparationCache;
use crate::engine::config::DesignConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{DesignReport, OffsetStatus, TrialOutcome};
use crate::engine::strategy::DesignFlags;
use tracing::{debug, info, instrument, warn};

/// Runs every design trial of `config` in order and collects one outcome per trial.
///
/// The preparation cache is owned by the caller so that a second run against the same
/// target reuses the prepared model. The first failing trial aborts the run.
#[instrument(skip_all, name = "design_workflow")]
pub fn run<B: DesignBackend + ?Sized>(
    backend: &mut B,
    config: &DesignConfig,
    cache: &mut PreparationCache,
    reporter: &ProgressReporter,
) -> Result<DesignReport, EngineError> {
    let total = config.run.trials;
    info!(
        trials = total,
        optimizer = %config.optimizer.kind,
        binder_len = config.binder.effective_len(),
        cyclic = config.binder.cyclic,
        "Starting design run."
    );
    if config.optimizer.kind.yields_continuous_sequence() {
        warn!(
            optimizer = %config.optimizer.kind,
            "This optimizer leaves a continuous sequence profile; saved structures will not carry a one-hot sequence."
        );
    }

    let mut trials = Vec::with_capacity(total);
    for index in 0..total {
        reporter.report(Progress::TrialStart { index, total });
        let outcome = run_trial(backend, config, cache, reporter, index)?;
        reporter.report(Progress::TrialFinish { index });
        trials.push(outcome);
    }

    let best_log = backend.best_log()?;

    for outcome in &trials {
        info!(
            trial = outcome.index,
            path = %outcome.output_path.display(),
            offset = %outcome.offset,
            "Trial saved."
        );
    }
    match &best_log {
        Some(log) => info!("Best trial: {}", log),
        None => warn!("Engine reported no best trial log."),
    }

    Ok(DesignReport { trials, best_log })
}

#[instrument(skip_all, fields(trial = index))]
fn run_trial<B: DesignBackend + ?Sized>(
    backend: &mut B,
    config: &DesignConfig,
    cache: &mut PreparationCache,
    reporter: &ProgressReporter,
    index: usize,
) -> Result<TrialOutcome, EngineError> {
    // === Phase 1: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let request = config.prep_request();
    let (prepared, reused_preparation) =
        cache.get_or_prepare(backend, &config.model, &request)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Relative-position offset ===
    let offset = if config.binder.cyclic {
        match prepared.cyclic_offset(config.binder.effective_len(), config.binder.sign_convention) {
            Ok(matrix) => {
                backend.set_offset(&matrix)?;
                debug!(convention = %config.binder.sign_convention, "Cyclic offset applied.");
                OffsetStatus::Cyclic(config.binder.sign_convention)
            }
            Err(err @ OffsetError::NoBinderSegment { .. }) => {
                warn!("Skipping cyclic offset: {}", err);
                backend.set_offset(prepared.linear_offset())?;
                OffsetStatus::Skipped {
                    reason: err.to_string(),
                }
            }
            Err(err) => return Err(err.into()),
        }
    } else {
        // A cached preparation may still carry the previous run's cyclic block.
        backend.set_offset(prepared.linear_offset())?;
        OffsetStatus::Linear
    };

    // === Phase 3: Optimization ===
    reporter.report(Progress::PhaseStart { name: "Design" });
    backend.restart(config.binder.seed.as_ref().map(|s| s.as_str()))?;
    backend.set_optimizer(&config.optimizer.gd)?;

    let models: Vec<String> = backend
        .model_names()?
        .into_iter()
        .take(config.model.num_models)
        .collect();
    if models.is_empty() {
        return Err(EngineError::NoModels);
    }

    let flags = DesignFlags {
        num_recycles: config.model.num_recycles,
        models,
        dropout: config.optimizer.dropout,
        save_best: false,
    };
    let plan = config.optimizer.kind.plan(&flags, config.model.num_models);

    reporter.report(Progress::TaskStart {
        total_steps: plan.len() as u64,
    });
    for staged in &plan {
        debug!(step = staged.step.name(), "Running design step.");
        backend
            .run_step(&staged.step, &staged.flags)
            .map_err(|e| EngineError::StepFailed {
                trial: index,
                step: staged.step.name(),
                reason: e.to_string(),
            })?;
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Output ===
    let output_path = config.output_path(index);
    backend.save_pdb(&output_path)?;
    reporter.report(Progress::Message(format!(
        "Trial {} saved to {}",
        index,
        output_path.display()
    )));

    Ok(TrialOutcome {
        index,
        output_path,
        offset,
        reused_preparation,
    })
}
