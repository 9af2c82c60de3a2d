use crate::engine::backend::DesignBackend;
use crate::engine::config::ModelConfig;
use crate::engine::error::EngineError;
use crate::engine::protocol::{PrepRequest, PreparedInputs};
use tracing::{debug, info};

/// Remembers which inputs the backend currently holds so that consecutive trials with an
/// unchanged target, binder length and model flags skip the expensive rebuild.
#[derive(Debug, Default, Clone)]
pub struct PreparationCache {
    entry: Option<(PrepRequest, PreparedInputs)>,
}

impl PreparationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_current(&self, request: &PrepRequest) -> bool {
        matches!(&self.entry, Some((cached, _)) if cached == request)
    }

    pub fn current(&self) -> Option<&PreparedInputs> {
        self.entry.as_ref().map(|(_, prepared)| prepared)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Returns the prepared inputs for `request`, rebuilding the model on a miss.
    ///
    /// The second element is `true` when the cached preparation was reused. A failed
    /// rebuild leaves the cache empty.
    pub fn get_or_prepare<B: DesignBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        model: &ModelConfig,
        request: &PrepRequest,
    ) -> Result<(&PreparedInputs, bool), EngineError> {
        let reused = self.is_current(request);
        if reused {
            debug!("Preparation cache hit; reusing the prepared model.");
        } else {
            info!(
                pdb = %request.pdb,
                chain = %request.chain,
                binder_len = request.binder_len,
                "Preparation cache miss; rebuilding the model."
            );
            self.invalidate();
            backend.clear_memory()?;
            backend.build_model(model)?;
            let prepared = backend.prepare_inputs(request)?;
            info!(
                target_len = prepared.target_len(),
                binder_len = prepared.binder_len(),
                "Inputs prepared."
            );
            self.entry = Some((request.clone(), prepared));
        }

        let (_, prepared) = self
            .entry
            .as_ref()
            .ok_or_else(|| EngineError::Internal("preparation cache is empty".to_string()))?;
        Ok((prepared, reused))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::tests::complete_builder;
    use crate::engine::testing::{Call, RecordingBackend};

    fn request_and_model() -> (PrepRequest, ModelConfig) {
        let config = complete_builder().build().unwrap();
        (config.prep_request(), config.model)
    }

    #[test]
    fn first_request_clears_builds_and_prepares_in_order() {
        let (request, model) = request_and_model();
        let mut backend = RecordingBackend::new();
        let mut cache = PreparationCache::new();

        let (prepared, reused) = cache
            .get_or_prepare(&mut backend, &model, &request)
            .unwrap();

        assert!(!reused);
        assert_eq!(prepared.binder_len(), 13);
        assert_eq!(
            backend.calls,
            vec![
                Call::ClearMemory,
                Call::BuildModel,
                Call::PrepareInputs(request.clone())
            ]
        );
        assert!(cache.is_current(&request));
    }

    #[test]
    fn identical_request_reuses_preparation_without_engine_calls() {
        let (request, model) = request_and_model();
        let mut backend = RecordingBackend::new();
        let mut cache = PreparationCache::new();

        cache.get_or_prepare(&mut backend, &model, &request).unwrap();
        let (_, reused) = cache.get_or_prepare(&mut backend, &model, &request).unwrap();

        assert!(reused);
        assert_eq!(backend.calls.len(), 3);
    }

    #[test]
    fn changed_binder_length_triggers_rebuild() {
        let (request, model) = request_and_model();
        let mut backend = RecordingBackend::new();
        let mut cache = PreparationCache::new();
        cache.get_or_prepare(&mut backend, &model, &request).unwrap();

        let longer = PrepRequest {
            binder_len: 14,
            ..request.clone()
        };
        let (prepared, reused) = cache.get_or_prepare(&mut backend, &model, &longer).unwrap();

        assert!(!reused);
        assert_eq!(prepared.binder_len(), 14);
        assert_eq!(backend.count(|c| matches!(c, Call::ClearMemory)), 2);
        assert!(!cache.is_current(&request));
    }

    #[test]
    fn changed_hotspot_or_multimer_flag_triggers_rebuild() {
        let (request, model) = request_and_model();
        let mut backend = RecordingBackend::new();
        let mut cache = PreparationCache::new();
        cache.get_or_prepare(&mut backend, &model, &request).unwrap();

        let no_hotspot = PrepRequest {
            hotspot: None,
            ..request.clone()
        };
        assert!(!cache.get_or_prepare(&mut backend, &model, &no_hotspot).unwrap().1);

        let monomer = PrepRequest {
            use_multimer: false,
            ..no_hotspot
        };
        assert!(!cache.get_or_prepare(&mut backend, &model, &monomer).unwrap().1);
        assert_eq!(backend.count(|c| matches!(c, Call::BuildModel)), 3);
    }

    #[test]
    fn failed_preparation_leaves_cache_empty() {
        let (request, model) = request_and_model();
        let mut backend = RecordingBackend::new();
        let mut cache = PreparationCache::new();
        cache.get_or_prepare(&mut backend, &model, &request).unwrap();

        backend.fail_prepare = true;
        let other = PrepRequest {
            chain: "B".to_string(),
            ..request.clone()
        };
        let result = cache.get_or_prepare(&mut backend, &model, &other);

        assert!(matches!(result, Err(EngineError::Preparation(_))));
        assert!(cache.current().is_none());
        assert!(!cache.is_current(&request));
        assert!(!cache.is_current(&other));
    }

    #[test]
    fn invalidate_forces_rebuild_of_same_request() {
        let (request, model) = request_and_model();
        let mut backend = RecordingBackend::new();
        let mut cache = PreparationCache::new();
        cache.get_or_prepare(&mut backend, &model, &request).unwrap();

        cache.invalidate();
        assert!(cache.current().is_none());

        let (_, reused) = cache.get_or_prepare(&mut backend, &model, &request).unwrap();
        assert!(!reused);
        assert_eq!(backend.count(|c| matches!(c, Call::PrepareInputs(_))), 2);
    }
}
