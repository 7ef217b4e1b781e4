// THEORY:
// The parallel pipeline runs the same stage functions as `FeaturePipeline`, spread
// over tokio's blocking pool. Nothing is shared mutably: the image, the regions, the
// preprocessed representations and the filter responses are all read-only behind
// `Arc`, and every task returns its own result.
//
// Parallelism is applied where the cost is:
// 1.  **Across filters**: each of the 8 texture convolutions is its own task.
// 2.  **Across regions**: the region collection is cut into contiguous batches, one
//     per worker, and every batch computes all cue blocks for its regions.
//
// Results are stitched back in task order (`join_all` preserves it), which keeps row
// `i` of the matrix bound to region `i` regardless of which task finished first.

use crate::core_modules::feature_matrix::{CueBlocks, FeatureMatrix, assemble};
use crate::core_modules::gabor::{FilterBank, magnitude_response};
use crate::core_modules::preprocessor::preprocess;
use crate::core_modules::raster::{Image, Plane};
use crate::core_modules::region::{RegionDescriptor, validate_regions};
use crate::core_modules::texture_cues::notify_observer;
use crate::error::FeatureError;
use crate::pipeline::{FeatureConfig, region_cue_blocks};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;

/// Splits `len` items into at most `workers` contiguous `(start, end)` ranges.
pub fn batch_ranges(len: usize, workers: usize) -> Vec<(usize, usize)> {
    let batch = len.div_ceil(workers.max(1)).max(1);
    (0..len)
        .step_by(batch)
        .map(|start| (start, (start + batch).min(len)))
        .collect()
}

/// Async, multi-worker feature extractor.
pub struct ParallelFeaturePipeline {
    config: FeatureConfig,
    bank: Arc<FilterBank>,
}

impl ParallelFeaturePipeline {
    pub fn new(config: FeatureConfig) -> Self {
        let bank = Arc::new(config.filter_bank());
        Self { config, bank }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Computes the feature matrix of `regions` over `image`.
    pub async fn extract<R>(
        &self,
        image: Arc<Image>,
        regions: Arc<Vec<R>>,
    ) -> Result<FeatureMatrix, FeatureError>
    where
        R: RegionDescriptor + Send + Sync + 'static,
    {
        let started = Instant::now();

        // Stage 0: Validation
        validate_regions(regions.as_slice(), image.shape())?;

        // Stage 1: Preprocessing
        let prepared = Arc::new(task::spawn_blocking(move || preprocess(&image)).await??);

        // Stage 2: Filter Bank, one task per filter
        let filter_tasks = (0..self.bank.len()).map(|index| {
            let bank = Arc::clone(&self.bank);
            let prepared = Arc::clone(&prepared);
            task::spawn_blocking(move || {
                magnitude_response(&prepared.grey_normalized, &bank.kernels()[index])
            })
        });
        let responses: Vec<Plane> = join_all(filter_tasks)
            .await
            .into_iter()
            .collect::<Result<_, _>>()?;
        tracing::debug!(filters = responses.len(), "computed texture responses");
        if let Some(observer) = &self.config.response_observer {
            notify_observer(observer.as_ref(), &self.bank, &responses);
        }
        let responses = Arc::new(responses);

        // Stage 3: Region Cues, one task per batch
        let settings = self.config.histogram_settings();
        let batches = batch_ranges(regions.len(), self.config.worker_count);
        tracing::debug!(batches = batches.len(), "dispatching region batches");
        let region_tasks = batches.into_iter().map(|(start, end)| {
            let prepared = Arc::clone(&prepared);
            let responses = Arc::clone(&responses);
            let regions = Arc::clone(&regions);
            task::spawn_blocking(move || {
                region_cue_blocks(&prepared, &responses, &regions[start..end], &settings, start)
            })
        });

        let mut blocks = CueBlocks::with_capacity(regions.len());
        for batch in join_all(region_tasks).await {
            blocks.append(batch??);
        }

        // Stage 4: Assembly
        let matrix = assemble(blocks, regions.len());
        tracing::info!(
            regions = regions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extracted region features in parallel"
        );
        Ok(matrix)
    }
}

impl Default for ParallelFeaturePipeline {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}
