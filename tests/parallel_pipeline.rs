use region_cues::core_modules::gabor::GaborKernel;
use region_cues::core_modules::raster::Plane;
use region_cues::{
    FeatureConfig, FeatureError, FeatureMatrix, FeaturePipeline, Image, ParallelFeaturePipeline,
    Region, ResponseObserver, grid_regions,
};
use std::sync::{Arc, Mutex};

fn bits(matrix: &FeatureMatrix) -> Vec<u64> {
    matrix.to_flat().iter().map(|v| v.to_bits()).collect()
}

fn textured(height: usize, width: usize) -> Image {
    let samples: Vec<f64> = (0..height * width * 3)
        .map(|i| ((i * 53 + 7) % 97) as f64 + 0.5 * (i % 5) as f64)
        .collect();
    Image::from_raw(height, width, 3, &samples).expect("Error building textured image.")
}

#[tokio::test]
async fn parallel_matches_sequential_bit_for_bit() {
    let image = textured(16, 13);
    let regions = grid_regions(16, 13, 4, 3).expect("Error building grid.");
    let sequential = FeaturePipeline::default()
        .extract(&image, &regions)
        .expect("Error in sequential run.");

    for worker_count in [1, 2, 3, 7, 64] {
        let config = FeatureConfig {
            worker_count,
            ..FeatureConfig::default()
        };
        let parallel = ParallelFeaturePipeline::new(config)
            .extract(Arc::new(image.clone()), Arc::new(regions.clone()))
            .await
            .expect("Error in parallel run.");
        assert_eq!(bits(&parallel), bits(&sequential), "workers = {worker_count}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_extractions_do_not_interfere() {
    let image = Arc::new(textured(10, 10));
    let regions = Arc::new(grid_regions(10, 10, 5, 2).expect("Error building grid."));
    let pipeline = Arc::new(ParallelFeaturePipeline::default());

    let runs = (0..4).map(|_| {
        let pipeline = Arc::clone(&pipeline);
        let image = Arc::clone(&image);
        let regions = Arc::clone(&regions);
        tokio::spawn(async move { pipeline.extract(image, regions).await })
    });
    let results = futures::future::join_all(runs).await;

    let first = results[0]
        .as_ref()
        .expect("Error joining run.")
        .as_ref()
        .expect("Error in run.");
    for result in &results[1..] {
        let matrix = result
            .as_ref()
            .expect("Error joining run.")
            .as_ref()
            .expect("Error in run.");
        assert_eq!(bits(matrix), bits(first));
    }
}

#[tokio::test]
async fn parallel_reports_the_failing_region_index() {
    let image = Arc::new(textured(6, 6));
    let mut regions = grid_regions(6, 6, 2, 2).expect("Error building grid.");
    regions.push(Region::from_coords(99, vec![(6, 0)]));
    let config = FeatureConfig {
        worker_count: 3,
        ..FeatureConfig::default()
    };
    let err = ParallelFeaturePipeline::new(config)
        .extract(image, Arc::new(regions))
        .await
        .unwrap_err();
    assert!(matches!(err, FeatureError::RegionOutOfBounds { index: 9, .. }));
}

#[derive(Debug, Default)]
struct Collector {
    seen: Mutex<Vec<(usize, (usize, usize))>>,
}

impl ResponseObserver for Collector {
    fn observe(&self, filter_index: usize, _kernel: &GaborKernel, response: &Plane) {
        self.seen
            .lock()
            .expect("Error locking collector.")
            .push((filter_index, response.shape()));
    }
}

#[tokio::test]
async fn observer_sees_every_filter_in_order() {
    let collector = Arc::new(Collector::default());
    let config = FeatureConfig {
        response_observer: Some(collector.clone()),
        ..FeatureConfig::default()
    };
    let image = Arc::new(textured(7, 9));
    let regions = Arc::new(grid_regions(7, 9, 7, 9).expect("Error building grid."));
    ParallelFeaturePipeline::new(config)
        .extract(image, regions)
        .await
        .expect("Error extracting features.");

    let seen = collector.seen.lock().expect("Error locking collector.");
    let expected: Vec<_> = (0..8).map(|index| (index, (7, 9))).collect();
    assert_eq!(*seen, expected);
}
