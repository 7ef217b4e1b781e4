// Command-line runner for the `region_cues` library.
//
// Usage: region_cues <image_path> [--block <pixels>] [--responses <dir>]
//
// The image is decoded with the `image` crate (only three-channel files are accepted),
// partitioned into square grid regions as a stand-in for a real superpixel segmenter,
// and the feature matrix is printed to stdout: a `# rows x columns` shape line, then
// CSV with a header row.

use anyhow::{Context, Result, bail};
use region_cues::core_modules::utils::image_helper::image_helper;
use region_cues::{
    FeatureConfig, ParallelFeaturePipeline, ResponseObserver, ResponsePngWriter,
    column_names, grid_regions,
};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_BLOCK: usize = 32;

struct Args {
    image_path: String,
    block: usize,
    responses: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut image_path = None;
    let mut block = DEFAULT_BLOCK;
    let mut responses = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--block" => {
                let value = args.next().context("--block needs a value")?;
                block = value
                    .parse()
                    .with_context(|| format!("invalid block size {value:?}"))?;
            }
            "--responses" => {
                responses = Some(args.next().context("--responses needs a directory")?);
            }
            other if image_path.is_none() => image_path = Some(other.to_string()),
            other => bail!("unexpected argument {other:?}"),
        }
    }

    let Some(image_path) = image_path else {
        bail!("Usage: region_cues <image_path> [--block <pixels>] [--responses <dir>]");
    };
    Ok(Args {
        image_path,
        block,
        responses,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    // --- 1. Decode ---
    let image = image_helper::load(Path::new(&args.image_path))?;
    let (height, width) = image.shape();

    // --- 2. Partition ---
    let regions = grid_regions(height, width, args.block, args.block)?;
    tracing::info!(height, width, regions = regions.len(), "partitioned image");

    // --- 3. Extract ---
    let config = FeatureConfig {
        response_observer: args
            .responses
            .map(|dir| Arc::new(ResponsePngWriter::new(dir)) as Arc<dyn ResponseObserver>),
        ..FeatureConfig::default()
    };
    let pipeline = ParallelFeaturePipeline::new(config);
    let matrix = pipeline
        .extract(Arc::new(image), Arc::new(regions))
        .await?;

    // --- 4. Report ---
    println!("# {} x {}", matrix.row_count(), matrix.column_count());
    println!("{}", column_names().join(","));
    for row in matrix.to_dense() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", line.join(","));
    }
    tracing::info!(
        rows = matrix.row_count(),
        columns = matrix.column_count(),
        "feature matrix written"
    );

    Ok(())
}
