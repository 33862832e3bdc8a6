use crate::error::CompareError;
use crate::input::Accuracy;
use crate::scorer::PairScorer;
use image::ImageReader;
use imgcmp_core::Frame;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const RESULTS_HEADER: &str = "Comparison results:";

/// Validated session input handed from the collector to the comparator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonContext {
    pub accuracy: Accuracy,
    pub paths: Vec<PathBuf>,
}

/// One pair that met the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairResult {
    pub first: PathBuf,
    pub second: PathBuf,
    pub score: u32,
}

/// What a completed sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Pairs scored, reported or not
    pub evaluated: usize,
    pub reported: Vec<PairResult>,
}

/// Decode any supported image file into an 8-bit grayscale frame
pub fn load_grayscale(path: &Path) -> Result<Frame, CompareError> {
    let open_error = |source| CompareError::OpenImage {
        path: path.to_path_buf(),
        source,
    };

    let luma = ImageReader::open(path)
        .map_err(|e| open_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| open_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(open_error)?
        .to_luma8();

    let (width, height) = luma.dimensions();
    Ok(Frame {
        width: width as usize,
        height: height as usize,
        pixels: luma.into_raw(),
    })
}

/// Scores every unordered pair of the context's paths in input order
pub struct Comparator<'s, S> {
    scorer: &'s S,
}

impl<'s, S: PairScorer> Comparator<'s, S> {
    pub fn new(scorer: &'s S) -> Self {
        Self { scorer }
    }

    /// Print the header and every pair scoring at least the threshold.
    ///
    /// Pairs go (0,1), (0,2), .., (1,2), ..; the first undecodable image
    /// stops the sweep with nothing further printed.
    pub fn run<W: Write>(&self, ctx: &ComparisonContext, output: &mut W) -> Result<SweepReport, CompareError> {
        writeln!(output)?;
        writeln!(output, "{RESULTS_HEADER}")?;

        let threshold = ctx.accuracy.get();
        let mut report = SweepReport::default();

        for (i, first_path) in ctx.paths.iter().enumerate() {
            let first = load_grayscale(first_path)?;
            tracing::debug!(path = %first_path.display(), width = first.width, height = first.height, "loaded image");

            for second_path in &ctx.paths[i + 1..] {
                let second = load_grayscale(second_path)?;
                let similarity = self
                    .scorer
                    .score_pair(&first, &second)
                    .map_err(|e| CompareError::Score {
                        first: first_path.clone(),
                        second: second_path.clone(),
                        source: Box::new(e),
                    })?;
                report.evaluated += 1;

                if similarity.score >= threshold {
                    writeln!(
                        output,
                        "{}, {}, {}",
                        first_path.display(),
                        second_path.display(),
                        similarity.score
                    )?;
                    report.reported.push(PairResult {
                        first: first_path.clone(),
                        second: second_path.clone(),
                        score: similarity.score,
                    });
                }
            }
        }

        output.flush()?;
        tracing::info!(evaluated = report.evaluated, reported = report.reported.len(), "sweep finished");
        Ok(report)
    }
}
