//! Clip materialization.
//!
//! Extracts every selected segment concurrently (bounded by the shared
//! FFmpeg semaphore) and keeps only the ones that produced an artifact.
//! A failed extraction drops its segment; it never aborts the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use reelcut_media::{ClipExtractor, ExtractOptions};
use reelcut_models::{sanitize_label, ArtifactName, EncodingConfig, FormatSpec, Segment};
use reelcut_oracle::AssetRef;

use crate::events::{EventSink, PipelineEvent};

/// Outcome of one materialization batch.
#[derive(Debug, Default)]
pub struct MaterializeReport {
    /// Materialized segments, in selection order.
    pub segments: Vec<Segment>,
    /// Number of segments whose extraction failed.
    pub failures: usize,
}

pub struct Materializer {
    extractor: Arc<dyn ClipExtractor>,
    semaphore: Arc<Semaphore>,
    output_dir: PathBuf,
    encoding: EncodingConfig,
    sink: Arc<dyn EventSink>,
}

impl Materializer {
    pub fn new(
        extractor: Arc<dyn ClipExtractor>,
        semaphore: Arc<Semaphore>,
        output_dir: impl Into<PathBuf>,
        encoding: EncodingConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            extractor,
            semaphore,
            output_dir: output_dir.into(),
            encoding,
            sink,
        }
    }

    /// Directory receiving the clips of `asset`.
    pub fn asset_dir(&self, asset: &AssetRef) -> PathBuf {
        let name = sanitize_label(&asset.video_id);
        self.output_dir
            .join(if name.is_empty() { "asset" } else { name.as_str() })
    }

    /// Extract `segments` from the asset's source video.
    ///
    /// `token` is the per-run suffix that keeps artifact names unique.
    pub async fn materialize(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        segments: Vec<Segment>,
        token: &str,
    ) -> MaterializeReport {
        let options = ExtractOptions::for_format(spec, self.encoding.clone());
        let dir = self.asset_dir(asset);

        let futures: Vec<_> = segments
            .into_iter()
            .enumerate()
            .map(|(idx, segment)| {
                let options = &options;
                let dir = dir.as_path();
                async move {
                    self.materialize_one(asset, spec, segment, idx + 1, dir, options, token)
                        .await
                }
            })
            .collect();

        let results = join_all(futures).await;

        let mut report = MaterializeReport::default();
        for result in results {
            match result {
                Some(segment) => report.segments.push(segment),
                None => report.failures += 1,
            }
        }
        report
    }

    #[allow(clippy::too_many_arguments)]
    async fn materialize_one(
        &self,
        asset: &AssetRef,
        spec: &FormatSpec,
        mut segment: Segment,
        ordinal: usize,
        dir: &Path,
        options: &ExtractOptions,
        token: &str,
    ) -> Option<Segment> {
        let index = segment.index();
        let fail = |segment: &mut Segment, error: String| {
            // A segment that cannot be rejected is already terminal.
            let _ = segment.reject();
            self.sink.emit(&PipelineEvent::ExtractionFailed {
                kind: spec.kind.clone(),
                index,
                error,
            });
        };

        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                fail(&mut segment, "FFmpeg semaphore closed".to_string());
                return None;
            }
        };

        let name = ArtifactName::new(&spec.kind, ordinal, segment.duration(), segment.label(), token);
        let output = dir.join(name.file_name());
        debug!(kind = %spec.kind, segment_index = index, output = %output.display(), "Extracting segment");

        let extracted = self
            .extractor
            .extract_clip(asset.source_path(), segment.start(), segment.end(), &output, options)
            .await;

        match extracted {
            Ok(()) => match segment.materialize(&output) {
                Ok(()) => {
                    self.sink.emit(&PipelineEvent::ClipMaterialized {
                        kind: spec.kind.clone(),
                        index,
                        duration: segment.duration(),
                    });
                    Some(segment)
                }
                Err(e) => {
                    fail(&mut segment, e.to_string());
                    None
                }
            },
            Err(e) => {
                fail(&mut segment, e.to_string());
                None
            }
        }
    }
}
