//! Runs the estimation pipeline over every photo of a stored request.

use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinSet;

use crate::core::db::{
    Dimensions, ImageRepository, RequestRepository, RequestStatus, RequestUpdate, WindowRequest,
};
use crate::error::PipelineError;
use crate::pipeline::{Analysis, EstimationPipeline};

#[derive(Debug)]
pub struct ImageOutcome {
    pub image_id: i64,
    pub result: Result<Analysis, PipelineError>,
}

#[derive(Debug)]
pub struct RequestAnalysis {
    /// The request as stored after the run
    pub request: WindowRequest,
    /// One entry per image, ordered by image id
    pub outcomes: Vec<ImageOutcome>,
}

impl RequestAnalysis {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (i64, &PipelineError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.image_id, e)))
    }
}

/// Analyse all images of `request_id` concurrently.
///
/// Dimensions are written for every image that succeeded. The request moves to
/// [`RequestStatus::Analyzed`] only when every image succeeded; otherwise its status is
/// left alone so an operator can resubmit or measure by hand.
pub async fn analyze_request<S>(
    store: &S,
    pipeline: Arc<EstimationPipeline>,
    request_id: i64,
) -> anyhow::Result<RequestAnalysis>
where
    S: RequestRepository + ImageRepository,
{
    let request = store
        .get_request(request_id)
        .await?
        .with_context(|| format!("Request {} not found", request_id))?;
    let images = store.get_images(&request).await?;
    if images.is_empty() {
        anyhow::bail!("Request {} has no images", request_id);
    }

    let mut tasks = JoinSet::new();
    for image in &images {
        let pipeline = pipeline.clone();
        let image_id = image.id;
        let path = image.image_path.clone();
        let location_type = image.location_type.clone();
        let reference_type = image.reference_type.clone();
        tasks.spawn(async move {
            let result = pipeline.analyze(&path, &location_type, &reference_type).await;
            ImageOutcome { image_id, result }
        });
    }

    let mut outcomes = Vec::with_capacity(images.len());
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.context("Analysis task failed")?);
    }
    outcomes.sort_by_key(|o| o.image_id);

    for (image, outcome) in images.iter().zip(&outcomes) {
        if let Ok(analysis) = &outcome.result {
            store
                .set_image_dimensions(
                    image,
                    Dimensions {
                        width: analysis.estimate.width,
                        height: analysis.estimate.height,
                    },
                )
                .await?;
        }
    }

    let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
    tracing::info!(
        request = request_id,
        images = outcomes.len(),
        succeeded,
        "request analysed"
    );

    let request = if succeeded == outcomes.len() {
        store
            .update_request(
                &request,
                &RequestUpdate {
                    status: Some(RequestStatus::Analyzed),
                    memo: None,
                },
            )
            .await?
    } else {
        request
    };

    Ok(RequestAnalysis { request, outcomes })
}
