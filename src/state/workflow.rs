/// Transformation workflow state machine
///
/// SelectCostume (initial) -> Processing -> Result | back to SelectCostume on failure.
/// Result -> SelectCostume via `start_new`. The machine is cyclic.
///
/// All mutation happens synchronously on the UI thread. The only suspension
/// point is `TransformRequest::execute`, whose outcome is fed back through
/// `finish`. The busy flag guards the single outstanding-call slot.

use chrono::Utc;
use std::sync::Arc;

use super::data::{Costume, ImageData, Transformation};
use super::ids::SessionIds;
use crate::service::{TransformError, TransformationService};

/// Which view is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStep {
    /// Defined but never entered: uploading happens inside SelectCostume
    #[allow(dead_code)]
    Upload,
    #[default]
    SelectCostume,
    Processing,
    Result,
}

/// Tags each remote call so late answers can be recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(u64);

/// Everything one remote call needs, captured by value at call time
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub id: RequestId,
    pub photo: ImageData,
    pub costume: Costume,
}

impl TransformRequest {
    /// Run the remote call; the outcome goes back to `Workflow::finish`
    pub async fn execute(self, service: Arc<dyn TransformationService>) -> TransformOutcome {
        let result = service.transform(&self.photo, &self.costume).await;
        TransformOutcome { request: self, result }
    }
}

/// Completion of a `TransformRequest`
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub request: TransformRequest,
    pub result: Result<ImageData, TransformError>,
}

#[derive(Debug, Default)]
pub struct Workflow {
    step: WorkflowStep,
    photo: Option<ImageData>,
    selected_costume: Option<Costume>,
    last_transformation: Option<Transformation>,
    busy: bool,
    error: Option<String>,
    /// Id of the call currently in flight
    pending: Option<RequestId>,
    next_request: u64,
    ids: SessionIds,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn photo(&self) -> Option<&ImageData> {
        self.photo.as_ref()
    }

    pub fn selected_costume(&self) -> Option<&Costume> {
        self.selected_costume.as_ref()
    }

    pub fn last_transformation(&self) -> Option<&Transformation> {
        self.last_transformation.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Session id source, shared with custom costume creation
    pub fn ids_mut(&mut self) -> &mut SessionIds {
        &mut self.ids
    }

    /// Replace the photo wholesale. Refused while a call is outstanding.
    pub fn upload_photo(&mut self, image: ImageData) -> bool {
        if self.busy {
            tracing::debug!("Ignoring photo upload while busy");
            return false;
        }
        self.photo = Some(image);
        true
    }

    /// Drop the photo and, with it, any costume selection
    pub fn clear_photo(&mut self) {
        self.photo = None;
        self.selected_costume = None;
        self.error = None;
    }

    /// Start a transformation of the current photo into `costume`.
    ///
    /// Returns `None` (and changes nothing) when there is no photo or a call is
    /// already outstanding; otherwise the caller must execute the returned
    /// request and pass its outcome to `finish`.
    pub fn select_costume_and_transform(&mut self, costume: Costume) -> Option<TransformRequest> {
        if self.busy {
            tracing::debug!("Transformation already in flight, ignoring {}", costume.name);
            return None;
        }
        let photo = self.photo.clone()?;

        self.next_request += 1;
        let id = RequestId(self.next_request);

        self.selected_costume = Some(costume.clone());
        self.step = WorkflowStep::Processing;
        self.busy = true;
        self.error = None;
        self.pending = Some(id);

        tracing::info!("✨ Transforming into {} (request {:?})", costume.name, id);

        Some(TransformRequest { id, photo, costume })
    }

    /// Apply a finished call. Returns false if the outcome was stale and ignored.
    pub fn finish(&mut self, outcome: TransformOutcome) -> bool {
        if self.pending != Some(outcome.request.id) {
            tracing::warn!("Discarding stale transformation outcome {:?}", outcome.request.id);
            return false;
        }
        self.pending = None;
        self.busy = false;

        let TransformOutcome { request, result } = outcome;
        match result {
            Ok(result_image) => {
                let now = Utc::now();
                let transformation = Transformation {
                    id: self.ids.transformation(now),
                    original_image: request.photo,
                    result_image,
                    costume: request.costume,
                    created_at: now,
                };
                tracing::info!("✅ Transformation {} complete", transformation.id);
                self.last_transformation = Some(transformation);
                self.step = WorkflowStep::Result;
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!("❌ Transformation failed: {}", message);
                self.error = Some(message);
                self.selected_costume = None;
                self.step = WorkflowStep::SelectCostume;
            }
        }
        true
    }

    /// Back to a blank selector. The last transformation is kept until a new
    /// one supersedes it; it just isn't displayed any more.
    pub fn start_new(&mut self) {
        self.step = WorkflowStep::SelectCostume;
        self.photo = None;
        self.selected_costume = None;
        self.error = None;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}
