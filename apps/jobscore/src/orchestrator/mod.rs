//! Job match orchestration.
//!
//! One pipeline run per job view: Loading card, default résumé, extraction,
//! scoring, then a Result or Error card. Every run is stamped with a
//! generation number and may only touch the card while that number is still
//! current, so a slow answer for a job the user has left is dropped instead of
//! overwriting the card of the job now on screen.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::card::{CardRenderer, MatchCardState, PageCardRenderer};
use crate::errors::MatchError;
use crate::extraction::JobDetailExtractor;
use crate::navigation::job_id::{derive_job_id, JobId};
use crate::page::LivePage;
use crate::resume::{default_resume, ResumeStore};
use crate::scoring::{MatchResult, MatchScorer};

// ────────────────────────────────────────────────────────────────────────────
// Generation gate
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    Loading,
    Success,
    Error,
}

struct GateState {
    generation: u64,
    phase: PipelinePhase,
}

/// Owns the card on behalf of all pipeline runs. The generation check and the
/// render happen under the same lock.
pub struct GenerationGate {
    state: Mutex<GateState>,
    renderer: Arc<dyn CardRenderer>,
}

impl GenerationGate {
    pub fn new(renderer: Arc<dyn CardRenderer>) -> Self {
        Self {
            state: Mutex::new(GateState {
                generation: 0,
                phase: PipelinePhase::Idle,
            }),
            renderer,
        }
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new run: invalidates older ones and shows the Loading card.
    pub fn begin(&self) -> u64 {
        let mut state = self.state();
        state.generation += 1;
        state.phase = PipelinePhase::Loading;
        self.renderer.show(&MatchCardState::Loading);
        state.generation
    }

    /// Renders `card` if `generation` is still current. Returns whether it did.
    pub fn publish(&self, generation: u64, card: &MatchCardState) -> bool {
        let mut state = self.state();
        if state.generation != generation {
            return false;
        }
        state.phase = match card {
            MatchCardState::Loading => PipelinePhase::Loading,
            MatchCardState::Error(_) => PipelinePhase::Error,
            MatchCardState::Result(_) => PipelinePhase::Success,
        };
        self.renderer.show(card);
        true
    }

    /// Invalidates every in-flight run and removes the card.
    pub fn clear(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.phase = PipelinePhase::Idle;
        self.renderer.remove();
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.state().generation == generation
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn phase(&self) -> PipelinePhase {
        self.state().phase
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Everything a single run needs. Cloned into each spawned run.
#[derive(Clone)]
pub struct MatchPipeline {
    pub page: LivePage,
    pub resumes: Arc<dyn ResumeStore>,
    pub scorer: Arc<dyn MatchScorer>,
    pub extractor: JobDetailExtractor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The run finished while still current and its card is on the page.
    Rendered(MatchCardState),
    /// A newer navigation took over; nothing was rendered.
    Superseded,
}

impl MatchPipeline {
    async fn run(self, gate: Arc<GenerationGate>, generation: u64, job_id: JobId) -> PipelineOutcome {
        let card = match self.evaluate(&gate, generation).await {
            Ok(Some(result)) => MatchCardState::Result(result),
            Ok(None) => {
                debug!("Run for job {job_id} superseded before scoring");
                return PipelineOutcome::Superseded;
            }
            Err(e) => MatchCardState::Error(e.user_message().to_string()),
        };

        if gate.publish(generation, &card) {
            info!("Job {job_id}: rendered {}", describe(&card));
            PipelineOutcome::Rendered(card)
        } else {
            debug!(
                "Discarding stale result for job {job_id} (generation {generation}, current {})",
                gate.generation()
            );
            PipelineOutcome::Superseded
        }
    }

    /// `Ok(None)` means the run went stale before the scoring call was made.
    async fn evaluate(
        &self,
        gate: &GenerationGate,
        generation: u64,
    ) -> Result<Option<MatchResult>, MatchError> {
        let resumes = self.resumes.get().await.unwrap_or_else(|e| {
            warn!("Could not read stored resumes: {e}");
            Vec::new()
        });
        let resume = default_resume(&resumes).ok_or(MatchError::NoDefaultResume)?;

        let job = self.extractor.extract(&self.page).await?;
        if !gate.is_current(generation) {
            return Ok(None);
        }

        let result = self.scorer.score(&resume.content, &job).await?;
        Ok(Some(result))
    }
}

fn describe(card: &MatchCardState) -> String {
    match card {
        MatchCardState::Loading => "loading card".to_string(),
        MatchCardState::Error(message) => format!("error card ({message})"),
        MatchCardState::Result(result) => format!("score {}", result.score),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum NavigationOutcome {
    /// The location is not a job view; any card was removed.
    NoJob,
    /// Same job as before; nothing restarted.
    Unchanged,
    Started {
        job_id: JobId,
        generation: u64,
        handle: JoinHandle<PipelineOutcome>,
    },
}

/// Reacts to location changes. Must be driven from inside a tokio runtime.
pub struct JobMatchOrchestrator {
    current_job: Option<JobId>,
    gate: Arc<GenerationGate>,
    pipeline: MatchPipeline,
}

impl JobMatchOrchestrator {
    /// Renders into `pipeline.page` next to the extractor's card anchor.
    pub fn new(pipeline: MatchPipeline) -> Self {
        let renderer = PageCardRenderer::new(
            pipeline.page.clone(),
            pipeline.extractor.selectors().card_anchor.clone(),
        );
        Self::with_renderer(pipeline, Arc::new(renderer))
    }

    pub fn with_renderer(pipeline: MatchPipeline, renderer: Arc<dyn CardRenderer>) -> Self {
        Self {
            current_job: None,
            gate: Arc::new(GenerationGate::new(renderer)),
            pipeline,
        }
    }

    pub fn current_job(&self) -> Option<&JobId> {
        self.current_job.as_ref()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.gate.phase()
    }

    pub fn handle_location(&mut self, url: &Url) -> NavigationOutcome {
        let Some(job_id) = derive_job_id(url) else {
            if let Some(previous) = self.current_job.take() {
                info!("Left job {previous}");
            }
            self.gate.clear();
            return NavigationOutcome::NoJob;
        };

        if self.current_job.as_ref() == Some(&job_id) {
            debug!("Still on job {job_id}");
            return NavigationOutcome::Unchanged;
        }

        self.current_job = Some(job_id.clone());
        let generation = self.gate.begin();
        info!("Scoring job {job_id} (generation {generation})");

        let handle = tokio::spawn(self.pipeline.clone().run(
            Arc::clone(&self.gate),
            generation,
            job_id.clone(),
        ));
        NavigationOutcome::Started {
            job_id,
            generation,
            handle,
        }
    }
}
