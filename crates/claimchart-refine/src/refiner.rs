//! Core Refiner implementation

use crate::aggregate::aggregate;
use crate::config::RefinerConfig;
use crate::diff::{proposal_diff, ProposalDiff};
use crate::error::RefineError;
use crate::history::{build_restore_proposal, resolve_restore_target, RestoreResolution};
use crate::parser::{parse_extraction_response, parse_refinement_response};
use crate::prompt::{ExtractionPromptBuilder, PromptBuilder};
use crate::review;
use crate::types::{
    NoChangeReason, RefineReport, RefinementOutcome, RefinementRequest, RefinementResult,
    Transition,
};
use claimchart_domain::traits::{ChartRepository, LlmProvider};
use claimchart_domain::{
    now_millis, Chart, ChartId, ChartSummary, ChatMessage, ClaimElement, ElementSeed,
    ProposedChange, ReferenceDocument,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Assistant reply recorded when the AI call or its parse fails
pub const FAILURE_MESSAGE: &str = "AI refinement failed. Please try again.";

/// Assistant reply recorded for rollback requests on an element with no versions
pub const NO_HISTORY_MESSAGE: &str =
    "There are no saved versions of this element to restore.";

const PROPOSAL_FALLBACK: &str = "Here is my proposed refinement:";
const ALREADY_STRONG_FALLBACK: &str = "This element is well-supported. No changes are needed.";
const COMMENTARY_FALLBACK: &str = "Analysis complete.";

/// The Refiner runs review sessions over charts in a repository
///
/// At most one refinement call is in flight per Refiner; a second call made
/// while the first awaits the AI is rejected with [`RefineError::Busy`].
pub struct Refiner<L, R>
where
    L: LlmProvider,
    R: ChartRepository,
{
    llm_provider: Arc<L>,
    repository: Arc<Mutex<R>>,
    config: RefinerConfig,
    in_flight: tokio::sync::Mutex<()>,
}

impl<L, R> Refiner<L, R>
where
    L: LlmProvider + Send + Sync + 'static,
    R: ChartRepository,
    L::Error: std::fmt::Display,
    R::Error: std::fmt::Display,
{
    /// Create a new Refiner
    pub fn new(llm_provider: L, repository: R, config: RefinerConfig) -> Result<Self, RefineError> {
        config.validate().map_err(RefineError::Config)?;
        Ok(Self {
            llm_provider: Arc::new(llm_provider),
            repository: Arc::new(Mutex::new(repository)),
            config,
            in_flight: tokio::sync::Mutex::new(()),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &RefinerConfig {
        &self.config
    }

    /// Name of the model behind the provider
    pub fn model_name(&self) -> &str {
        self.llm_provider.model_name()
    }

    /// Build a chart from claim-chart document text
    ///
    /// Text shorter than `min_document_chars` (after trimming) is rejected
    /// without calling the AI.
    pub async fn extract_chart(&self, title: &str, document_text: &str) -> Result<Chart, RefineError> {
        let text = document_text.trim();
        let length = text.chars().count();
        if length < self.config.min_document_chars {
            return Err(RefineError::Extraction(format!(
                "document text too short ({} chars, minimum {})",
                length, self.config.min_document_chars
            )));
        }

        info!("Extracting chart '{}' from {} chars of text", title, length);

        let prompt = ExtractionPromptBuilder::new(text, self.config.extraction_char_budget).build();
        debug!("Extraction prompt length: {} chars", prompt.len());

        let reply = self.call_llm(&prompt).await?;
        debug!("Extraction reply length: {} chars", reply.len());

        let seeds = parse_extraction_response(&reply, self.config.max_parse_candidates)?;
        let elements = seeds.into_iter().map(ClaimElement::from_seed).collect();
        let chart = Chart::new(title, elements, now_millis());

        self.lock_repository()?
            .save_chart(&chart)
            .map_err(|e| RefineError::Store(e.to_string()))?;

        info!("Created chart {} with {} elements", chart.id, chart.elements.len());
        Ok(chart)
    }

    /// Build a chart directly from seeds, without an AI call
    pub fn import_chart(&self, title: &str, seeds: Vec<ElementSeed>) -> Result<Chart, RefineError> {
        let elements = seeds.into_iter().map(ClaimElement::from_seed).collect();
        let chart = Chart::new(title, elements, now_millis());
        self.lock_repository()?
            .save_chart(&chart)
            .map_err(|e| RefineError::Store(e.to_string()))?;
        Ok(chart)
    }

    /// Append a reference document to a chart
    pub fn attach_reference(
        &self,
        chart_id: ChartId,
        name: &str,
        text: &str,
    ) -> Result<Chart, RefineError> {
        let mut repository = self.lock_repository()?;
        let mut chart = Self::load_chart(&*repository, chart_id)?;

        chart.reference_documents.push(ReferenceDocument {
            name: name.to_string(),
            text: text.to_string(),
        });
        chart.updated_at = now_millis();

        repository
            .save_chart(&chart)
            .map_err(|e| RefineError::Store(e.to_string()))?;

        info!(
            "Attached '{}' ({} chars) to chart {}",
            name,
            text.chars().count(),
            chart_id
        );
        Ok(chart)
    }

    /// Load a chart
    pub fn chart(&self, chart_id: ChartId) -> Result<Chart, RefineError> {
        let repository = self.lock_repository()?;
        Self::load_chart(&*repository, chart_id)
    }

    /// Summaries of every stored chart
    pub fn list_charts(&self) -> Result<Vec<ChartSummary>, RefineError> {
        self.lock_repository()?
            .list_charts()
            .map_err(|e| RefineError::Store(e.to_string()))
    }

    /// Delete a chart, returning whether it existed
    pub fn delete_chart(&self, chart_id: ChartId) -> Result<bool, RefineError> {
        self.lock_repository()?
            .delete_chart(chart_id)
            .map_err(|e| RefineError::Store(e.to_string()))
    }

    /// Release the repository
    pub fn close(&self) -> Result<(), RefineError> {
        self.lock_repository()?
            .close()
            .map_err(|e| RefineError::Store(e.to_string()))
    }

    /// Handle one analyst request on an element
    ///
    /// The analyst message is stored before anything else happens, so it
    /// survives AI failures. Rollback requests are answered from the
    /// version log without calling the AI.
    pub async fn refine(
        &self,
        chart_id: ChartId,
        element_id: &str,
        query: &str,
    ) -> Result<RefinementResult, RefineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RefineError::EmptyQuery);
        }

        let _guard = self.in_flight.try_lock().map_err(|_| RefineError::Busy)?;

        let chart = self.chart(chart_id)?;
        let element = chart
            .element(element_id)
            .cloned()
            .ok_or_else(|| RefineError::ElementNotFound(element_id.to_string()))?;

        let request = RefinementRequest::new(
            &element,
            query,
            &chart.reference_documents,
            self.config.reference_doc_char_budget,
        );
        let element = self.store_element(chart_id, element.with_message(ChatMessage::user(query)))?;

        match resolve_restore_target(&element.versions, query) {
            RestoreResolution::EmptyHistory => {
                info!("Rollback requested on element {} with no versions", element_id);
                let element = self.store_element(
                    chart_id,
                    element.with_message(ChatMessage::assistant(NO_HISTORY_MESSAGE)),
                )?;
                return Ok(Self::result(element, |message_index| RefineReport::NoHistory {
                    message_index,
                }));
            }
            RestoreResolution::Target(index) => {
                if let Some(change) = build_restore_proposal(&element, index) {
                    let version = index + 1;
                    info!("Proposing rollback of element {} to v{}", element_id, version);
                    let content =
                        format!("Here is what the rollback to version v{} would change:", version);
                    let element = self.store_element(
                        chart_id,
                        element.with_message(ChatMessage::proposal(content, change)),
                    )?;
                    return Ok(Self::result(element, |message_index| {
                        RefineReport::RestoreProposed {
                            message_index,
                            version,
                        }
                    }));
                }
            }
            RestoreResolution::NotRequested => {}
        }

        let prompt = PromptBuilder::new(&request).build();
        debug!(
            "Refinement prompt length: {} chars ({} documents, {} prior turns)",
            prompt.len(),
            request.reference_documents.len(),
            request.prior_turns.len()
        );

        let outcome = match self.call_llm(&prompt).await {
            Ok(reply) => {
                debug!("Refinement reply length: {} chars", reply.len());
                parse_refinement_response(&reply, self.config.max_parse_candidates)
            }
            Err(e) => {
                warn!("Refinement call for element {} failed: {}", element_id, e);
                RefinementOutcome::ParseFailure {
                    reason: e.to_string(),
                }
            }
        };

        // The element may have been reviewed while the AI call was running.
        let current = self.load_element(chart_id, element_id)?;
        self.apply_outcome(chart_id, current, outcome)
    }

    fn apply_outcome(
        &self,
        chart_id: ChartId,
        element: ClaimElement,
        outcome: RefinementOutcome,
    ) -> Result<RefinementResult, RefineError> {
        match outcome {
            RefinementOutcome::Rewrite {
                reasoning,
                evidence,
                assessment,
            } => {
                let change = review::propose(
                    &element,
                    reasoning.as_deref(),
                    evidence.as_deref(),
                    &assessment,
                );
                let content = non_empty_or(&assessment.explanation, PROPOSAL_FALLBACK);
                let element =
                    self.store_element(chart_id, element.with_message(ChatMessage::proposal(content, change)))?;
                info!("Proposal pending on element {}", element.id);
                Ok(Self::result(element, |message_index| RefineReport::Proposed {
                    message_index,
                }))
            }
            RefinementOutcome::NoChange { reason, assessment } => {
                let fallback = match reason {
                    NoChangeReason::AlreadyStrong => ALREADY_STRONG_FALLBACK,
                    NoChangeReason::CommentaryOnly => COMMENTARY_FALLBACK,
                };
                let content = non_empty_or(&assessment.explanation, fallback);
                let next = aggregate(&element, &assessment).with_message(ChatMessage::assistant(content));
                let element = self.store_element(chart_id, next)?;
                info!(
                    "Commentary on element {} (confidence {}, {} flags)",
                    element.id,
                    element.confidence,
                    element.flags.len()
                );
                Ok(Self::result(element, |message_index| RefineReport::Commentary {
                    message_index,
                    no_change_needed: reason == NoChangeReason::AlreadyStrong,
                }))
            }
            RefinementOutcome::ParseFailure { reason } => {
                warn!("Refinement of element {} failed: {}", element.id, reason);
                let element = self.store_element(
                    chart_id,
                    element.with_message(ChatMessage::assistant(FAILURE_MESSAGE)),
                )?;
                Ok(Self::result(element, |message_index| RefineReport::Failed {
                    message_index,
                    reason,
                }))
            }
        }
    }

    /// Accept the proposal on `message_index`
    pub fn accept(
        &self,
        chart_id: ChartId,
        element_id: &str,
        message_index: usize,
    ) -> Result<Transition, RefineError> {
        let element = self.load_element(chart_id, element_id)?;
        let transition = review::accept(&element, message_index, now_millis())?;
        self.persist_transition(chart_id, transition)
    }

    /// Reject the proposal on `message_index`
    pub fn reject(
        &self,
        chart_id: ChartId,
        element_id: &str,
        message_index: usize,
    ) -> Result<Transition, RefineError> {
        let element = self.load_element(chart_id, element_id)?;
        let transition = review::reject(&element, message_index)?;
        self.persist_transition(chart_id, transition)
    }

    /// Word diffs of a proposal, bounded by `max_diff_tokens`
    pub fn proposal_diff<'a>(&self, change: &'a ProposedChange) -> ProposalDiff<'a> {
        proposal_diff(change, self.config.max_diff_tokens)
    }

    fn persist_transition(
        &self,
        chart_id: ChartId,
        transition: Transition,
    ) -> Result<Transition, RefineError> {
        match transition {
            Transition::Applied(element) => {
                let element = self.store_element(chart_id, element)?;
                info!(
                    "Review recorded on element {} ({} versions)",
                    element.id,
                    element.versions.len()
                );
                Ok(Transition::Applied(element))
            }
            resolved @ Transition::AlreadyResolved(_) => Ok(resolved),
        }
    }

    fn result(
        element: ClaimElement,
        report: impl FnOnce(usize) -> RefineReport,
    ) -> RefinementResult {
        let message_index = element.chat_history.len().saturating_sub(1);
        RefinementResult {
            report: report(message_index),
            element,
        }
    }

    fn lock_repository(&self) -> Result<MutexGuard<'_, R>, RefineError> {
        self.repository
            .lock()
            .map_err(|e| RefineError::Store(format!("Lock error: {}", e)))
    }

    fn load_chart(repository: &R, chart_id: ChartId) -> Result<Chart, RefineError> {
        repository
            .get_chart(chart_id)
            .map_err(|e| RefineError::Store(e.to_string()))?
            .ok_or_else(|| RefineError::ChartNotFound(chart_id.to_string()))
    }

    fn load_element(&self, chart_id: ChartId, element_id: &str) -> Result<ClaimElement, RefineError> {
        self.chart(chart_id)?
            .element(element_id)
            .cloned()
            .ok_or_else(|| RefineError::ElementNotFound(element_id.to_string()))
    }

    fn store_element(
        &self,
        chart_id: ChartId,
        element: ClaimElement,
    ) -> Result<ClaimElement, RefineError> {
        let element_id = element.id.clone();
        let chart = self
            .lock_repository()?
            .replace_element(chart_id, element, now_millis())
            .map_err(|e| RefineError::Store(e.to_string()))?
            .ok_or_else(|| RefineError::ElementNotFound(element_id.clone()))?;

        chart
            .element(&element_id)
            .cloned()
            .ok_or(RefineError::ElementNotFound(element_id))
    }

    async fn call_llm(&self, prompt: &str) -> Result<String, RefineError> {
        let llm = Arc::clone(&self.llm_provider);
        let prompt = prompt.to_string();

        // The provider is synchronous; keep it off the async workers
        let task = tokio::task::spawn_blocking(move || {
            llm.generate(&prompt).map_err(|e| RefineError::Llm(e.to_string()))
        });

        timeout(self.config.llm_timeout(), task)
            .await
            .map_err(|_| RefineError::Timeout)?
            .map_err(|e| RefineError::Llm(format!("Task join error: {}", e)))?
    }
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}
