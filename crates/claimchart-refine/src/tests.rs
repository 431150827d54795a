//! Integration tests for the Refiner

#[cfg(test)]
mod tests {
    use crate::{
        RefineError, RefineReport, Refiner, RefinerConfig, Transition, FAILURE_MESSAGE,
        NO_HISTORY_MESSAGE, REFINEMENT_NOTE, ROLLBACK_NOTE,
    };
    use claimchart_domain::traits::{ChartRepository, LlmProvider};
    use claimchart_domain::{ChartId, ElementSeed, ProposalKind, ReviewStatus, Role};
    use claimchart_llm::MockProvider;
    use claimchart_store::{MemoryStore, SqliteStore};
    use std::time::Duration;

    const REWRITE: &str = r#"{"refinedReasoning":"Per TechSpec §3.1 the array meets the limitation.","refinedEvidence":"","confidence":90,"flags":[],"explanation":"Removed hedging language.","proposedChange":true,"noChangeNeeded":false}"#;

    fn seeds() -> Vec<ElementSeed> {
        vec![
            ElementSeed {
                id: "1.a".to_string(),
                element_text: "A digital sensor array".to_string(),
                evidence_text: "TechSpec §3.1".to_string(),
                reasoning_text: "The product probably meets this.".to_string(),
            },
            ElementSeed {
                id: "1.b".to_string(),
                element_text: "A wireless communication module".to_string(),
                evidence_text: String::new(),
                reasoning_text: String::new(),
            },
        ]
    }

    fn setup<R>(llm: MockProvider, store: R, config: RefinerConfig) -> (Refiner<MockProvider, R>, ChartId)
    where
        R: ChartRepository,
        R::Error: std::fmt::Display,
    {
        let refiner = Refiner::new(llm, store, config).unwrap();
        let chart = refiner.import_chart("NexaTherm", seeds()).unwrap();
        (refiner, chart.id)
    }

    fn memory_refiner(llm: MockProvider) -> (Refiner<MockProvider, MemoryStore>, ChartId) {
        setup(llm, MemoryStore::new(), RefinerConfig::default())
    }

    #[tokio::test]
    async fn test_extract_chart_flow() {
        let llm = MockProvider::new(
            r#"Sure! [{"id":"1.a","element":"A sensor array","evidence":"TechSpec §3.1","reasoning":"Meets it."},{"id":"1.b","element":"A module","evidence":"[NO EVIDENCE MAPPED]","reasoning":"[NO REASONING]"}]"#,
        );
        let refiner = Refiner::new(llm, MemoryStore::new(), RefinerConfig::default()).unwrap();

        let chart = refiner
            .extract_chart("Demo", "1.a A sensor array | TechSpec §3.1 | Meets it.")
            .await
            .unwrap();

        assert_eq!(chart.elements.len(), 2);
        assert_eq!(chart.elements[1].evidence_text, "");
        assert_eq!(chart.elements[0].confidence.value(), 100);
        assert_eq!(refiner.chart(chart.id).unwrap(), chart);
        assert_eq!(refiner.list_charts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_extract_rejects_short_text_without_calling_ai() {
        let llm = MockProvider::new("[]");
        let provider = llm.clone();
        let refiner = Refiner::new(llm, MemoryStore::new(), RefinerConfig::default()).unwrap();

        let result = refiner.extract_chart("Tiny", "   too short   ").await;
        assert!(matches!(result, Err(RefineError::Extraction(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extract_with_unreadable_reply() {
        let llm = MockProvider::new("I could not find any claim elements.");
        let refiner = Refiner::new(llm, MemoryStore::new(), RefinerConfig::default()).unwrap();

        let result = refiner
            .extract_chart("Demo", "A claim chart document with enough text to parse.")
            .await;
        assert!(matches!(result, Err(RefineError::Extraction(_))));
        assert!(refiner.list_charts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_then_accept() {
        let (refiner, chart_id) = memory_refiner(MockProvider::new(REWRITE));

        let result = refiner.refine(chart_id, "1.a", "Remove hedging").await.unwrap();
        assert_eq!(result.report, RefineReport::Proposed { message_index: 1 });

        let element = &result.element;
        assert_eq!(element.chat_history.len(), 2);
        assert_eq!(element.chat_history[0].role, Role::User);
        assert_eq!(element.chat_history[1].content, "Removed hedging language.");
        assert!(element.chat_history[1].is_pending());
        // Nothing changes until the analyst accepts
        assert_eq!(element.reasoning_text, "The product probably meets this.");
        assert!(element.versions.is_empty());

        let accepted = match refiner.accept(chart_id, "1.a", 1).unwrap() {
            Transition::Applied(element) => element,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(
            accepted.reasoning_text,
            "Per TechSpec §3.1 the array meets the limitation."
        );
        assert_eq!(accepted.evidence_text, "TechSpec §3.1");
        assert_eq!(accepted.confidence.value(), 90);
        assert_eq!(accepted.versions.len(), 1);
        assert_eq!(accepted.versions[0].note, REFINEMENT_NOTE);
        assert_eq!(
            accepted.versions[0].reasoning_text,
            "The product probably meets this."
        );

        let stored = refiner.chart(chart_id).unwrap();
        assert_eq!(stored.element("1.a"), Some(&accepted));

        assert_eq!(
            refiner.accept(chart_id, "1.a", 1).unwrap(),
            Transition::AlreadyResolved(ReviewStatus::Accepted)
        );
        assert_eq!(refiner.chart(chart_id).unwrap().element("1.a"), Some(&accepted));
    }

    #[tokio::test]
    async fn test_rewrite_then_reject() {
        let (refiner, chart_id) = memory_refiner(MockProvider::new(REWRITE));
        let before = refiner.chart(chart_id).unwrap().element("1.a").cloned().unwrap();

        refiner.refine(chart_id, "1.a", "Remove hedging").await.unwrap();
        let rejected = match refiner.reject(chart_id, "1.a", 1).unwrap() {
            Transition::Applied(element) => element,
            other => panic!("expected Applied, got {:?}", other),
        };

        assert_eq!(rejected.reasoning_text, before.reasoning_text);
        assert_eq!(rejected.confidence, before.confidence);
        assert!(rejected.versions.is_empty());
        assert_eq!(rejected.chat_history[1].status, ReviewStatus::Rejected);
    }

    #[tokio::test]
    async fn test_commentary_aggregates_confidence_and_flags() {
        let llm = MockProvider::default();
        llm.push_response(r#"{"confidence":70,"flags":["Marketing copy only"],"explanation":"Evidence is weak.","noChangeNeeded":false}"#);
        llm.push_response(r#"{"confidence":85,"flags":["Single source"],"explanation":"Still weak.","noChangeNeeded":true}"#);
        let (refiner, chart_id) = memory_refiner(llm);

        let first = refiner.refine(chart_id, "1.b", "How strong is this?").await.unwrap();
        assert_eq!(
            first.report,
            RefineReport::Commentary {
                message_index: 1,
                no_change_needed: false
            }
        );
        assert_eq!(first.element.confidence.value(), 70);

        let second = refiner.refine(chart_id, "1.b", "And now?").await.unwrap();
        assert_eq!(
            second.report,
            RefineReport::Commentary {
                message_index: 3,
                no_change_needed: true
            }
        );
        assert_eq!(second.element.confidence.value(), 70);
        let flags: Vec<&str> = second.element.flags.iter().collect();
        assert_eq!(flags, vec!["Marketing copy only", "Single source"]);
        assert!(second.element.versions.is_empty());
        assert!(second.element.chat_history.iter().all(|m| !m.is_pending()));
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_user_message() {
        let llm = MockProvider::default();
        llm.push_error("quota exhausted");
        let (refiner, chart_id) = memory_refiner(llm);

        let result = refiner.refine(chart_id, "1.a", "Find more evidence").await.unwrap();
        match &result.report {
            RefineReport::Failed { message_index, reason } => {
                assert_eq!(*message_index, 1);
                assert!(reason.contains("quota exhausted"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }

        let element = refiner.chart(chart_id).unwrap().element("1.a").cloned().unwrap();
        assert_eq!(element.chat_history.len(), 2);
        assert_eq!(element.chat_history[0].content, "Find more evidence");
        assert_eq!(element.chat_history[1].content, FAILURE_MESSAGE);
        assert_eq!(element.reasoning_text, "The product probably meets this.");
        assert_eq!(element.confidence.value(), 100);
    }

    #[tokio::test]
    async fn test_unreadable_reply_is_failure() {
        let (refiner, chart_id) = memory_refiner(MockProvider::new("Sorry, I cannot help."));

        let result = refiner.refine(chart_id, "1.a", "Tighten it").await.unwrap();
        assert!(matches!(result.report, RefineReport::Failed { .. }));
        assert_eq!(result.element.chat_history[1].content, FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let llm = MockProvider::new(REWRITE).with_delay(Duration::from_millis(1_500));
        let config = RefinerConfig {
            llm_timeout_secs: 1,
            ..RefinerConfig::default()
        };
        let (refiner, chart_id) = setup(llm, MemoryStore::new(), config);

        let result = refiner.refine(chart_id, "1.a", "Tighten it").await.unwrap();
        match result.report {
            RefineReport::Failed { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_refinement_while_in_flight_is_busy() {
        let llm = MockProvider::new(REWRITE).with_delay(Duration::from_millis(200));
        let (refiner, chart_id) = memory_refiner(llm);

        let (first, second) = tokio::join!(
            refiner.refine(chart_id, "1.a", "First request"),
            refiner.refine(chart_id, "1.b", "Second request"),
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(RefineError::Busy)));

        // The rejected request left no trace
        let chart = refiner.chart(chart_id).unwrap();
        assert!(chart.element("1.b").unwrap().chat_history.is_empty());

        // And the session accepts work again afterwards
        assert!(refiner.refine(chart_id, "1.b", "Retry").await.is_ok());
    }

    #[tokio::test]
    async fn test_undo_proposes_restore_without_ai_call() {
        let llm = MockProvider::new(REWRITE);
        let provider = llm.clone();
        let (refiner, chart_id) = memory_refiner(llm);

        refiner.refine(chart_id, "1.a", "Remove hedging").await.unwrap();
        refiner.accept(chart_id, "1.a", 1).unwrap();
        assert_eq!(provider.call_count(), 1);

        let result = refiner.refine(chart_id, "1.a", "Undo the last change.").await.unwrap();
        assert_eq!(
            result.report,
            RefineReport::RestoreProposed {
                message_index: 3,
                version: 1
            }
        );
        assert_eq!(provider.call_count(), 1);

        let change = result.element.chat_history[3].proposed_change.clone().unwrap();
        assert_eq!(change.kind, ProposalKind::Restore { version: 1 });
        assert_eq!(
            change.new_reasoning.as_deref(),
            Some("The product probably meets this.")
        );

        let restored = match refiner.accept(chart_id, "1.a", 3).unwrap() {
            Transition::Applied(element) => element,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(restored.reasoning_text, "The product probably meets this.");
        assert_eq!(restored.confidence.value(), 100);
        assert_eq!(restored.versions.len(), 2);
        assert_eq!(restored.versions[1].note, ROLLBACK_NOTE);
        assert_eq!(
            restored.versions[1].reasoning_text,
            "Per TechSpec §3.1 the array meets the limitation."
        );
    }

    #[tokio::test]
    async fn test_undo_restores_empty_fields() {
        let llm = MockProvider::new(
            r#"{"refinedReasoning":"Module per §4.","refinedEvidence":"API Reference §4","confidence":85,"flags":["Single source"],"noChangeNeeded":false}"#,
        );
        let (refiner, chart_id) = memory_refiner(llm);

        refiner.refine(chart_id, "1.b", "Map the API docs").await.unwrap();
        let refined = match refiner.accept(chart_id, "1.b", 1).unwrap() {
            Transition::Applied(element) => element,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(refined.evidence_text, "API Reference §4");
        assert_eq!(refined.versions[0].evidence_text, "");

        let result = refiner.refine(chart_id, "1.b", "undo").await.unwrap();
        let change = result.element.chat_history[3].proposed_change.clone().unwrap();
        assert_eq!(change.new_evidence.as_deref(), Some(""));
        assert_eq!(change.new_reasoning.as_deref(), Some(""));

        let restored = match refiner.accept(chart_id, "1.b", 3).unwrap() {
            Transition::Applied(element) => element,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(restored.evidence_text, "");
        assert_eq!(restored.reasoning_text, "");
        assert_eq!(restored.confidence.value(), 100);
        assert!(restored.flags.is_empty());
        assert_eq!(restored.versions[1].evidence_text, "API Reference §4");
        assert_eq!(refiner.chart(chart_id).unwrap().element("1.b").unwrap(), &restored);
    }

    #[tokio::test]
    async fn test_undo_with_empty_history() {
        let llm = MockProvider::new(REWRITE);
        let provider = llm.clone();
        let (refiner, chart_id) = memory_refiner(llm);

        let result = refiner.refine(chart_id, "1.a", "revert").await.unwrap();
        assert_eq!(result.report, RefineReport::NoHistory { message_index: 1 });
        assert_eq!(result.element.chat_history[1].content, NO_HISTORY_MESSAGE);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_carries_documents_and_prior_turns() {
        let llm = MockProvider::new(r#"{"explanation":"Noted.","confidence":95}"#);
        let provider = llm.clone();
        let config = RefinerConfig {
            reference_doc_char_budget: 40,
            ..RefinerConfig::default()
        };
        let (refiner, chart_id) = setup(llm, MemoryStore::new(), config);

        refiner
            .attach_reference(chart_id, "API_Reference.pdf", &format!("§4.2 Bluetooth LE 5.0{}", "z".repeat(100)))
            .unwrap();
        refiner.refine(chart_id, "1.b", "First question").await.unwrap();
        refiner.refine(chart_id, "1.b", "Second question").await.unwrap();

        let prompt = provider.last_prompt().unwrap();
        assert!(prompt.contains("API_Reference.pdf"));
        assert!(prompt.contains("§4.2 Bluetooth LE 5.0"));
        assert!(!prompt.contains(&"z".repeat(30)));
        assert!(prompt.contains("Analyst: First question"));
        assert!(prompt.contains("AI: Noted."));
        assert!(!prompt.contains("Analyst: Second question"));
        assert_eq!(LlmProvider::model_name(&provider), "mock");
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let (refiner, chart_id) = memory_refiner(MockProvider::new(REWRITE));

        assert!(matches!(
            refiner.refine(chart_id, "1.a", "   ").await,
            Err(RefineError::EmptyQuery)
        ));
        assert!(matches!(
            refiner.refine(chart_id, "9.z", "Anything").await,
            Err(RefineError::ElementNotFound(_))
        ));
        assert!(matches!(
            refiner.refine(ChartId::new(), "1.a", "Anything").await,
            Err(RefineError::ChartNotFound(_))
        ));
        assert!(matches!(
            refiner.accept(chart_id, "1.a", 0),
            Err(RefineError::Review(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RefinerConfig {
            llm_timeout_secs: 0,
            ..RefinerConfig::default()
        };
        assert!(matches!(
            Refiner::new(MockProvider::default(), MemoryStore::new(), config),
            Err(RefineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_review_flow_on_sqlite() {
        let store = SqliteStore::new(":memory:").unwrap();
        let (refiner, chart_id) = setup(MockProvider::new(REWRITE), store, RefinerConfig::default());

        refiner.refine(chart_id, "1.a", "Remove hedging").await.unwrap();
        refiner.accept(chart_id, "1.a", 1).unwrap();

        let element = refiner.chart(chart_id).unwrap().element("1.a").cloned().unwrap();
        assert_eq!(element.versions.len(), 1);
        assert_eq!(element.chat_history[1].status, ReviewStatus::Accepted);

        let diff = refiner.proposal_diff(element.chat_history[1].proposed_change.as_ref().unwrap());
        assert!(crate::has_changes(&diff.reasoning));
        assert!(!crate::has_changes(&diff.evidence));

        assert!(refiner.delete_chart(chart_id).unwrap());
        refiner.close().unwrap();
    }
}
