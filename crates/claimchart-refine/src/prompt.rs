//! LLM prompt construction for refinement and extraction

use crate::types::{RefinementRequest, truncate_chars};
use claimchart_domain::Role;

/// Builds the prompt for one refinement call
pub struct PromptBuilder<'a> {
    request: &'a RefinementRequest,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(request: &'a RefinementRequest) -> Self {
        Self { request }
    }

    /// Build the complete refinement prompt
    pub fn build(&self) -> String {
        let request = self.request;
        let mut prompt = String::new();

        // 1. Role and rules
        prompt.push_str(REFINEMENT_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. Reference documents
        prompt.push_str("--- UPLOADED REFERENCE DOCUMENTS ---\n");
        if request.reference_documents.is_empty() {
            prompt.push_str(NO_DOCUMENTS_NOTICE);
            prompt.push('\n');
        } else {
            for doc in &request.reference_documents {
                prompt.push_str(&format!("=== DOCUMENT: \"{}\" ===\n{}\n\n", doc.name, doc.text));
            }
        }
        prompt.push('\n');

        // 3. The element
        prompt.push_str("--- CLAIM ELEMENT BEING WORKED ON ---\n");
        prompt.push_str(&format!("Element ID: {}\n", request.element_id));
        prompt.push_str(&format!("Claim language: {}\n", request.element_text));
        prompt.push_str(&format!("Current evidence: {}\n", or_none(&request.evidence_text)));
        prompt.push_str(&format!("Current reasoning: {}\n\n", or_none(&request.reasoning_text)));

        // 4. Prior conversation
        if !request.prior_turns.is_empty() {
            prompt.push_str("--- PRIOR CONVERSATION ---\n");
            for turn in &request.prior_turns {
                let speaker = match turn.role {
                    Role::User => "Analyst",
                    Role::Assistant => "AI",
                };
                prompt.push_str(&format!("{}: {}\n", speaker, turn.content));
            }
            prompt.push('\n');
        }

        // 5. The request
        prompt.push_str("--- ANALYST REQUEST ---\n");
        prompt.push_str(&request.query);
        prompt.push_str("\n\n");

        // 6. Output format
        prompt.push_str(REFINEMENT_OUTPUT_FORMAT);

        prompt
    }
}

fn or_none(text: &str) -> &str {
    if text.trim().is_empty() {
        "(none)"
    } else {
        text
    }
}

/// Builds the prompt that turns document text into claim elements
pub struct ExtractionPromptBuilder<'a> {
    text: &'a str,
    char_budget: usize,
}

impl<'a> ExtractionPromptBuilder<'a> {
    /// Create a builder; only the first `char_budget` characters are sent
    pub fn new(text: &'a str, char_budget: usize) -> Self {
        Self { text, char_budget }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();
        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\nText to parse:\n\"\"\"\n");
        prompt.push_str(truncate_chars(self.text, self.char_budget));
        prompt.push_str("\n\"\"\"\n\n");
        prompt.push_str(EXTRACTION_OUTPUT_FORMAT);
        prompt
    }
}

const REFINEMENT_INSTRUCTIONS: &str = r#"You are an expert patent litigation analyst assistant. Your role is to help strengthen patent infringement claim charts.

STRICT RULES:
1. Never fabricate, invent, or assume technical specifications that are not explicitly stated in the provided reference documents.
2. Never use hedging language in legal reasoning. Forbidden words: "probably", "likely", "may", "might", "appears to", "suggests", "could", "seems".
3. If asked to find evidence but no relevant document is provided, say "I cannot find this in the provided documents" and name the document type that is needed.
4. Always cite specific section numbers (e.g. "§3.1") when referencing document content.
5. If asked to add a new claim element without the exact patent claim language, ask for it first."#;

const NO_DOCUMENTS_NOTICE: &str =
    "(No reference documents uploaded. Do NOT fabricate any technical specifications.)";

const REFINEMENT_OUTPUT_FORMAT: &str = r#"Respond with a JSON object in exactly this format:
{
  "refinedReasoning": "new reasoning text, or empty string if unchanged",
  "refinedEvidence": "new evidence text, or empty string if unchanged",
  "confidence": <number 0-100>,
  "flags": ["weaknesses or concerns, empty array if none"],
  "explanation": "text shown to the analyst, citing §sections when referencing documents",
  "proposedChange": <true if this response rewrites reasoning or evidence>,
  "noChangeNeeded": <true if the element is already strong and nothing is rewritten>
}

If the element is already well-evidenced and you are confirming its strength, set noChangeNeeded=true and do not rewrite any text."#;

const EXTRACTION_INSTRUCTIONS: &str = "You are a patent data extraction assistant. Extract claim elements from the following claim chart text and return ONLY a valid JSON array.";

const EXTRACTION_OUTPUT_FORMAT: &str = r#"Return a JSON array exactly like this (no markdown, no explanation, just the array):
[{"id":"1.a","element":"<claim text>","evidence":"<evidence text>","reasoning":"<reasoning text>"},...]

Rules:
- Include ALL elements you find (1.a, 1.b, 1.c, ...)
- If evidence says [NO EVIDENCE MAPPED] or similar, use an empty string
- If reasoning says [NO REASONING] or similar, use an empty string
- If evidence shows CONFLICTING SOURCES, include both sources in the evidence field
- Return ONLY the JSON array, starting with [ and ending with ]"#;
