//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use claimchart_domain::{Chart, ChartSummary, ClaimElement, ExportIssue, ReviewStatus, Role};
use claimchart_refine::{
    truncate_chars, DiffKind, DiffOp, ProposalDiff, RefineReport, RefinementResult, Transition,
};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const CELL_WIDTH: usize = 48;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Output format in use.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format chart summaries.
    pub fn format_charts(&self, charts: &[ChartSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(charts)?),
            OutputFormat::Quiet => Ok(charts
                .iter()
                .map(|c| c.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if charts.is_empty() {
                    return Ok(self.colorize("No charts found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Title", "Elements", "Updated"]);
                for chart in charts {
                    builder.push_record([
                        chart.id.to_string(),
                        chart.title.clone(),
                        chart.element_count.to_string(),
                        chart.updated_at.to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a chart with one row per element.
    pub fn format_chart(&self, chart: &Chart) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(chart)?),
            OutputFormat::Quiet => Ok(chart
                .elements
                .iter()
                .map(|e| e.id.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["ID", "Element", "Evidence", "Confidence", "Flags", "Versions", "Pending"]);
                for element in &chart.elements {
                    let pending = element
                        .latest_pending()
                        .map(|idx| format!("#{}", idx))
                        .unwrap_or_default();
                    builder.push_record([
                        element.id.clone(),
                        cell(&element.element_text),
                        cell(&element.evidence_text),
                        element.confidence.to_string(),
                        element.flags.len().to_string(),
                        element.versions.len().to_string(),
                        pending,
                    ]);
                }

                let mut out = format!(
                    "{} ({})\n",
                    self.colorize(&chart.title, "cyan"),
                    chart.id
                );
                if !chart.reference_documents.is_empty() {
                    let names: Vec<&str> = chart
                        .reference_documents
                        .iter()
                        .map(|d| d.name.as_str())
                        .collect();
                    out.push_str(&format!("Reference documents: {}\n", names.join(", ")));
                }
                out.push_str(&self.render(builder));
                Ok(out)
            }
        }
    }

    /// Format one element with its conversation.
    pub fn format_element(&self, element: &ClaimElement) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(element)?),
            OutputFormat::Quiet => Ok(element.id.clone()),
            OutputFormat::Table => {
                let mut out = String::new();
                out.push_str(&format!("{} {}\n", self.colorize("Element", "cyan"), element.id));
                out.push_str(&format!("  Claim:      {}\n", element.element_text));
                out.push_str(&format!("  Evidence:   {}\n", or_dash(&element.evidence_text)));
                out.push_str(&format!("  Reasoning:  {}\n", or_dash(&element.reasoning_text)));
                out.push_str(&format!("  Confidence: {}\n", element.confidence));
                for flag in element.flags.iter() {
                    out.push_str(&format!("  {}\n", self.warning(flag)));
                }

                if !element.chat_history.is_empty() {
                    out.push_str("\nConversation:\n");
                    for (idx, message) in element.chat_history.iter().enumerate() {
                        let speaker = match message.role {
                            Role::User => self.colorize("analyst", "blue"),
                            Role::Assistant => self.colorize("ai", "magenta"),
                        };
                        let status = match message.status {
                            ReviewStatus::None => String::new(),
                            ReviewStatus::Pending => self.colorize(" [pending]", "yellow"),
                            ReviewStatus::Accepted => self.colorize(" [accepted]", "green"),
                            ReviewStatus::Rejected => self.colorize(" [rejected]", "red"),
                        };
                        out.push_str(&format!("  #{} {}{}: {}\n", idx, speaker, status, message.content));
                    }
                }
                Ok(out)
            }
        }
    }

    /// Format an element's version log.
    pub fn format_history(&self, element: &ClaimElement) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&element.versions)?),
            OutputFormat::Quiet => Ok((1..=element.versions.len())
                .map(|n| format!("v{}", n))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if element.versions.is_empty() {
                    return Ok(self.colorize("No saved versions.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Version", "Note", "Timestamp", "Confidence", "Reasoning", "Evidence"]);
                for (idx, version) in element.versions.iter().enumerate() {
                    builder.push_record([
                        format!("v{}", idx + 1),
                        version.note.clone(),
                        version.timestamp.to_string(),
                        version.confidence.to_string(),
                        cell(&version.reasoning_text),
                        cell(&version.evidence_text),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a proposal diff.
    ///
    /// Without color, additions render as `{+text+}` and removals as `[-text-]`.
    pub fn format_diff(&self, diff: &ProposalDiff<'_>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(diff)?),
            OutputFormat::Quiet | OutputFormat::Table => Ok(format!(
                "Reasoning:\n  {}\nEvidence:\n  {}",
                self.render_ops(&diff.reasoning),
                self.render_ops(&diff.evidence)
            )),
        }
    }

    fn render_ops(&self, ops: &[DiffOp<'_>]) -> String {
        if ops.is_empty() {
            return "-".to_string();
        }
        ops.iter()
            .map(|op| match (op.kind, self.color_enabled) {
                (DiffKind::Same, _) => op.text.to_string(),
                (DiffKind::Added, true) => op.text.green().underline().to_string(),
                (DiffKind::Removed, true) => op.text.red().strikethrough().to_string(),
                (DiffKind::Added, false) => format!("{{+{}+}}", op.text),
                (DiffKind::Removed, false) => format!("[-{}-]", op.text),
            })
            .collect()
    }

    /// Format export readiness issues.
    pub fn format_issues(&self, issues: &[ExportIssue]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(issues)?),
            OutputFormat::Quiet => Ok(issues
                .iter()
                .map(|i| i.element_id.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if issues.is_empty() {
                    return Ok(self.success("Chart is ready to export."));
                }

                let mut builder = Builder::default();
                builder.push_record(["Element", "Issue"]);
                for issue in issues {
                    builder.push_record([issue.element_id.clone(), issue.issue.clone()]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format the outcome of a refine call.
    pub fn format_refinement(&self, result: &RefinementResult) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(&result.report)?);
        }

        let content = result
            .element
            .chat_history
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let line = match &result.report {
            RefineReport::Proposed { message_index } => self.info(&format!(
                "Proposal #{} pending on {}: {}",
                message_index, result.element.id, content
            )),
            RefineReport::RestoreProposed {
                message_index,
                version,
            } => self.info(&format!(
                "Rollback to v{} pending as #{} on {}",
                version, message_index, result.element.id
            )),
            RefineReport::Commentary { .. } => format!(
                "{}\n{}",
                content,
                self.info(&format!(
                    "Confidence {}, {} flag(s)",
                    result.element.confidence,
                    result.element.flags.len()
                ))
            ),
            RefineReport::NoHistory { .. } => self.warning(content),
            RefineReport::Failed { .. } => self.error(content),
        };
        Ok(line)
    }

    /// Format the outcome of an accept or reject.
    pub fn format_transition(&self, transition: &Transition, decision: &str) -> String {
        match transition {
            Transition::Applied(element) => self.success(&format!(
                "Proposal {} on {} ({} version(s) logged)",
                decision,
                element.id,
                element.versions.len()
            )),
            Transition::AlreadyResolved(status) => {
                self.warning(&format!("Proposal was already {}", status.as_str()))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Shorten text for a table cell.
fn cell(text: &str) -> String {
    let short = truncate_chars(text, CELL_WIDTH);
    if short.len() < text.len() {
        format!("{}…", short)
    } else {
        short.to_string()
    }
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "-"
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimchart_domain::{ChatMessage, ElementSeed};
    use claimchart_refine::word_diff;

    fn create_test_chart() -> Chart {
        let mut element = ClaimElement::from_seed(ElementSeed {
            id: "1.a".to_string(),
            element_text: "A digital sensor array".to_string(),
            evidence_text: String::new(),
            reasoning_text: "Reasoning".to_string(),
        });
        element.versions.push(element.capture_version("Before refinement", 7));
        element.chat_history.push(ChatMessage::user("Find evidence"));
        Chart::new("NexaTherm", vec![element], 1)
    }

    #[test]
    fn test_chart_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_chart(&create_test_chart()).unwrap();
        assert!(output.contains("NexaTherm"));
        assert!(output.contains("Confidence"));
        assert!(output.contains("1.a"));
    }

    #[test]
    fn test_chart_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_chart(&create_test_chart()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["elements"][0]["id"], "1.a");
    }

    #[test]
    fn test_quiet_charts() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let chart = create_test_chart();
        let output = formatter.format_charts(&[chart.summary()]).unwrap();
        assert_eq!(output, chart.id.to_string());
    }

    #[test]
    fn test_empty_charts() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_charts(&[]).unwrap();
        assert!(output.contains("No charts found"));
    }

    #[test]
    fn test_element_detail() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let chart = create_test_chart();
        let output = formatter.format_element(&chart.elements[0]).unwrap();
        assert!(output.contains("Evidence:   -"));
        assert!(output.contains("#0 analyst: Find evidence"));
    }

    #[test]
    fn test_history_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let chart = create_test_chart();
        let output = formatter.format_history(&chart.elements[0]).unwrap();
        assert!(output.contains("v1"));
        assert!(output.contains("Before refinement"));
    }

    #[test]
    fn test_plain_diff_markers() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let diff = ProposalDiff {
            reasoning: word_diff("meets probably", "meets clearly"),
            evidence: Vec::new(),
        };
        let output = formatter.format_diff(&diff).unwrap();
        assert!(output.contains("meets {+clearly+}[-probably-]"));
        assert!(output.contains("Evidence:\n  -"));
    }

    #[test]
    fn test_issues_ready() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(
            formatter.format_issues(&[]).unwrap(),
            "✓ Chart is ready to export."
        );
    }

    #[test]
    fn test_cell_truncates() {
        let long = "x".repeat(CELL_WIDTH + 5);
        assert_eq!(cell(&long).chars().count(), CELL_WIDTH + 1);
        assert_eq!(cell("short"), "short");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
