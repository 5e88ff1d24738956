//! Finding types produced by the pattern detector.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// How urgently a finding deserves attention in the terminal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        };
        f.write_str(label)
    }
}

/// One detected performance-relevant code shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Finding {
    /// A `for` loop enclosed by `depth` other `for` loops.
    NestedLoop { line: usize, depth: usize },
    /// `range(n)` with a literal `n` above the threshold.
    HighIterationLoop { line: usize, bound: String },
    /// `+` or `*` evaluated on every iteration of the loop at `loop_line`.
    RepeatedComputation {
        line: usize,
        loop_line: usize,
        expression: String,
        source: String,
    },
    /// `range(x)` whose bound is not a literal, so its size is unknown.
    VariableBound { line: usize, expression: String },
}

impl Finding {
    /// Line the finding points at.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Finding::NestedLoop { line, .. }
            | Finding::HighIterationLoop { line, .. }
            | Finding::RepeatedComputation { line, .. }
            | Finding::VariableBound { line, .. } => *line,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Finding::NestedLoop { depth, .. } if *depth >= 2 => Severity::High,
            Finding::NestedLoop { .. } | Finding::HighIterationLoop { .. } => Severity::Medium,
            Finding::RepeatedComputation { .. } => Severity::Low,
            Finding::VariableBound { .. } => Severity::Info,
        }
    }

    /// Short category name for tables.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Finding::NestedLoop { .. } => "nested-loop",
            Finding::HighIterationLoop { .. } => "high-iteration",
            Finding::RepeatedComputation { .. } => "repeated-computation",
            Finding::VariableBound { .. } => "variable-bound",
        }
    }

    /// Human-readable suggestion, as shown in the report.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Finding::NestedLoop { line, depth } => {
                format!("Line {line}: Nested loop at level {depth}; consider flattening or vectorizing.")
            }
            Finding::HighIterationLoop { line, bound } => {
                format!("Line {line}: Consider optimizing loop with range({bound}).")
            }
            Finding::RepeatedComputation { line, source, .. } => {
                format!("Line {line}: Consider caching repeated computation '{source}'.")
            }
            Finding::VariableBound { line, expression } => {
                format!("Line {line}: Loop bound '{expression}' is not a constant; iteration count unknown.")
            }
        }
    }
}

/// All findings of one detector run, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    items: Vec<Finding>,
}

impl Findings {
    pub(crate) fn push(&mut self, finding: Finding) {
        self.items.push(finding);
    }

    /// Every finding in document order.
    #[must_use]
    pub fn all(&self) -> &[Finding] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `(line, depth)` of each nested loop.
    pub fn nested_loops(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.items.iter().filter_map(|f| match f {
            Finding::NestedLoop { line, depth } => Some((*line, *depth)),
            _ => None,
        })
    }

    pub fn high_iterations(&self) -> impl Iterator<Item = &Finding> {
        self.of_kind(|f| matches!(f, Finding::HighIterationLoop { .. }))
    }

    pub fn repeated_computations(&self) -> impl Iterator<Item = &Finding> {
        self.of_kind(|f| matches!(f, Finding::RepeatedComputation { .. }))
    }

    pub fn variable_bounds(&self) -> impl Iterator<Item = &Finding> {
        self.of_kind(|f| matches!(f, Finding::VariableBound { .. }))
    }

    fn of_kind(&self, keep: fn(&Finding) -> bool) -> impl Iterator<Item = &Finding> {
        self.items.iter().filter(move |f| keep(f))
    }

    /// Report lines: high-iteration loops first, then repeated computations.
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        self.high_iterations()
            .chain(self.repeated_computations())
            .chain(self.variable_bounds())
            .map(Finding::message)
            .collect()
    }
}

#[derive(Serialize)]
struct NestedLoopEntry {
    line: usize,
    level: usize,
}

impl Serialize for Findings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nested: Vec<NestedLoopEntry> = self
            .nested_loops()
            .map(|(line, level)| NestedLoopEntry { line, level })
            .collect();
        let high: Vec<&Finding> = self.high_iterations().collect();
        let repeated: Vec<&Finding> = self.repeated_computations().collect();
        let variable: Vec<&Finding> = self.variable_bounds().collect();
        let candidates: [&Finding; 0] = [];

        let mut state = serializer.serialize_struct("Findings", 5)?;
        state.serialize_field("nestedLoops", &nested)?;
        state.serialize_field("highIterations", &high)?;
        state.serialize_field("repeatedComputations", &repeated)?;
        state.serialize_field("vectorizationCandidates", &candidates)?;
        state.serialize_field("variableBounds", &variable)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_keys() {
        let mut findings = Findings::default();
        findings.push(Finding::NestedLoop { line: 2, depth: 1 });
        findings.push(Finding::HighIterationLoop {
            line: 1,
            bound: "5000".to_owned(),
        });
        let json = serde_json::to_value(&findings).unwrap();
        assert_eq!(json["nestedLoops"][0]["line"], 2);
        assert_eq!(json["nestedLoops"][0]["level"], 1);
        assert_eq!(json["highIterations"][0]["bound"], "5000");
        assert_eq!(json["vectorizationCandidates"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["variableBounds"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_suggestion_messages() {
        let mut findings = Findings::default();
        findings.push(Finding::RepeatedComputation {
            line: 3,
            loop_line: 2,
            expression: "BinOp(left=Name(id='i'), op=Add(), right=Constant(value=1))".to_owned(),
            source: "i + 1".to_owned(),
        });
        findings.push(Finding::HighIterationLoop {
            line: 2,
            bound: "5000".to_owned(),
        });
        assert_eq!(
            findings.suggestions(),
            vec![
                "Line 2: Consider optimizing loop with range(5000).".to_owned(),
                "Line 3: Consider caching repeated computation 'i + 1'.".to_owned(),
            ]
        );
    }

    #[test]
    fn test_severity_grows_with_depth() {
        assert_eq!(Finding::NestedLoop { line: 1, depth: 1 }.severity(), Severity::Medium);
        assert_eq!(Finding::NestedLoop { line: 1, depth: 3 }.severity(), Severity::High);
    }
}
