// Sun Jul 26 2026 - Alex

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::equiv::error::CompareError;
use crate::equiv::report::{Divergence, EquivalenceResult};

/// What happened for one compared root. An error is its own outcome, never
/// collapsed into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootVerdict {
    Equivalent,
    Divergent,
    Errored,
}

impl fmt::Display for RootVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootVerdict::Equivalent => write!(f, "equivalent"),
            RootVerdict::Divergent => write!(f, "divergent"),
            RootVerdict::Errored => write!(f, "errored"),
        }
    }
}

/// One root's row in a report: its name, the verdict, and whichever of the
/// divergence list or the error text applies.
#[derive(Debug, Clone, Serialize)]
pub struct RootOutcome {
    pub name: String,
    pub verdict: RootVerdict,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub divergences: Vec<Divergence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RootOutcome {
    pub fn from_result(name: &str, result: Result<EquivalenceResult, CompareError>) -> Self {
        match result {
            Ok(result) if result.is_equivalent() => Self {
                name: name.to_string(),
                verdict: RootVerdict::Equivalent,
                divergences: Vec::new(),
                error: None,
            },
            Ok(result) => Self {
                name: name.to_string(),
                verdict: RootVerdict::Divergent,
                divergences: result.divergences,
                error: None,
            },
            Err(err) => Self {
                name: name.to_string(),
                verdict: RootVerdict::Errored,
                divergences: Vec::new(),
                error: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportTally {
    pub equivalent: usize,
    pub divergent: usize,
    pub errored: usize,
}

impl fmt::Display for ReportTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} equivalent, {} divergent, {} errored",
            self.equivalent, self.divergent, self.errored
        )
    }
}

/// The structured diff handed to the external harness: one outcome per
/// compared root plus the build errors each side reported while its graph
/// was being assembled.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub label: String,
    pub roots: Vec<RootOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub left_errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub right_errors: Vec<String>,
}

impl ComparisonReport {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            roots: Vec::new(),
            left_errors: Vec::new(),
            right_errors: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: RootOutcome) {
        self.roots.push(outcome);
    }

    pub fn record(&mut self, name: &str, result: Result<EquivalenceResult, CompareError>) {
        self.roots.push(RootOutcome::from_result(name, result));
    }

    pub fn tally(&self) -> ReportTally {
        let mut tally = ReportTally::default();
        for root in &self.roots {
            match root.verdict {
                RootVerdict::Equivalent => tally.equivalent += 1,
                RootVerdict::Divergent => tally.divergent += 1,
                RootVerdict::Errored => tally.errored += 1,
            }
        }
        tally
    }

    /// True when every root came back equivalent and neither side reported
    /// build errors.
    pub fn is_clean(&self) -> bool {
        self.left_errors.is_empty()
            && self.right_errors.is_empty()
            && self.roots.iter().all(|r| r.verdict == RootVerdict::Equivalent)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(json.as_bytes())
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.label, self.tally())?;
        for root in &self.roots {
            match root.verdict {
                RootVerdict::Equivalent => writeln!(f, "  {} {}", root.name, root.verdict)?,
                RootVerdict::Divergent => {
                    writeln!(f, "  {} {}:", root.name, root.verdict)?;
                    for d in &root.divergences {
                        writeln!(f, "    {}", d)?;
                    }
                }
                RootVerdict::Errored => {
                    writeln!(
                        f,
                        "  {} {}: {}",
                        root.name,
                        root.verdict,
                        root.error.as_deref().unwrap_or("unknown error")
                    )?;
                }
            }
        }
        if !self.left_errors.is_empty() {
            writeln!(f, "  left build errors: {}", self.left_errors.iter().join("; "))?;
        }
        if !self.right_errors.is_empty() {
            writeln!(f, "  right build errors: {}", self.right_errors.iter().join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclFeed;
    use crate::equiv::engine::EquivalenceEngine;
    use crate::equiv::error::Side;
    use crate::equiv::flags::CompareFlags;
    use crate::graph::arena::TypeGraph;
    use crate::graph::builder::GraphBuilder;
    use crate::layout::target::TargetModel;

    fn graph_from(feeds: &[(&str, &str)]) -> TypeGraph {
        let feeds: Vec<DeclFeed> = feeds
            .iter()
            .map(|(label, json)| DeclFeed::from_json_str(label, json).unwrap())
            .collect();
        let out = GraphBuilder::from_feeds(&feeds).build();
        assert!(out.is_clean(), "build errors: {:?}", out.errors);
        out.graph
    }

    fn check(left: &TypeGraph, right: &TypeGraph, flags: CompareFlags) -> ComparisonReport {
        let engine = EquivalenceEngine::new(left, right, TargetModel::lp64(), flags);
        let mut report = ComparisonReport::new("fixture");
        for (name, _) in left.declared_roots() {
            if right.lookup(name).is_some() {
                report.record(name, engine.compare_named(name));
            }
        }
        report
    }

    #[test]
    fn test_split_object_corpus_is_equivalent() {
        // The same header struct declared in two translation units merges to
        // one node and matches the debug-info view, names and layout included.
        let left = graph_from(&[
            ("tu1", include_str!("../../fixtures/splitobjs/source.json")),
            ("tu2", include_str!("../../fixtures/splitobjs/source2.json")),
        ]);
        let right = graph_from(&[(
            "debug",
            include_str!("../../fixtures/splitobjs/debug.json"),
        )]);
        let report = check(&left, &right, CompareFlags::strict());
        assert!(report.is_clean(), "{}", report);
        assert_eq!(report.tally().equivalent, 3);
    }

    #[test]
    fn test_typecases_corpus_matches_loosely_only() {
        let left = graph_from(&[(
            "source",
            include_str!("../../fixtures/typecases/source.json"),
        )]);
        let right = graph_from(&[(
            "debug",
            include_str!("../../fixtures/typecases/debug.json"),
        )]);
        let loose = check(&left, &right, CompareFlags::CHECK_LAYOUT);
        assert!(loose.is_clean(), "{}", loose);

        // The debug side renamed every struct and union member.
        let strict = check(&left, &right, CompareFlags::strict());
        let tally = strict.tally();
        assert_eq!(tally.divergent, 2);
        assert!(tally.equivalent > 0);
    }

    #[test]
    fn test_structcases_corpus_is_equivalent_strictly() {
        let left = graph_from(&[(
            "source",
            include_str!("../../fixtures/structcases/source.json"),
        )]);
        let right = graph_from(&[(
            "debug",
            include_str!("../../fixtures/structcases/debug.json"),
        )]);
        let report = check(&left, &right, CompareFlags::strict());
        assert!(report.is_clean(), "{}", report);
        assert_eq!(report.tally().equivalent, 4);
    }

    #[test]
    fn test_tally_counts_each_verdict() {
        let mut report = ComparisonReport::new("fixture");
        report.record("a", Ok(EquivalenceResult { divergences: Vec::new() }));
        report.record(
            "b",
            Err(CompareError::RootNotFound { side: Side::Right, name: "b".into() }),
        );
        let tally = report.tally();
        assert_eq!(tally.equivalent, 1);
        assert_eq!(tally.errored, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_build_errors_make_report_dirty() {
        let mut report = ComparisonReport::new("fixture");
        report.record("a", Ok(EquivalenceResult { divergences: Vec::new() }));
        assert!(report.is_clean());
        report.left_errors.push("conflicting definition of 'a'".into());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_json_carries_error_text_not_a_verdict() {
        let mut report = ComparisonReport::new("fixture");
        report.record(
            "vague",
            Err(CompareError::RootNotFound { side: Side::Left, name: "vague".into() }),
        );
        let json = report.to_json().unwrap();
        assert!(json.contains("\"verdict\": \"errored\""));
        assert!(json.contains("No type named 'vague'"));
    }
}
