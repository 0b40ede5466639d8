// Response-differential analyzers
//
// Each analyzer consumes a (baseline, mutated) response pair plus the test
// case that produced it and emits a verdict. Dispatch is keyed on the case's
// test_type; decision tables live with each analyzer. Any status code a
// table does not list resolves to inconclusive/low rather than an error.
//
// Layout:
//   similarity.rs  - swappable content scorer (leaf)
//   bola.rs        - object-level authorization table (uses similarity)
//   auth_bypass.rs - authentication bypass table
//   jwt.rs         - JWT acceptance table

pub mod auth_bypass;
pub mod bola;
pub mod jwt;
pub mod similarity;

pub use auth_bypass::AuthBypassAnalyzer;
pub use bola::BolaAnalyzer;
pub use jwt::JwtAnalyzer;
pub use similarity::{JaccardScorer, SimilarityScorer};

use crate::models::{ResponseSnapshot, Severity, TestCase, TestStatus, TestType};
use serde_json::{Map, Value};

/// Classification of one executed case before it is wrapped into a result.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub status: TestStatus,
    pub severity: Severity,
    pub evidence: Map<String, Value>,
}

impl Verdict {
    pub fn new(status: TestStatus, severity: Severity, evidence: Map<String, Value>) -> Self {
        Self {
            status,
            severity,
            evidence,
        }
    }
}

pub trait ResponseAnalyzer {
    fn analyze(
        &self,
        baseline: &ResponseSnapshot,
        mutated: &ResponseSnapshot,
        case: &TestCase,
    ) -> Verdict;
}

/// The full analyzer table, one entry per test type.
pub struct AnalyzerSet {
    bola: BolaAnalyzer,
    auth_bypass: AuthBypassAnalyzer,
    jwt: JwtAnalyzer,
}

impl Default for AnalyzerSet {
    fn default() -> Self {
        Self {
            bola: BolaAnalyzer::default(),
            auth_bypass: AuthBypassAnalyzer,
            jwt: JwtAnalyzer,
        }
    }
}

impl AnalyzerSet {
    pub fn analyze(
        &self,
        baseline: &ResponseSnapshot,
        mutated: &ResponseSnapshot,
        case: &TestCase,
    ) -> Verdict {
        match case.test_type {
            TestType::Bola => self.bola.analyze(baseline, mutated, case),
            TestType::AuthBypass => self.auth_bypass.analyze(baseline, mutated, case),
            TestType::JwtManipulation => self.jwt.analyze(baseline, mutated, case),
        }
    }
}

/// Evidence fields every analyzer records.
pub(crate) fn base_evidence(
    baseline: &ResponseSnapshot,
    mutated: &ResponseSnapshot,
) -> Map<String, Value> {
    let mut evidence = Map::new();
    evidence.insert("baseline_status".to_string(), Value::from(baseline.status_code));
    evidence.insert("test_status".to_string(), Value::from(mutated.status_code));
    evidence.insert(
        "baseline_content_length".to_string(),
        Value::from(baseline.content_length),
    );
    evidence.insert(
        "test_content_length".to_string(),
        Value::from(mutated.content_length),
    );
    evidence
}
