// BOLA / IDOR response analysis
//
// Decision table:
//   mutated == 0                          -> error / info
//   mutated == 200 and baseline == 200:
//     similarity > 0.8                    -> vulnerable / high
//     0.3 < similarity <= 0.8             -> vulnerable / medium
//   both in {200, 201, 202}, codes differ -> vulnerable / medium
//   mutated in {401, 403, 404}            -> secure / info
//   mutated >= 500                        -> inconclusive / low
//   anything else                         -> inconclusive / low

use super::similarity::{JaccardScorer, SimilarityScorer};
use super::{base_evidence, ResponseAnalyzer, Verdict};
use crate::models::{ResponseSnapshot, Severity, TestCase, TestStatus};
use serde_json::Value;

pub struct BolaAnalyzer {
    scorer: Box<dyn SimilarityScorer>,
}

impl Default for BolaAnalyzer {
    fn default() -> Self {
        Self {
            scorer: Box::new(JaccardScorer),
        }
    }
}

impl BolaAnalyzer {
    pub fn with_scorer(scorer: Box<dyn SimilarityScorer>) -> Self {
        Self { scorer }
    }
}

impl ResponseAnalyzer for BolaAnalyzer {
    fn analyze(
        &self,
        baseline: &ResponseSnapshot,
        mutated: &ResponseSnapshot,
        case: &TestCase,
    ) -> Verdict {
        let mut evidence = base_evidence(baseline, mutated);
        if let Ok(mutations) = serde_json::to_value(&case.parameter_mutations) {
            evidence.insert("mutations_applied".to_string(), mutations);
        }

        if mutated.status_code == 0 {
            return Verdict::new(TestStatus::Error, Severity::Info, evidence);
        }

        // The target served the mutated object id: compare the bodies to
        // decide whether it returned another principal's data.
        if mutated.status_code == 200 && baseline.status_code == 200 {
            let similarity = self.scorer.score(&baseline.content, &mutated.content);
            if similarity > 0.8 {
                evidence.insert("content_similarity".to_string(), Value::from(similarity));
                evidence.insert("vulnerability_type".to_string(), Value::from("data_access"));
                return Verdict::new(TestStatus::Vulnerable, Severity::High, evidence);
            }
            if similarity > 0.3 {
                evidence.insert("content_similarity".to_string(), Value::from(similarity));
                evidence.insert(
                    "vulnerability_type".to_string(),
                    Value::from("potential_data_leakage"),
                );
                return Verdict::new(TestStatus::Vulnerable, Severity::Medium, evidence);
            }
        }

        let success = [200, 201, 202];
        if success.contains(&mutated.status_code)
            && success.contains(&baseline.status_code)
            && mutated.status_code != baseline.status_code
        {
            evidence.insert("status_code_difference".to_string(), Value::from(true));
            return Verdict::new(TestStatus::Vulnerable, Severity::Medium, evidence);
        }

        if matches!(mutated.status_code, 401 | 403 | 404) {
            return Verdict::new(TestStatus::Secure, Severity::Info, evidence);
        }

        if mutated.status_code >= 500 {
            evidence.insert("server_error".to_string(), Value::from(true));
            return Verdict::new(TestStatus::Inconclusive, Severity::Low, evidence);
        }

        Verdict::new(TestStatus::Inconclusive, Severity::Low, evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Safety, TestType};
    use std::collections::HashMap;

    fn snapshot(status_code: u16, content: &str) -> ResponseSnapshot {
        ResponseSnapshot {
            status_code,
            content: content.to_string(),
            content_length: content.chars().count(),
            headers: HashMap::new(),
            elapsed_ms: 10,
        }
    }

    fn case() -> TestCase {
        TestCase {
            id: "t-1".to_string(),
            endpoint_id: "ep-1".to_string(),
            test_type: TestType::Bola,
            test_name: "BOLA common ID - id=1".to_string(),
            method: "GET".to_string(),
            url: "http://api/users/1".to_string(),
            headers: HashMap::new(),
            parameter_mutations: Vec::new(),
            jwt_mutations: Vec::new(),
            safety: Safety::for_method("GET"),
            expected_outcome: "access_denied".to_string(),
        }
    }

    #[test]
    fn identical_200_content_is_high_severity() {
        let analyzer = BolaAnalyzer::default();
        let body = r#"{"id": 2, "email": "victim@example.com", "balance": 100}"#;
        let verdict = analyzer.analyze(&snapshot(200, body), &snapshot(200, body), &case());
        assert_eq!(verdict.status, TestStatus::Vulnerable);
        assert_eq!(verdict.severity, Severity::High);
        assert_eq!(
            verdict.evidence.get("vulnerability_type").unwrap(),
            "data_access"
        );
    }

    #[test]
    fn partial_overlap_is_medium_severity() {
        let analyzer = BolaAnalyzer::default();
        // 2 shared tokens of 6 total -> similarity ~0.33
        let verdict = analyzer.analyze(
            &snapshot(200, "id name email role"),
            &snapshot(200, "id name other thing"),
            &case(),
        );
        assert_eq!(verdict.status, TestStatus::Vulnerable);
        assert_eq!(verdict.severity, Severity::Medium);
    }

    #[test]
    fn low_similarity_200_falls_to_inconclusive() {
        let analyzer = BolaAnalyzer::default();
        let verdict = analyzer.analyze(
            &snapshot(200, "alpha beta gamma delta"),
            &snapshot(200, "epsilon zeta eta theta"),
            &case(),
        );
        assert_eq!(verdict.status, TestStatus::Inconclusive);
        assert_eq!(verdict.severity, Severity::Low);
    }

    #[test]
    fn differing_success_codes_are_medium() {
        let analyzer = BolaAnalyzer::default();
        let verdict = analyzer.analyze(&snapshot(200, "a"), &snapshot(202, "b"), &case());
        assert_eq!(verdict.status, TestStatus::Vulnerable);
        assert_eq!(verdict.severity, Severity::Medium);
        assert_eq!(
            verdict.evidence.get("status_code_difference").unwrap(),
            &serde_json::json!(true)
        );
    }

    #[test]
    fn denial_codes_are_secure() {
        let analyzer = BolaAnalyzer::default();
        for status in [401, 403, 404] {
            let verdict = analyzer.analyze(&snapshot(200, "a"), &snapshot(status, ""), &case());
            assert_eq!(verdict.status, TestStatus::Secure);
            assert_eq!(verdict.severity, Severity::Info);
        }
    }

    #[test]
    fn server_error_is_inconclusive() {
        let analyzer = BolaAnalyzer::default();
        let verdict = analyzer.analyze(&snapshot(200, "a"), &snapshot(503, ""), &case());
        assert_eq!(verdict.status, TestStatus::Inconclusive);
        assert_eq!(verdict.severity, Severity::Low);
        assert_eq!(
            verdict.evidence.get("server_error").unwrap(),
            &serde_json::json!(true)
        );
    }

    #[test]
    fn transport_sentinel_is_error() {
        let analyzer = BolaAnalyzer::default();
        let verdict = analyzer.analyze(
            &snapshot(200, "a"),
            &ResponseSnapshot::transport_failure(5),
            &case(),
        );
        assert_eq!(verdict.status, TestStatus::Error);
        assert_eq!(verdict.severity, Severity::Info);
    }

    #[test]
    fn unlisted_status_is_inconclusive() {
        let analyzer = BolaAnalyzer::default();
        let verdict = analyzer.analyze(&snapshot(200, "a"), &snapshot(418, ""), &case());
        assert_eq!(verdict.status, TestStatus::Inconclusive);
        assert_eq!(verdict.severity, Severity::Low);
    }
}
