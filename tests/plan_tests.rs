/// Integration tests for plan generation and plan persistence
use authprobe::auth::AuthContext;
use authprobe::config::ScanConfig;
use authprobe::models::{MutationType, TestCase, TestType};
use authprobe::planner::{save_plan, TestPlanGenerator};
use serde_json::json;
use std::fs;

fn sample_records() -> Vec<serde_json::Value> {
    vec![
        json!({
            "id": "ep-orders",
            "method": "GET",
            "path": "/api/orders/{order_id}",
            "path_template": "/api/orders/{order_id}",
            "id_parameters": [
                {"name": "order_id", "in": "path", "id_confidence": 0.9, "bola_testable": true}
            ],
            "auth_detected": true,
            "security_hints": ["bola_testable"]
        }),
        json!({
            "id": "ep-health",
            "method": "GET",
            "path": "/health",
            "auth_detected": false
        }),
        json!({
            "id": "ep-delete",
            "method": "DELETE",
            "path": "/api/orders/{order_id}",
            "id_parameters": [
                {"name": "order_id", "in": "path", "bola_testable": true}
            ],
            "auth_detected": true
        }),
    ]
}

#[test]
fn full_plan_from_raw_records() {
    let config = ScanConfig::new("http://localhost:3000");
    let auth = AuthContext::from_header(Some("Authorization: Bearer hdr.pay.sig"));
    let endpoints = TestPlanGenerator::parse_endpoints(&sample_records());
    assert_eq!(endpoints.len(), 3);

    let generator = TestPlanGenerator::new(&config, &auth);
    let plan = generator.create_plan(&endpoints);

    // ep-orders: 6 BOLA + 6 auth + 2 JWT. ep-health: credentials supplied,
    // so 6 auth + 2 JWT. ep-delete: same as ep-orders.
    assert_eq!(plan.len(), 14 + 8 + 14);

    // URLs are joined onto the base URL.
    assert!(plan
        .iter()
        .all(|c| c.url.starts_with("http://localhost:3000/")));

    // The unauthenticated endpoint still gets auth bypass cases because the
    // caller supplied credentials.
    let health_cases: Vec<&TestCase> = plan.iter().filter(|c| c.endpoint_id == "ep-health").collect();
    assert!(health_cases
        .iter()
        .all(|c| c.test_type != TestType::Bola));
}

#[test]
fn plan_is_reproducible_apart_from_ids() {
    let config = ScanConfig::new("http://localhost:3000");
    let auth = AuthContext::from_header(Some("Authorization: Bearer hdr.pay.sig"));
    let endpoints = TestPlanGenerator::parse_endpoints(&sample_records());
    let generator = TestPlanGenerator::new(&config, &auth);

    let plan_a = generator.create_plan(&endpoints);
    let plan_b = generator.create_plan(&endpoints);

    assert_eq!(plan_a.len(), plan_b.len());
    for (a, b) in plan_a.iter().zip(plan_b.iter()) {
        assert_eq!(a.test_name, b.test_name);
        assert_eq!(a.test_type, b.test_type);
        assert_eq!(a.url, b.url);
        assert_eq!(a.headers, b.headers);
    }
}

#[test]
fn increment_case_defers_value_to_execution() {
    let config = ScanConfig::new("http://localhost:3000");
    let auth = AuthContext::default();
    let endpoints = TestPlanGenerator::parse_endpoints(&sample_records());
    let generator = TestPlanGenerator::new(&config, &auth);
    let plan = generator.create_plan(&endpoints);

    let increment_cases: Vec<&TestCase> = plan
        .iter()
        .filter(|c| {
            c.parameter_mutations
                .first()
                .map(|m| m.mutation_type == MutationType::Increment)
                .unwrap_or(false)
        })
        .collect();
    assert!(!increment_cases.is_empty());
    assert!(increment_cases
        .iter()
        .all(|c| c.parameter_mutations[0].test_value.is_none()));
}

#[test]
fn saved_plan_round_trips_through_jsonl() {
    let config = ScanConfig::new("http://localhost:3000");
    let auth = AuthContext::from_header(Some("Authorization: Bearer hdr.pay.sig"));
    let endpoints = TestPlanGenerator::parse_endpoints(&sample_records());
    let generator = TestPlanGenerator::new(&config, &auth);
    let plan = generator.create_plan(&endpoints);

    let path = std::env::temp_dir().join(format!("authprobe_plan_{}.jsonl", std::process::id()));
    save_plan(&plan, &path).expect("plan save should succeed");

    let content = fs::read_to_string(&path).expect("plan file should be readable");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), plan.len());

    for (line, case) in lines.iter().zip(plan.iter()) {
        let parsed: TestCase = serde_json::from_str(line).expect("each line is one TestCase");
        assert_eq!(parsed.id, case.id);
        assert_eq!(parsed.test_type, case.test_type);
        assert_eq!(parsed.url, case.url);
    }

    let _ = fs::remove_file(&path);
}
