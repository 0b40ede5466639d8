// Main CLI entry point for authprobe
//
// Reads normalized endpoint records produced by an external discovery
// stage, generates a test plan, persists it for audit, and executes it
// against the target through the safety gate and the rate-limited
// scheduler.

use anyhow::{Context, Result};
use authprobe::auth::AuthContext;
use authprobe::config::ScanConfig;
use authprobe::planner::{save_plan, TestPlanGenerator};
use authprobe::reporting::{export_csv, export_jsonl, export_markdown};
use authprobe::safety;
use authprobe::scheduler::ExecutionScheduler;
use authprobe::models::TestStatus;
use clap::{Arg, Command};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let matches = Command::new("authprobe")
        .version("1.0.0")
        .about("Active API authorization testing engine (BOLA/IDOR, auth bypass, JWT manipulation)")
        .after_help("EXAMPLES:\n  authprobe --endpoints endpoints.json --base-url http://localhost:3000 --auth-header 'Authorization: Bearer TOKEN'\n  authprobe -e endpoints.json -b http://api/ --unsafe --delay-ms 500\n\nOnly test APIs you own or have explicit permission to test.")
        .arg(Arg::new("endpoints")
            .short('e')
            .long("endpoints")
            .required(true)
            .num_args(1)
            .help("Path to a JSON file of normalized endpoint records"))
        .arg(Arg::new("base_url")
            .short('b')
            .long("base-url")
            .required(true)
            .num_args(1)
            .help("Base URL of the target API"))
        .arg(Arg::new("auth_header")
            .short('a')
            .long("auth-header")
            .num_args(1)
            .help("Auth header as 'Name: value', or a bare Authorization value"))
        .arg(Arg::new("unsafe")
            .long("unsafe")
            .action(clap::ArgAction::SetTrue)
            .help("Allow state-mutating requests (POST/PUT/PATCH/DELETE)"))
        .arg(Arg::new("delay_ms")
            .long("delay-ms")
            .num_args(1)
            .default_value("200")
            .help("Delay between test cases (ms)"))
        .arg(Arg::new("timeout_ms")
            .long("timeout-ms")
            .num_args(1)
            .default_value("8000")
            .help("Per-request timeout (ms)"))
        .arg(Arg::new("plan_out")
            .long("plan-out")
            .num_args(1)
            .default_value("plan.jsonl")
            .help("Where to persist the generated plan (JSONL)"))
        .arg(Arg::new("results_out")
            .long("results-out")
            .num_args(1)
            .default_value("tests.jsonl")
            .help("Where to persist results (JSONL)"))
        .arg(Arg::new("csv_report")
            .long("csv-report")
            .action(clap::ArgAction::SetTrue)
            .help("Also write a CSV summary"))
        .arg(Arg::new("markdown_report")
            .long("markdown-report")
            .action(clap::ArgAction::SetTrue)
            .help("Also write a Markdown summary"))
        .get_matches();

    let endpoints_path = matches
        .get_one::<String>("endpoints")
        .expect("endpoints is required");
    let base_url = matches
        .get_one::<String>("base_url")
        .expect("base_url is required");
    let auth_header = matches.get_one::<String>("auth_header").map(String::as_str);
    let delay_ms: u64 = matches
        .get_one::<String>("delay_ms")
        .and_then(|s| s.parse().ok())
        .context("--delay-ms must be an integer")?;
    let timeout_ms: u64 = matches
        .get_one::<String>("timeout_ms")
        .and_then(|s| s.parse().ok())
        .context("--timeout-ms must be an integer")?;

    let config = ScanConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        unsafe_enabled: matches.get_flag("unsafe"),
        delay_ms,
        timeout_ms,
    };
    let auth = AuthContext::from_header(auth_header);

    // Load the discovery stage's output; malformed records are skipped
    // one at a time rather than failing the run.
    let raw = fs::read_to_string(endpoints_path)
        .with_context(|| format!("failed to read {}", endpoints_path))?;
    let records: Vec<Value> =
        serde_json::from_str(&raw).context("endpoints file must be a JSON array")?;
    let endpoints = TestPlanGenerator::parse_endpoints(&records);
    info!(endpoints = endpoints.len(), "loaded endpoint records");

    let generator = TestPlanGenerator::new(&config, &auth);
    let plan = generator.create_plan(&endpoints);

    let plan_path = PathBuf::from(matches.get_one::<String>("plan_out").expect("has default"));
    save_plan(&plan, &plan_path)
        .with_context(|| format!("failed to write plan to {}", plan_path.display()))?;
    info!(cases = plan.len(), path = %plan_path.display(), "plan persisted");

    let filtered = safety::filter(plan, config.unsafe_enabled);
    if filtered.skipped > 0 {
        println!(
            "Skipped {} mutating test case(s); pass --unsafe to include them.",
            filtered.skipped
        );
    }

    let scheduler = ExecutionScheduler::new(&config);
    let results = scheduler.execute(&filtered.cases).await;

    let results_path = PathBuf::from(
        matches
            .get_one::<String>("results_out")
            .expect("has default"),
    );
    export_jsonl(&results, &results_path)
        .with_context(|| format!("failed to write results to {}", results_path.display()))?;

    if matches.get_flag("csv_report") {
        let filename = export_csv(&results)?;
        println!("CSV report written to {}", filename);
    }
    if matches.get_flag("markdown_report") {
        let filename = export_markdown(&results)?;
        println!("Markdown report written to {}", filename);
    }

    let vulnerable = results
        .iter()
        .filter(|r| r.status == TestStatus::Vulnerable)
        .count();
    let errors = results
        .iter()
        .filter(|r| r.status == TestStatus::Error)
        .count();
    println!(
        "Executed {} test(s): {} vulnerable, {} errors. Results in {}",
        results.len(),
        vulnerable,
        errors,
        results_path.display()
    );

    Ok(())
}
