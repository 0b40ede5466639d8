// Safety gate for authprobe
//
// Mutating requests against a live target are held back unless the caller
// explicitly enabled unsafe mode. The skipped count is surfaced so the
// reporting layer can show what was withheld.

use crate::models::TestCase;
use tracing::{info, warn};

/// Result of filtering a plan: the cases allowed to run plus how many were
/// withheld.
pub struct FilteredPlan {
    pub cases: Vec<TestCase>,
    pub skipped: usize,
}

/// Drop every test case whose method can mutate server state unless
/// `unsafe_enabled` is set.
pub fn filter(plan: Vec<TestCase>, unsafe_enabled: bool) -> FilteredPlan {
    let total = plan.len();
    let cases: Vec<TestCase> = plan
        .into_iter()
        .filter(|case| {
            if case.safety.mutating && !unsafe_enabled {
                warn!(test_name = %case.test_name, method = %case.method,
                    "skipping mutating test (enable --unsafe to run it)");
                false
            } else {
                true
            }
        })
        .collect();

    let skipped = total - cases.len();
    if skipped > 0 {
        info!(skipped, allowed = cases.len(), "safety gate withheld mutating cases");
    }
    FilteredPlan { cases, skipped }
}
