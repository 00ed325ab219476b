//
//  test_cases.rs
//  Blast
//
//  Created by hak (tharun)
//

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A suggested manual or automated test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
    pub expected_result: String,
}

fn section(pattern: &'static str, cell: &'static OnceLock<Regex>, text: &str) -> Option<String> {
    let re = cell.get_or_init(|| Regex::new(pattern).expect("section pattern must compile"));
    let body = re.captures(text)?.get(1)?.as_str().trim();
    (!body.is_empty()).then(|| body.to_string())
}

static SUGGESTIONS: OnceLock<Regex> = OnceLock::new();
static FOCUS: OnceLock<Regex> = OnceLock::new();

/// Derive test cases from impact-analysis prose.
///
/// A "Test suggestions" section wins over a "Test focus" section; with
/// neither, a single basic-function case is returned.
pub fn extract_test_cases(impact: &str) -> Vec<TestCase> {
    if let Some(suggestions) = section(
        r"(?is)test suggestions[ \t]*[:：]?[ \t]*(.*?)(?:\n##|$)",
        &SUGGESTIONS,
        impact,
    ) {
        return vec![TestCase {
            name: "Suggested test".to_string(),
            description: format!("From impact analysis: {suggestions}"),
            steps: steps(&[
                "Prepare the environment the suggestions describe",
                "Run the test operations",
                "Verify the results",
            ]),
            expected_result: "Tests pass with no anomalies".to_string(),
        }];
    }

    if let Some(focus) = section(r"(?is)test focus[ \t]*[:：]?[ \t]*(.*?)(?:\n##|$)", &FOCUS, impact) {
        return vec![TestCase {
            name: "Focused test".to_string(),
            description: format!("Test focus: {focus}"),
            steps: steps(&[
                "Prepare the focus scenario",
                "Run the test",
                "Verify the key behavior",
            ]),
            expected_result: "Key behavior works as before".to_string(),
        }];
    }

    vec![TestCase {
        name: "Basic function test".to_string(),
        description: "Check that the basic behavior of the code still works".to_string(),
        steps: steps(&["Run the code", "Observe the result", "Compare with expectations"]),
        expected_result: "Runs normally with no errors".to_string(),
    }]
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
