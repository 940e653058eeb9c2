//! Report synthesis.
//!
//! Feeds the normalized product data plus the operator's evaluation criteria
//! to the report model and returns a Markdown narrative. Failures degrade to
//! a fixed sentinel string so the caller can still write a report file.

use serde_json::{json, Value};
use tracing::error;

use crate::extract::{strip_code_fences, ParseOutcome};
use crate::llm::ChatClient;

/// Returned in place of a report when synthesis fails.
pub const REPORT_FAILURE_SENTINEL: &str = "Report generation failed.";

const DEFAULT_PREFERENCES: &str = "prefer the cheapest option";

const REPORT_SYSTEM: &str = "You are a professional assistant that writes detailed, \
     easy-to-read Markdown reports from product data and evaluation criteria.";

/// Generate a Markdown report for the collected products.
///
/// Never raises: any synthesis error is logged and replaced by
/// [`REPORT_FAILURE_SENTINEL`].
pub async fn synthesize(
    products: &ParseOutcome,
    criteria: &serde_json::Map<String, Value>,
    client: &ChatClient,
) -> String {
    let prompt = build_prompt(products, criteria);
    match client.complete(REPORT_SYSTEM, &prompt).await {
        Ok(response) => post_process(&response),
        Err(err) => {
            error!(error = %err, platform = %client.platform(), model = client.model(),
                "report generation failed");
            REPORT_FAILURE_SENTINEL.to_string()
        }
    }
}

/// Assemble the single synthesis prompt.
///
/// Both outcome variants are representable: structured records are embedded
/// as a pretty-printed JSON document, raw text verbatim.
fn build_prompt(products: &ParseOutcome, criteria: &serde_json::Map<String, Value>) -> String {
    let products_text = match products {
        ParseOutcome::Structured(records) => {
            serde_json::to_string_pretty(&json!({ "results": records })).unwrap_or_default()
        }
        ParseOutcome::Unstructured(raw) => raw.clone(),
    };

    let mut criteria = criteria.clone();
    criteria
        .entry("preferences".to_string())
        .or_insert_with(|| Value::String(DEFAULT_PREFERENCES.to_string()));
    let criteria_text =
        serde_json::to_string_pretty(&Value::Object(criteria)).unwrap_or_default();

    format!(
        "Below is the product data collected from each e-commerce site, followed by the \
         evaluation criteria. Write a detailed, easy-to-read comparison report based on them.\n\n\
         [Product data]\n{products_text}\n\n\
         [Evaluation criteria]\n{criteria_text}\n\n\
         - For each evaluation criterion, explain the merits and drawbacks of the candidates.\n\
         - Make sure any custom criteria are reflected in the report.\n\
         - Compare the top items per site and call out their distinguishing features.\n\
         - Output Markdown only.\n\
         - Emit the Markdown as plain text with no surrounding code fences."
    )
}

/// Strip a fence the model wrapped around the report despite instructions.
fn post_process(response: &str) -> String {
    strip_code_fences(response.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_defaults_missing_preferences() {
        let criteria = serde_json::Map::new();
        let prompt = build_prompt(&ParseOutcome::Structured(Vec::new()), &criteria);
        assert!(prompt.contains(DEFAULT_PREFERENCES));
    }

    #[test]
    fn prompt_keeps_declared_preferences() {
        let mut criteria = serde_json::Map::new();
        criteria.insert(
            "preferences".to_string(),
            Value::String("quiet operation matters most".to_string()),
        );

        let prompt = build_prompt(&ParseOutcome::Structured(Vec::new()), &criteria);
        assert!(prompt.contains("quiet operation matters most"));
        assert!(!prompt.contains(DEFAULT_PREFERENCES));
    }

    #[test]
    fn prompt_embeds_structured_products_as_json() {
        let raw = r#"{"results":[{"product_name":"X","price":100,"url":"http://a"}]}"#;
        let outcome = crate::extract::normalize(
            raw,
            &crate::config::default_result_items(),
            crate::llm::Platform::OpenAi,
        );

        let prompt = build_prompt(&outcome, &serde_json::Map::new());
        assert!(prompt.contains("\"product_name\": \"X\""));
    }

    #[test]
    fn prompt_embeds_raw_fallback_verbatim() {
        let outcome = ParseOutcome::Unstructured("not json at all".to_string());
        let prompt = build_prompt(&outcome, &serde_json::Map::new());
        assert!(prompt.contains("not json at all"));
    }

    #[test]
    fn post_process_strips_only_boundary_fences() {
        assert_eq!(post_process("```markdown\n# Report\n```"), "# Report");
        assert_eq!(post_process("# Report\n\nplain"), "# Report\n\nplain");

        let internal = "# Report\n```\ncode\n```\nmore";
        assert_eq!(post_process(internal), internal);
    }
}
