//! Task-instruction compiler.
//!
//! Turns the declarative search parameters into the numbered natural-language
//! checklist handed to the browsing agent. Pure and deterministic: the same
//! parameters always compile to the same instruction, and no I/O happens
//! here.

use crate::config::{BrowserSettings, ReviewPolicy, SearchCondition, SearchParameters, SiteSpec};

const NEXT_SITE_STEP: &str =
    "Close each product tab once its fields are captured, then move on to the next site.";

const FINAL_OUTPUT_STEP: &str = "After all sites are processed, output exactly one JSON document \
     aggregating every site's products. Do not add any prose before or after the JSON, even if \
     some refinements could not be applied.";

/// Compile the search parameters into an agent task instruction.
pub fn compile_task(params: &SearchParameters) -> String {
    let schema = params.result_schema();

    let mut steps = vec![sites_step(&params.websites), search_step(&params.keywords)];
    if let Some(step) = params.search_condition.as_ref().and_then(condition_step) {
        steps.push(step);
    }
    steps.push(open_tabs_step(params.top_count()));
    steps.push(extraction_step(&schema, params.browser_settings.as_ref()));
    steps.push(schema_step(&schema));
    steps.push(NEXT_SITE_STEP.to_string());
    steps.push(FINAL_OUTPUT_STEP.to_string());

    let mut task = String::from("Follow the steps below in order.\n");
    for (i, step) in steps.iter().enumerate() {
        task.push_str(&format!("{}. {}\n", i + 1, step));
    }
    task
}

/// Step 1: site enumeration, in declaration order.
fn sites_step(sites: &[SiteSpec]) -> String {
    let mut step = String::from(
        "Visit each of the following sites from top to bottom. Dismiss any interstitial or \
         modal advertisement before continuing.\n   Target sites:",
    );
    for site in sites {
        step.push_str(&format!("\n   - {} (URL: {})", site.name, site.url));
    }
    step
}

/// Step 2: one search per site with all keywords joined by a single space.
fn search_step(keywords: &[String]) -> String {
    format!(
        "On each site, perform one search using the space-separated keyword string \
         ({}). Do not search for the keywords individually.",
        keywords.join(" ")
    )
}

/// Optional step: best-effort search refinements.
///
/// Returns `None` when the condition declares nothing, so the step (and its
/// number) is omitted entirely.
fn condition_step(condition: &SearchCondition) -> Option<String> {
    let mut refinements = Vec::new();
    if let Some(min) = condition.price_min {
        refinements.push(format!("a minimum price of {min}"));
    }
    if let Some(max) = condition.price_max {
        refinements.push(format!("a maximum price of {max}"));
    }
    if let Some(sort) = &condition.sort_by {
        refinements.push(format!("the sort order \"{sort}\""));
    }
    if !condition.filters.is_empty() {
        refinements.push(format!("these filters: {}", condition.filters.join(", ")));
    }
    if refinements.is_empty() {
        return None;
    }
    Some(format!(
        "Where the site supports them, apply {}. If a refinement cannot be applied, continue \
         with the best available results instead of aborting.",
        refinements.join("; ")
    ))
}

/// Step: open the top results in new tabs via realistic interaction.
fn open_tabs_step(top_count: u32) -> String {
    format!(
        "Open each of the top {top_count} search results in a new tab by clicking the listing \
         the way a user would, not by navigating to extracted links directly."
    )
}

/// Step: per-product field extraction, with conditional review and
/// manufacturer-site clauses.
fn extraction_step(schema: &[(String, String)], browser: Option<&BrowserSettings>) -> String {
    let names: Vec<&str> = schema.iter().map(|(name, _)| name.as_str()).collect();
    let mut step = format!(
        "In each product tab, extract only these fields: {}.",
        names.join(", ")
    );

    if let Some(browser) = browser {
        match browser.reviews_per_product {
            ReviewPolicy::Skip => {}
            ReviewPolicy::All => {
                step.push_str(" Also collect all reviews for each product.");
            }
            ReviewPolicy::Top(n) => {
                step.push_str(&format!(
                    " Also collect the top {n} highest-rated reviews for each product."
                ));
            }
        }
        if browser.visit_official_site {
            step.push_str(
                "\n   Then traverse to the manufacturer's official page for each product:\
                 \n   a. Locate a manufacturer link on the product page, or search for the \
                 manufacturer's official page.\
                 \n   b. Open the manufacturer's page for this product.\
                 \n   c. Extract the specification and feature text published there.\
                 \n   d. Record the manufacturer page address.",
            );
        }
    }
    step
}

/// Step: the exact JSON shape the agent must emit, with field semantics.
fn schema_step(schema: &[(String, String)]) -> String {
    let mut step = String::from(
        "Return the extracted data using exactly this JSON shape, where each value follows \
         its description:\n   {\n     \"results\": [\n       {\n",
    );
    let fields: Vec<String> = schema
        .iter()
        .map(|(name, description)| format!("         \"{name}\": <{description}>"))
        .collect();
    step.push_str(&fields.join(",\n"));
    step.push_str("\n       }\n     ]\n   }");
    step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_site_params() -> SearchParameters {
        SearchParameters {
            websites: vec![
                SiteSpec {
                    name: "Amazon".to_string(),
                    url: "https://www.amazon.co.jp/".to_string(),
                },
                SiteSpec {
                    name: "Rakuten".to_string(),
                    url: "https://www.rakuten.co.jp/".to_string(),
                },
            ],
            keywords: vec!["motherboard".to_string(), "ATX".to_string()],
            ..Default::default()
        }
    }

    fn count_occurrences(haystack: &str, needle: &str) -> usize {
        haystack.match_indices(needle).count()
    }

    #[test]
    fn declared_fields_appear_once_per_block() {
        let schema = vec![
            ("product_name".to_string(), "the display name".to_string()),
            ("price".to_string(), "the listed amount".to_string()),
            ("m2_slot_num".to_string(), "number of M.2 slots".to_string()),
        ];

        let extraction = extraction_step(&schema, None);
        let shape = schema_step(&schema);
        for (name, _) in &schema {
            assert_eq!(count_occurrences(&extraction, name), 1, "{name} in extraction step");
            assert_eq!(count_occurrences(&shape, name), 1, "{name} in schema step");
        }
    }

    #[test]
    fn empty_keywords_still_compile() {
        let mut params = two_site_params();
        params.keywords.clear();

        let task = compile_task(&params);
        assert!(task.contains("space-separated keyword string ()"));
    }

    #[test]
    fn two_sites_top_one_scenario() {
        let mut params = two_site_params();
        params.return_products_num = Some(1);

        let task = compile_task(&params);
        let site_lines = task.lines().filter(|l| l.contains("(URL: ")).count();
        assert_eq!(site_lines, 2);
        assert!(task.contains("top 1 search results"));
    }

    #[test]
    fn sites_listed_in_declaration_order() {
        let task = compile_task(&two_site_params());
        let amazon = task.find("Amazon (URL:").unwrap();
        let rakuten = task.find("Rakuten (URL:").unwrap();
        assert!(amazon < rakuten);
    }

    #[test]
    fn review_policy_controls_review_clause() {
        let mut params = two_site_params();

        params.browser_settings = Some(BrowserSettings {
            reviews_per_product: ReviewPolicy::Skip,
            ..Default::default()
        });
        assert!(!compile_task(&params).contains("review"));

        params.browser_settings = Some(BrowserSettings {
            reviews_per_product: ReviewPolicy::All,
            ..Default::default()
        });
        assert!(compile_task(&params).contains("all reviews"));

        params.browser_settings = Some(BrowserSettings {
            reviews_per_product: ReviewPolicy::Top(3),
            ..Default::default()
        });
        assert!(compile_task(&params).contains("top 3 highest-rated reviews"));
    }

    #[test]
    fn official_site_traversal_has_four_sub_steps() {
        let mut params = two_site_params();
        params.browser_settings = Some(BrowserSettings {
            visit_official_site: true,
            ..Default::default()
        });

        let task = compile_task(&params);
        for marker in ["   a. ", "   b. ", "   c. ", "   d. "] {
            assert!(task.contains(marker), "missing sub-step {marker:?}");
        }
    }

    #[test]
    fn absent_browser_settings_omit_conditional_clauses() {
        let task = compile_task(&two_site_params());
        assert!(!task.contains("review"));
        assert!(!task.contains("manufacturer"));
    }

    #[test]
    fn empty_condition_omits_the_refinement_step() {
        let mut params = two_site_params();
        params.search_condition = Some(SearchCondition::default());

        let task = compile_task(&params);
        assert!(!task.contains("Where the site supports them"));
    }

    #[test]
    fn condition_step_lists_declared_refinements() {
        let mut params = two_site_params();
        params.search_condition = Some(SearchCondition {
            price_min: Some(5000),
            price_max: Some(30000),
            sort_by: Some("price_asc".to_string()),
            filters: vec!["in stock".to_string()],
        });

        let task = compile_task(&params);
        assert!(task.contains("minimum price of 5000"));
        assert!(task.contains("maximum price of 30000"));
        assert!(task.contains("\"price_asc\""));
        assert!(task.contains("in stock"));
        assert!(task.contains("best available results"));
    }

    #[test]
    fn final_step_demands_a_single_json_document() {
        let task = compile_task(&two_site_params());
        assert!(task.contains("exactly one JSON document"));
        assert!(task.trim_end().ends_with("could not be applied."));
    }

    #[test]
    fn compilation_is_deterministic() {
        let params = two_site_params();
        assert_eq!(compile_task(&params), compile_task(&params));
    }
}
