//! Search settings model.
//!
//! The settings document is a YAML file with a `search_parameters` section
//! describing the sites, keywords and extraction schema, plus top-level
//! options for model selection and report criteria. Everything is read once
//! at startup and never mutated afterwards.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Number of results opened per site when `return_products_num` is unset.
pub const DEFAULT_TOP_COUNT: u32 = 5;

/// One target e-commerce site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteSpec {
    pub name: String,
    pub url: String,
}

/// Optional search refinements applied on a best-effort basis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchCondition {
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
}

/// How many reviews to collect per product.
///
/// Declared in the settings file as an integer: `0` skips reviews, `-1`
/// collects all of them, `N > 0` collects the top N highest-rated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum ReviewPolicy {
    #[default]
    Skip,
    All,
    Top(u32),
}

impl From<i64> for ReviewPolicy {
    fn from(n: i64) -> Self {
        match n {
            0 => ReviewPolicy::Skip,
            n if n < 0 => ReviewPolicy::All,
            n => ReviewPolicy::Top(n as u32),
        }
    }
}

/// Browser behavior flags forwarded to the agent instruction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowserSettings {
    #[serde(default)]
    pub use_vision: bool,
    #[serde(default)]
    pub visit_official_site: bool,
    #[serde(default)]
    pub reviews_per_product: ReviewPolicy,
}

/// The `search_parameters` section of the settings document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParameters {
    #[serde(default)]
    pub websites: Vec<SiteSpec>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Field name mapped to a human-readable description. Insertion order
    /// determines the output field order.
    #[serde(default, deserialize_with = "ordered_string_map")]
    pub result_items: Vec<(String, String)>,
    pub return_products_num: Option<u32>,
    pub search_condition: Option<SearchCondition>,
    pub browser_settings: Option<BrowserSettings>,
}

impl SearchParameters {
    /// The declared extraction schema, or the default three fields when the
    /// settings file declares none.
    pub fn result_schema(&self) -> Vec<(String, String)> {
        if self.result_items.is_empty() {
            default_result_items()
        } else {
            self.result_items.clone()
        }
    }

    /// Top-N count to open per site, defaulting to [`DEFAULT_TOP_COUNT`].
    pub fn top_count(&self) -> u32 {
        self.return_products_num.unwrap_or(DEFAULT_TOP_COUNT)
    }
}

/// Fields extracted per product when no schema is declared.
pub fn default_result_items() -> Vec<(String, String)> {
    vec![
        ("product_name".into(), "the product's display name".into()),
        ("price".into(), "the listed price as a number".into()),
        ("url".into(), "the product page URL".into()),
    ]
}

/// Top-level settings document.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search_parameters: SearchParameters,
    #[serde(default = "default_top_n")]
    pub top_n: u32,
    #[serde(default = "default_platform")]
    pub ai_platform: String,
    #[serde(default = "default_report_model")]
    pub report_model: String,
    #[serde(default = "default_search_model")]
    pub search_model: String,
    /// Arbitrary evaluation criteria forwarded to the report prompt,
    /// optionally containing a free-text `preferences` entry.
    #[serde(default)]
    pub criteria: serde_json::Map<String, serde_json::Value>,
}

fn default_top_n() -> u32 {
    5
}

fn default_platform() -> String {
    "openai".to_string()
}

fn default_report_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_search_model() -> String {
    "gpt-4o".to_string()
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings: Settings = serde_yaml::from_str(&text)?;
        if settings.search_parameters.websites.is_empty() {
            return Err(Error::Config(
                "search_parameters.websites must list at least one site".to_string(),
            ));
        }
        Ok(settings)
    }
}

/// Deserialize a YAML mapping into a Vec preserving insertion order.
fn ordered_string_map<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedMapVisitor;

    impl<'de> serde::de::Visitor<'de> for OrderedMapVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of field name to description")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, String>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedMapVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_SETTINGS: &str = r#"
search_parameters:
  websites:
    - name: Amazon
      url: https://www.amazon.co.jp/
    - name: Rakuten
      url: https://www.rakuten.co.jp/
  keywords:
    - motherboard
    - ATX
  result_items:
    product_name: the product's display name
    price: the listed price
    url: the product page URL
    m2_slot_num: number of M.2 slots
  return_products_num: 3
  search_condition:
    price_min: 5000
    price_max: 30000
    sort_by: price_asc
    filters:
      - in stock
  browser_settings:
    use_vision: true
    visit_official_site: true
    reviews_per_product: -1
top_n: 2
ai_platform: deepseek
report_model: deepseek-chat
search_model: deepseek-chat
criteria:
  price:
    weight: 0.5
  preferences: quiet operation matters most
"#;

    #[test]
    fn parses_full_settings() {
        let settings: Settings = serde_yaml::from_str(FULL_SETTINGS).unwrap();
        let params = &settings.search_parameters;

        assert_eq!(params.websites.len(), 2);
        assert_eq!(params.websites[0].name, "Amazon");
        assert_eq!(params.keywords, vec!["motherboard", "ATX"]);
        assert_eq!(params.return_products_num, Some(3));
        assert_eq!(settings.top_n, 2);
        assert_eq!(settings.ai_platform, "deepseek");

        let browser = params.browser_settings.as_ref().unwrap();
        assert!(browser.use_vision);
        assert_eq!(browser.reviews_per_product, ReviewPolicy::All);

        let condition = params.search_condition.as_ref().unwrap();
        assert_eq!(condition.price_min, Some(5000));
        assert_eq!(condition.filters, vec!["in stock"]);
    }

    #[test]
    fn result_items_preserve_declaration_order() {
        let settings: Settings = serde_yaml::from_str(FULL_SETTINGS).unwrap();
        let fields: Vec<&str> = settings
            .search_parameters
            .result_items
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(fields, vec!["product_name", "price", "url", "m2_slot_num"]);
    }

    #[test]
    fn defaults_apply_when_sections_missing() {
        let settings: Settings = serde_yaml::from_str(
            "search_parameters:\n  websites:\n    - name: A\n      url: https://a.example/\n",
        )
        .unwrap();

        assert_eq!(settings.top_n, 5);
        assert_eq!(settings.ai_platform, "openai");
        assert_eq!(settings.report_model, "gpt-4o-mini");
        assert_eq!(settings.search_model, "gpt-4o");
        assert!(settings.criteria.is_empty());
        assert_eq!(settings.search_parameters.top_count(), DEFAULT_TOP_COUNT);
    }

    #[test]
    fn empty_schema_falls_back_to_default_fields() {
        let params = SearchParameters::default();
        let schema = params.result_schema();
        let names: Vec<&str> = schema.iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"product_name"));
        assert!(names.contains(&"price"));
        assert!(names.contains(&"url"));
    }

    #[test]
    fn review_policy_from_count() {
        assert_eq!(ReviewPolicy::from(0), ReviewPolicy::Skip);
        assert_eq!(ReviewPolicy::from(-1), ReviewPolicy::All);
        assert_eq!(ReviewPolicy::from(3), ReviewPolicy::Top(3));
    }
}
