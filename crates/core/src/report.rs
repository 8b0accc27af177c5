//! Site-intelligence report returned by the model.
//!
//! [`AnalysisResult`] keeps the model's JSON document exactly as produced and
//! serializes back to it unchanged. [`SiteReport`] is a typed view over that
//! document: missing fields default, and a field whose JSON type differs from
//! the documented one reads as its default instead of failing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Analysis document for one site.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    document: Value,
    report: SiteReport,
}

impl AnalysisResult {
    pub fn new(document: Value) -> Self {
        let report = SiteReport::from_document(&document);
        Self { document, report }
    }

    /// The document as the model produced it.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Typed view of the documented fields.
    pub fn report(&self) -> &SiteReport {
        &self.report
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}

impl From<Value> for AnalysisResult {
    fn from(document: Value) -> Self {
        Self::new(document)
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AnalysisResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::new)
    }
}

/// Read a field, falling back to its default when the JSON does not fit `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Read a list of strings. A bare string counts as a one-item list and
/// non-string items are skipped.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Documented report fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteReport {
    #[serde(deserialize_with = "lenient")]
    pub site: SiteInfo,
    #[serde(deserialize_with = "string_list")]
    pub frameworks: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub libraries: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub analytics: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub tag_managers: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub cms: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub runtime: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub hosting: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub cdn: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub seo: Seo,
    #[serde(deserialize_with = "lenient")]
    pub performance: Performance,
    #[serde(deserialize_with = "lenient")]
    pub ads: Ads,
    #[serde(deserialize_with = "lenient")]
    pub monetization: Monetization,
    #[serde(deserialize_with = "lenient")]
    pub privacy_security: PrivacySecurity,
    #[serde(deserialize_with = "lenient")]
    pub audience: Audience,
    /// Entries may be names or objects, so they are kept as raw JSON.
    #[serde(deserialize_with = "lenient")]
    pub competitors: Vec<Value>,
    #[serde(deserialize_with = "lenient")]
    pub traffic_estimate: TrafficEstimate,
    #[serde(deserialize_with = "lenient")]
    pub contact: Contact,
    #[serde(deserialize_with = "string_list")]
    pub key_features: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub summary: String,
    #[serde(deserialize_with = "string_list")]
    pub recommendations: Vec<String>,
}

impl SiteReport {
    /// Typed view of `document`. Anything other than an object yields the
    /// empty report.
    pub fn from_document(document: &Value) -> Self {
        SiteReport::deserialize(document).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    #[serde(deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Seo {
    #[serde(deserialize_with = "lenient")]
    pub meta_title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub meta_description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub canonical: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub robots: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub open_graph: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub twitter_card: Option<bool>,
    #[serde(deserialize_with = "string_list")]
    pub structured_data: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub h1_count: Option<u32>,
    #[serde(deserialize_with = "string_list")]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Performance {
    #[serde(deserialize_with = "lenient")]
    pub script_count: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub stylesheet_count: Option<u32>,
    #[serde(deserialize_with = "string_list")]
    pub image_formats: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub lazy_loading: Option<bool>,
    #[serde(deserialize_with = "string_list")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Ads {
    #[serde(deserialize_with = "lenient")]
    pub present: Option<bool>,
    #[serde(deserialize_with = "string_list")]
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Monetization {
    #[serde(deserialize_with = "string_list")]
    pub models: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub payment_providers: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub affiliate_networks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrivacySecurity {
    #[serde(deserialize_with = "lenient")]
    pub cookie_banner: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub consent_platform: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub privacy_policy: Option<bool>,
    #[serde(deserialize_with = "string_list")]
    pub trackers: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub security_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Audience {
    #[serde(deserialize_with = "lenient")]
    pub target: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub regions: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub languages: Vec<String>,
}

/// How sure the model is about its traffic estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrafficEstimate {
    #[serde(deserialize_with = "lenient")]
    pub monthly_visits_range: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub confidence: Option<Confidence>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(deserialize_with = "string_list")]
    pub emails: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub phones: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub social: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub address: Option<String>,
}
