//! Instruction template for site analysis.
//!
//! [`build_prompt`] is a pure function of the address and page body. It
//! always yields exactly two messages: a fixed system persona and a user
//! instruction carrying the report schema, the extraction rules and the page
//! content between sentinel markers.

use serde::{Deserialize, Serialize};

use crate::fetch::NormalizedUrl;

/// Marker opening the embedded page content.
pub const CONTENT_START: &str = "-----BEGIN PAGE CONTENT-----";

/// Marker closing the embedded page content.
pub const CONTENT_END: &str = "-----END PAGE CONTENT-----";

pub const SYSTEM_INSTRUCTION: &str = "You are a senior web technology and digital marketing analyst. \
You inspect the raw HTML of a single web page and produce a site-intelligence report. \
Respond with JSON only: a single JSON object, no markdown, no code fences, no commentary.";

/// Literal description of the report the model must return.
pub const REPORT_SCHEMA: &str = r#"{
  "site": {
    "url": "string",
    "title": "string | null",
    "description": "string | null",
    "language": "string | null"
  },
  "frameworks": ["string"],
  "libraries": ["string"],
  "analytics": ["string"],
  "tag_managers": ["string"],
  "cms": "string | null",
  "runtime": "string | null",
  "hosting": "string | null",
  "cdn": "string | null",
  "seo": {
    "meta_title": "string | null",
    "meta_description": "string | null",
    "canonical": "string | null",
    "robots": "string | null",
    "open_graph": "boolean | null",
    "twitter_card": "boolean | null",
    "structured_data": ["string"],
    "h1_count": "integer | null",
    "issues": ["string"]
  },
  "performance": {
    "script_count": "integer | null",
    "stylesheet_count": "integer | null",
    "image_formats": ["string"],
    "lazy_loading": "boolean | null",
    "notes": ["string"]
  },
  "ads": {
    "present": "boolean | null",
    "networks": ["string"]
  },
  "monetization": {
    "models": ["string"],
    "payment_providers": ["string"],
    "affiliate_networks": ["string"]
  },
  "privacy_security": {
    "cookie_banner": "boolean | null",
    "consent_platform": "string | null",
    "privacy_policy": "boolean | null",
    "trackers": ["string"],
    "security_notes": ["string"]
  },
  "audience": {
    "target": "string | null",
    "regions": ["string"],
    "languages": ["string"]
  },
  "competitors": ["string"],
  "traffic_estimate": {
    "monthly_visits_range": "string | null",
    "confidence": "low | medium | high"
  },
  "contact": {
    "emails": ["string"],
    "phones": ["string"],
    "social": ["string"],
    "address": "string | null"
  },
  "key_features": ["string"],
  "summary": "string",
  "recommendations": ["string"]
}"#;

const RULES: &str = "Rules:\n\
- Use only evidence present in the provided page content. Do not guess from the domain name alone.\n\
- Deduplicate every array.\n\
- Use null for unknown scalar values and an empty array for unknown lists.\n\
- Output must be valid JSON with exactly the types shown in the schema.";

/// Speaker of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The two-message instruction sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    messages: [Message; 2],
}

impl Prompt {
    /// Messages in send order: system first, then user.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn user(&self) -> &Message {
        &self.messages[1]
    }
}

/// Build the analysis prompt for `url` and its page `content`.
pub fn build_prompt(url: &NormalizedUrl, content: &str) -> Prompt {
    let user = format!(
        "Analyze the website at {url} using the HTML below.\n\n\
         Return a JSON object with exactly this structure:\n{REPORT_SCHEMA}\n\n\
         {RULES}\n\n\
         {CONTENT_START}\n{content}\n{CONTENT_END}"
    );

    Prompt {
        messages: [
            Message { role: Role::System, content: SYSTEM_INSTRUCTION.to_string() },
            Message { role: Role::User, content: user },
        ],
    }
}
