//! Tool model matching the frontend Tool interface.

use serde::{Deserialize, Serialize};

/// Pricing tier of a catalog listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Pricing {
    Free,
    Paid,
    Freemium,
}

impl Pricing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pricing::Free => "free",
            Pricing::Paid => "paid",
            Pricing::Freemium => "freemium",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Pricing::Free),
            "paid" => Some(Pricing::Paid),
            "freemium" => Some(Pricing::Freemium),
            _ => None,
        }
    }
}

/// A user review nested inside a tool document.
///
/// Reviews are owned entirely by their parent tool and are read-only here:
/// there is no review-submission flow in the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub user_name: String,
    pub rating: f64,
    pub comment: String,
    pub date: String,
}

/// A catalog listing for one AI tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,
    pub name: String,
    /// URL-safe identifier, unique across all tools.
    pub slug: String,
    pub description: String,
    pub category: String,
    pub pricing: Pricing,
    pub rating: f64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    pub logo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_url: Option<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateToolRequest {
    pub name: String,
    /// When omitted or empty, the slug is derived from the name.
    #[serde(default)]
    pub slug: Option<String>,
    pub description: String,
    pub category: String,
    pub pricing: Pricing,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub official_url: Option<String>,
}

/// Request body for updating an existing tool. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateToolRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub pricing: Option<Pricing>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub screenshots: Option<Vec<String>>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub official_url: Option<String>,
}

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, strips everything outside `[a-z0-9\s-]`, collapses whitespace
/// runs and repeated hyphens to a single hyphen, and trims hyphens at both
/// ends. Idempotent: `slugify(slugify(x)) == slugify(x)`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
        // Anything else is stripped without breaking the current word
    }

    out
}

/// Drop empty and whitespace-only entries from a feature list.
pub fn sanitize_features(features: &[String]) -> Vec<String> {
    features
        .iter()
        .filter(|f| !f.trim().is_empty())
        .cloned()
        .collect()
}
