//! Tag and brand display names
//!
//! Content is tagged with short kebab-case slugs. The tables below map the
//! well-known slugs to their display names; anything else is title-cased.

use std::collections::BTreeSet;

/// Id of the comma separated free-text tags field of the content forms
pub const TAGS_FIELD: &str = "tags";

/// Brand slugs whose display name is not a plain title-case of the slug
pub const BRAND_NAMES: &[(&str, &str)] = &[
    ("aws", "AWS"),
    ("azure", "Microsoft Azure"),
    ("gcp", "Google Cloud"),
    ("github", "GitHub"),
    ("gitlab", "GitLab"),
    ("hubspot", "HubSpot"),
    ("linkedin", "LinkedIn"),
    ("openai", "OpenAI"),
    ("postgresql", "PostgreSQL"),
    ("salesforce", "Salesforce"),
    ("sap", "SAP"),
    ("servicenow", "ServiceNow"),
    ("youtube", "YouTube"),
];

/// Topic tags with fixed display names
pub const TAG_NAMES: &[(&str, &str)] = &[
    ("ai", "AI"),
    ("api", "API"),
    ("b2b", "B2B"),
    ("ci-cd", "CI/CD"),
    ("crm", "CRM"),
    ("devops", "DevOps"),
    ("e-commerce", "E-Commerce"),
    ("erp", "ERP"),
    ("iot", "IoT"),
    ("ml", "Machine Learning"),
    ("saas", "SaaS"),
    ("seo", "SEO"),
    ("ui-ux", "UI/UX"),
];

fn lookup(table: &[(&str, &'static str)], slug: &str) -> Option<&'static str> {
    table
        .binary_search_by(|(key, _)| (*key).cmp(slug))
        .ok()
        .map(|i| table[i].1)
}

/// Display name of a brand or tag slug.
///
/// Brands win over tags; unknown slugs are title-cased word by word.
pub fn display_name(slug: &str) -> String {
    let slug = normalize_tag(slug);
    if let Some(name) = lookup(BRAND_NAMES, &slug).or_else(|| lookup(TAG_NAMES, &slug)) {
        return name.to_string();
    }
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Canonical slug of a tag: lowercase, words joined by single dashes
pub fn normalize_tag(tag: &str) -> String {
    slugify(tag)
}

/// URL slug of arbitrary text.
///
/// Keeps ASCII alphanumerics, maps everything else to `-`, collapses
/// repeated dashes and trims them from both ends.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Parse a comma separated tag list into unique normalized slugs, in order
pub fn parse_tag_list(input: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    input
        .split(',')
        .map(normalize_tag)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
