//! Built-in form definitions for the CMS content types
//!
//! Each preset is an ordinary [`FormConfig`]; `formwright presets export`
//! writes them out as JSON so they can be edited and loaded back.

use serde_json::json;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::config::{FormConfig, FormStep};
use crate::error::Result;
use crate::field::{Condition, FormField, ItemsSpec, SelectOption};
use crate::tags::TAGS_FIELD;
use crate::types::{ColumnSpan, InputType};
use crate::value::FormValue;

const SLUG_PATTERN: &str = "^[a-z0-9]+(-[a-z0-9]+)*$";
const IMAGE_TYPES: &[&str] = &["image/*"];
const DOCUMENT_TYPES: &[&str] = &[".pdf", ".docx", ".pptx"];

/// Content types with a built-in form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Preset {
    Product,
    Post,
    Resource,
    Solution,
    Industry,
}

impl Preset {
    /// Every preset name, for listings
    pub fn names() -> Vec<String> {
        Self::iter().map(|p| p.to_string()).collect()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Product => "Product page with features, pricing and media",
            Self::Post => "Blog post with author, body and SEO",
            Self::Resource => "Downloadable resource (whitepaper, case study, webinar)",
            Self::Solution => "Solution page with benefits and linked products",
            Self::Industry => "Industry landing page with challenges and stats",
        }
    }

    /// Build the form definition
    pub fn config(&self) -> Result<FormConfig> {
        match self {
            Self::Product => product(),
            Self::Post => post(),
            Self::Resource => resource(),
            Self::Solution => solution(),
            Self::Industry => industry(),
        }
    }
}

fn status_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("draft", "Draft"),
        SelectOption::new("published", "Published"),
        SelectOption::new("archived", "Archived"),
    ]
}

fn icon_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("bolt", "Bolt"),
        SelectOption::new("shield", "Shield"),
        SelectOption::new("chart", "Chart"),
        SelectOption::new("cloud", "Cloud"),
        SelectOption::new("users", "Users"),
        SelectOption::new("gear", "Gear"),
    ]
}

fn slug_field() -> Result<FormField> {
    FormField::input("slug", "Slug")
        .required()
        .max_length(80)
        .span(ColumnSpan::Half)
        .placeholder("my-page")
        .help("Lowercase words separated by dashes")
        .pattern(SLUG_PATTERN, "Slug may only contain lowercase letters, digits and dashes")
}

/// SEO fields shared by every content type, stored under `seo.*`
fn seo_step() -> FormStep {
    FormStep::new(
        "seo",
        "SEO",
        vec![
            FormField::input("seo.title", "SEO title").max_length(60),
            FormField::textarea("seo.description", "Meta description").max_length(160),
            FormField::input("seo.keywords", "Keywords").help("Comma separated"),
            FormField::file("seo.og_image", "Social image", IMAGE_TYPES, false),
        ],
    )
    .subtitle("Search and social previews")
}

fn publish_step() -> FormStep {
    FormStep::new(
        "publish",
        "Publish",
        vec![
            FormField::select("status", "Status", status_options()).default_value("draft"),
            FormField::typed_input("publish_date", "Publish date", InputType::Date)
                .shown_when("status", Condition::Equals("published".into())),
            FormField::input(TAGS_FIELD, "Tags").help("Comma separated, e.g. ai, saas"),
        ],
    )
}

fn product() -> Result<FormConfig> {
    let basics = FormStep::new(
        "basics",
        "Basics",
        vec![
            FormField::input("name", "Product name")
                .required()
                .min_length(2)
                .max_length(100)
                .span(ColumnSpan::Half),
            slug_field()?,
            FormField::input("tagline", "Tagline").max_length(120),
            FormField::rich_text("description", "Description").required().min_length(20),
            FormField::select(
                "category",
                "Category",
                SelectOption::plain(&["platform", "integration", "add-on", "service"]),
            )
            .required(),
        ],
    );

    let features = FormStep::new(
        "features",
        "Features",
        vec![FormField::custom_array(
            "features",
            "Features",
            ItemsSpec::new(vec![
                FormField::input("title", "Title").required().max_length(60),
                FormField::textarea("description", "Description").max_length(300),
                FormField::icon_select("icon", "Icon", icon_options()),
            ])
            .bounds(1, Some(12))
            .item_label("Feature"),
        )],
    );

    let pricing = FormStep::new(
        "pricing",
        "Pricing",
        vec![
            FormField::select(
                "pricing.model",
                "Pricing model",
                vec![
                    SelectOption::new("free", "Free"),
                    SelectOption::new("subscription", "Subscription"),
                    SelectOption::new("quote", "Contact sales"),
                ],
            )
            .required(),
            FormField::typed_input("pricing.amount", "Monthly price", InputType::Number)
                .required()
                .span(ColumnSpan::Third)
                .shown_when("pricing.model", Condition::Equals("subscription".into())),
            FormField::typed_input("pricing.contact_url", "Contact URL", InputType::Url)
                .shown_when("pricing.model", Condition::Equals("quote".into())),
        ],
    );

    let media = FormStep::new(
        "media",
        "Media",
        vec![
            FormField::file("hero_image", "Hero image", IMAGE_TYPES, false).required(),
            FormField::file("gallery", "Gallery", IMAGE_TYPES, true).max_length(8),
            FormField::file("datasheet", "Datasheet", &[".pdf"], false),
        ],
    );

    Ok(FormConfig::new(
        "product",
        "Product",
        vec![basics, features, pricing, media, seo_step(), publish_step()],
    )
    .description(Preset::Product.description())
    .initial_data(json!({ "status": "draft", "features": [] })))
}

fn post() -> Result<FormConfig> {
    let content = FormStep::new(
        "content",
        "Content",
        vec![
            FormField::input("title", "Title").required().max_length(120),
            slug_field()?,
            FormField::textarea("excerpt", "Excerpt").max_length(300),
            FormField::rich_text("body", "Body").required().min_length(50),
            FormField::file("cover_image", "Cover image", IMAGE_TYPES, false),
        ],
    );

    let author = FormStep::new(
        "author",
        "Author",
        vec![
            FormField::input("author.name", "Author name").required().span(ColumnSpan::Half),
            FormField::typed_input("author.email", "Author email", InputType::Email)
                .span(ColumnSpan::Half)
                .pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$", "Enter a valid email address")?,
            FormField::multi_select(
                "categories",
                "Categories",
                SelectOption::plain(&["engineering", "product", "company", "customers"]),
            )
            .required(),
        ],
    );

    Ok(FormConfig::new("post", "Blog post", vec![content, author, seo_step(), publish_step()])
        .description(Preset::Post.description()))
}

fn resource() -> Result<FormConfig> {
    let details = FormStep::new(
        "details",
        "Details",
        vec![
            FormField::input("title", "Title").required(),
            slug_field()?,
            FormField::select(
                "resource_type",
                "Resource type",
                vec![
                    SelectOption::new("whitepaper", "Whitepaper"),
                    SelectOption::new("case-study", "Case study"),
                    SelectOption::new("webinar", "Webinar"),
                    SelectOption::new("ebook", "E-book"),
                ],
            )
            .required(),
            FormField::textarea("summary", "Summary").required().max_length(500),
        ],
    );

    let asset = FormStep::new(
        "asset",
        "Asset",
        vec![
            FormField::file("document", "Document", DOCUMENT_TYPES, false)
                .required()
                .shown_when(
                    "resource_type",
                    Condition::OneOf(vec!["whitepaper".into(), "case-study".into(), "ebook".into()]),
                ),
            FormField::typed_input("video_url", "Recording URL", InputType::Url)
                .required()
                .shown_when("resource_type", Condition::Equals("webinar".into())),
            FormField::file("thumbnail", "Thumbnail", IMAGE_TYPES, false),
            FormField::select(
                "gated",
                "Access",
                vec![SelectOption::new("open", "Open"), SelectOption::new("gated", "Email required")],
            )
            .default_value("open"),
            FormField::custom_component("form_embed", "Lead form", "hubspot-form")
                .shown_when("gated", Condition::Equals("gated".into())),
        ],
    );

    Ok(FormConfig::new("resource", "Resource", vec![details, asset, seo_step(), publish_step()])
        .description(Preset::Resource.description()))
}

fn solution() -> Result<FormConfig> {
    let overview = FormStep::new(
        "overview",
        "Overview",
        vec![
            FormField::input("name", "Solution name").required(),
            slug_field()?,
            FormField::rich_text("overview", "Overview").required(),
            FormField::icon_select("icon", "Icon", icon_options()),
        ],
    );

    let benefits = FormStep::new(
        "benefits",
        "Benefits",
        vec![
            FormField::dynamic_section(
                "benefits",
                "Benefits",
                ItemsSpec::new(vec![
                    FormField::input("headline", "Headline").required(),
                    FormField::textarea("detail", "Detail"),
                    FormField::select(
                        "proof",
                        "Proof point",
                        SelectOption::plain(&["none", "metric", "quote"]),
                    )
                    .default_value("none"),
                    FormField::input("metric", "Metric")
                        .shown_when("proof", Condition::Equals("metric".into())),
                    FormField::textarea("quote", "Quote")
                        .shown_when("proof", Condition::Equals("quote".into())),
                ])
                .bounds(2, Some(6))
                .item_label("Benefit"),
            ),
            FormField::input("related_products", "Related products").help("Comma separated slugs"),
        ],
    );

    Ok(FormConfig::new("solution", "Solution", vec![overview, benefits, seo_step(), publish_step()])
        .description(Preset::Solution.description()))
}

fn industry() -> Result<FormConfig> {
    let overview = FormStep::new(
        "overview",
        "Overview",
        vec![
            FormField::input("name", "Industry").required(),
            slug_field()?,
            FormField::textarea("intro", "Introduction").required().min_length(40),
            FormField::file("hero_image", "Hero image", IMAGE_TYPES, false),
        ],
    );

    let challenges = FormStep::new(
        "challenges",
        "Challenges",
        vec![
            FormField::custom_array(
                "challenges",
                "Challenges",
                ItemsSpec::new(vec![
                    FormField::input("title", "Title").required(),
                    FormField::textarea("description", "Description"),
                ])
                .bounds(0, Some(5))
                .item_label("Challenge"),
            ),
            FormField::custom_array(
                "stats",
                "Stats",
                ItemsSpec::new(vec![
                    FormField::input("value", "Value").required().compact().span(ColumnSpan::Third),
                    FormField::input("label", "Label").required(),
                ])
                .bounds(0, Some(4))
                .item_label("Stat"),
            ),
        ],
    );

    Ok(FormConfig::new("industry", "Industry", vec![overview, challenges, seo_step(), publish_step()])
        .description(Preset::Industry.description())
        .initial_data(FormValue::from(json!({ "challenges": [], "stats": [] }))))
}
