//! Contract-export schema variants and the dataset-level validator.
//!
//! The licensing team has shipped two incompatible generations of the CSV
//! export. Rather than hard-coding column-name literals throughout the app,
//! each generation is described by a [`ContractSchema`] configuration object
//! mapping source columns to semantic roles. Custom variants can be supplied
//! through the config file.

use serde::{Deserialize, Serialize};

use crate::record::RawRecord;

/// Separator used when concatenating the three rights-grant part columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSeparator {
    #[default]
    Space,
    LineBreak,
}

impl GrantSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantSeparator::Space => " ",
            GrantSeparator::LineBreak => "\n",
        }
    }
}

/// Paired-column merge convention for the AI-assisted export generation.
///
/// Each category arrives as two sibling columns (`<category><output_suffix>`
/// and `<category><rationale_suffix>`) that are merged into a single display
/// field named after the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedFields {
    pub categories: Vec<String>,
    pub output_suffix: String,
    pub rationale_suffix: String,
}

impl PairedFields {
    pub fn output_column(&self, category: &str) -> String {
        format!("{}{}", category, self.output_suffix)
    }

    pub fn rationale_column(&self, category: &str) -> String {
        format!("{}{}", category, self.rationale_suffix)
    }

    /// Whether `field` is one half of a pair (and therefore hidden from the
    /// detail panel in favor of the merged display field).
    pub fn is_pair_member(&self, field: &str) -> bool {
        self.categories.iter().any(|c| {
            field == self.output_column(c) || field == self.rationale_column(c)
        })
    }
}

/// Maps the source columns of one export generation to semantic roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSchema {
    pub name: String,
    /// Columns coerced to dates during normalization.
    pub date_fields: Vec<String>,
    /// The date column shown in the grid's Date column.
    pub agreement_date_field: String,
    pub signature_field: String,
    pub recommendation_field: String,
    pub isbn_field: String,
    pub link_field: String,
    pub signatory_name_field: String,
    pub signatory_location_field: String,
    pub rationale_field: String,
    /// Assignment type, exclusivity, revocability, in concatenation order.
    pub grant_fields: [String; 3],
    pub grant_separator: GrantSeparator,
    pub governing_law_field: String,
    pub term_field: String,
    pub amendments_field: String,
    pub amendment_summary_field: Option<String>,
    pub paired: Option<PairedFields>,
    /// Fields that must carry a value in at least one row for the dataset to
    /// be accepted.
    pub required_fields: Vec<String>,
    /// Fields indexed for fuzzy search.
    pub searchable_fields: Vec<String>,
}

/// Virtual field name resolving to the cleaned-up rights-grant concatenation.
pub const RIGHTS_GRANT: &str = "Rights Grant";
/// Virtual field name resolving to the signed-status classification.
pub const SIGNED: &str = "Signed";
/// Virtual field name resolving to the recommendation classification.
pub const RECOMMENDATION: &str = "Recommendation";

impl ContractSchema {
    /// The original export layout, column names verbatim from the source
    /// files.
    pub fn classic() -> Self {
        let grant_fields = [
            r#"Type of Rights Grant, Part 1 ("copyright assignment", "copyright transfer or license", "other")"#
                .to_string(),
            r#"Type of Rights Grant, Part 2: "Exclusive" or "Non-Exclusive" or Silent"#.to_string(),
            r#"Type of Rights Grant, Part 3: "Revocable" or "Irrevocable" or Silent"#.to_string(),
        ];
        let governing_law = "Governing Law (Country or State only)".to_string();
        let term =
            r#"Term of Agreement ("Full Term of Copyright", or Language if "Other")"#.to_string();
        let required_fields = vec![
            "ISBN".to_string(),
            "eLIB link".to_string(),
            "Signatory Name".to_string(),
            "Signatory Location".to_string(),
            "Wiley Entity".to_string(),
            "Contract Signing Date".to_string(),
            "Latest Signing Date".to_string(),
            "Agreement Date".to_string(),
            "Is agreement fully signed by all parties".to_string(),
            "Recommendation for Licensing".to_string(),
            "Rationale".to_string(),
            grant_fields[0].clone(),
            grant_fields[1].clone(),
            grant_fields[2].clone(),
            governing_law.clone(),
            term.clone(),
            "Amendments/Appendices (Y/N)".to_string(),
            "Summary of Amendment/Appendix".to_string(),
        ];

        ContractSchema {
            name: "classic".to_string(),
            date_fields: vec![
                "Contract Signing Date".to_string(),
                "Latest Signing Date".to_string(),
                "Agreement Date".to_string(),
            ],
            agreement_date_field: "Agreement Date".to_string(),
            signature_field: "Is agreement fully signed by all parties".to_string(),
            recommendation_field: "Recommendation for Licensing".to_string(),
            isbn_field: "ISBN".to_string(),
            link_field: "eLIB link".to_string(),
            signatory_name_field: "Signatory Name".to_string(),
            signatory_location_field: "Signatory Location".to_string(),
            rationale_field: "Rationale".to_string(),
            grant_fields,
            grant_separator: GrantSeparator::Space,
            governing_law_field: governing_law,
            term_field: term,
            amendments_field: "Amendments/Appendices (Y/N)".to_string(),
            amendment_summary_field: Some("Summary of Amendment/Appendix".to_string()),
            paired: None,
            required_fields,
            searchable_fields: vec![
                "ISBN".to_string(),
                "Signatory Name".to_string(),
                RIGHTS_GRANT.to_string(),
                "Governing Law (Country or State only)".to_string(),
            ],
        }
    }

    /// The AI-assisted export layout: analytic columns arrive as paired
    /// `"<Category> AI Output"` / `"<Category> Rationale"` siblings.
    pub fn assisted() -> Self {
        let paired = PairedFields {
            categories: vec![
                "Governing Law".to_string(),
                "Copyright".to_string(),
                "Agreement Term".to_string(),
                "Termination".to_string(),
                "Amendments".to_string(),
            ],
            output_suffix: " AI Output".to_string(),
            rationale_suffix: " Rationale".to_string(),
        };
        let grant_fields = [
            r#"Type of Rights Grant, Part 1 ("copyright assignment", "copyright transfer or license", "other")"#
                .to_string(),
            r#"Type of Rights Grant, Part 2: "Exclusive" or "Non-Exclusive" or Silent"#.to_string(),
            r#"Type of Rights Grant, Part 3: "Revocable" or "Irrevocable" or Silent"#.to_string(),
        ];

        let mut required_fields = vec![
            "ISBN".to_string(),
            "eLIB link".to_string(),
            "Signatory Name".to_string(),
            "Signatory Location".to_string(),
            "Wiley Entity".to_string(),
            "Contract Signing Date".to_string(),
            "Latest Signing Date".to_string(),
            "Agreement Date".to_string(),
            "Is agreement fully signed by all parties".to_string(),
            "Recommendation for Licensing".to_string(),
            "Rationale".to_string(),
            grant_fields[0].clone(),
            grant_fields[1].clone(),
            grant_fields[2].clone(),
        ];
        for category in &paired.categories {
            required_fields.push(paired.output_column(category));
            required_fields.push(paired.rationale_column(category));
        }

        ContractSchema {
            name: "assisted".to_string(),
            date_fields: vec![
                "Contract Signing Date".to_string(),
                "Latest Signing Date".to_string(),
                "Agreement Date".to_string(),
            ],
            agreement_date_field: "Agreement Date".to_string(),
            signature_field: "Is agreement fully signed by all parties".to_string(),
            recommendation_field: "Recommendation for Licensing".to_string(),
            isbn_field: "ISBN".to_string(),
            link_field: "eLIB link".to_string(),
            signatory_name_field: "Signatory Name".to_string(),
            signatory_location_field: "Signatory Location".to_string(),
            rationale_field: "Rationale".to_string(),
            grant_fields,
            grant_separator: GrantSeparator::LineBreak,
            governing_law_field: "Governing Law".to_string(),
            term_field: "Agreement Term".to_string(),
            amendments_field: "Amendments".to_string(),
            amendment_summary_field: None,
            paired: Some(paired),
            required_fields,
            searchable_fields: vec![
                "ISBN".to_string(),
                "Signatory Name".to_string(),
                RIGHTS_GRANT.to_string(),
                "Governing Law".to_string(),
            ],
        }
    }

    /// Built-in variants in detection-preference order.
    pub fn builtins() -> Vec<ContractSchema> {
        vec![ContractSchema::classic(), ContractSchema::assisted()]
    }

    /// How many of this schema's required fields appear in `headers`.
    fn header_score(&self, headers: &[String]) -> usize {
        self.required_fields
            .iter()
            .filter(|f| headers.iter().any(|h| h == *f))
            .count()
    }

    /// The dataset-level required-field check.
    ///
    /// A field counts as present when at least one row carries a non-empty
    /// value for it; per-row completeness is not validated here. Returns the
    /// names of every required field absent from every row, in schema order.
    pub fn missing_fields(&self, rows: &[RawRecord]) -> Vec<String> {
        self.required_fields
            .iter()
            .filter(|field| {
                !rows
                    .iter()
                    .any(|row| row.get(field.as_str()).is_some_and(|v| !v.is_empty()))
            })
            .cloned()
            .collect()
    }
}

/// Pick the variant whose required columns best match the header row.
///
/// Ties (and a dataset matching nothing at all) resolve to the earliest
/// schema, so validation failures are reported against a deterministic
/// variant.
pub fn detect_variant<'a>(
    schemas: &'a [ContractSchema],
    headers: &[String],
) -> Option<&'a ContractSchema> {
    schemas
        .iter()
        .fold(None, |best: Option<(&ContractSchema, usize)>, s| {
            let score = s.header_score(headers);
            match best {
                Some((_, top)) if top >= score => best,
                _ => Some((s, score)),
            }
        })
        .map(|(s, _)| s)
}

/// Look up a variant by name, case-insensitively.
pub fn variant_by_name<'a>(
    schemas: &'a [ContractSchema],
    name: &str,
) -> Option<&'a ContractSchema> {
    schemas.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}
