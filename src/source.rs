//! The upload boundary: turn a CSV export on disk into an accepted dataset.
//!
//! Everything that can go wrong with an upload is caught here and mapped to
//! the [`UploadError`] taxonomy; the caller surfaces the message in the
//! feedback banner and keeps whatever table was already loaded. A rejected
//! upload never produces a partial table.

use std::path::Path;

use thiserror::Error;

use crate::record::{normalize, Contract, MissingColumn, RawRecord};
use crate::schema::{detect_variant, variant_by_name, ContractSchema};

#[derive(Debug, Error)]
pub enum UploadError {
    /// Decided by file-name extension only, no content sniffing.
    #[error("Please upload a CSV file.")]
    UnsupportedFileType,
    /// Required fields absent from every row of the dataset.
    #[error("Missing required fields: {}.", .0.join(", "))]
    MissingFields(Vec<String>),
    /// The CSV tokenizer (or the underlying IO) failed.
    #[error("Error reading CSV: {0}")]
    Parse(#[from] csv::Error),
    /// A row is structurally missing a column a derivation needs.
    #[error("Row {row}: {source}")]
    MalformedRow {
        row: usize,
        #[source]
        source: MissingColumn,
    },
}

/// Options for one load, mirroring the CLI/config knobs.
#[derive(Debug, Default, Clone)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    /// Pin a schema variant by name; `None` auto-detects from the headers.
    pub variant: Option<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

/// A successfully loaded dataset.
#[derive(Debug)]
pub struct Dataset {
    /// Accepted rows: normalized, recommendation field non-empty.
    pub contracts: Vec<Contract>,
    /// The schema variant the file was read under.
    pub schema: ContractSchema,
    /// Rows in the parse, including those excluded by the row filter.
    pub total_rows: usize,
}

fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Load, validate, and normalize a contract export.
pub fn load(
    path: &Path,
    schemas: &[ContractSchema],
    options: &LoadOptions,
) -> Result<Dataset, UploadError> {
    if !is_csv_path(path) {
        return Err(UploadError::UnsupportedFileType);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter.unwrap_or(b','))
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut raws: Vec<RawRecord> = Vec::new();
    for result in reader.records() {
        let record = result?;
        let raw: RawRecord = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        raws.push(raw);
    }

    let schema = options
        .variant
        .as_deref()
        .and_then(|name| variant_by_name(schemas, name))
        .or_else(|| detect_variant(schemas, &headers))
        .cloned()
        .unwrap_or_else(ContractSchema::classic);

    let missing = schema.missing_fields(&raws);
    if !missing.is_empty() {
        return Err(UploadError::MissingFields(missing));
    }

    let total_rows = raws.len();
    let mut contracts = Vec::with_capacity(total_rows);
    for (i, raw) in raws.iter().enumerate() {
        // Row numbers are 1-based and count the header line.
        let contract = normalize(raw, &schema).map_err(|source| UploadError::MalformedRow {
            row: i + 2,
            source,
        })?;
        // Rows with no recommendation at all stay out of the table; they
        // remain part of the parse (total_rows) but are never rendered.
        if !contract.raw_text(&schema.recommendation_field).is_empty() {
            contracts.push(contract);
        }
    }

    Ok(Dataset {
        contracts,
        schema,
        total_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SignedStatus;
    use std::io::Write;

    /// Write a classic-layout export with the given per-row overrides.
    fn write_classic_csv(dir: &Path, name: &str, rows: &[&[(&str, &str)]]) -> std::path::PathBuf {
        let schema = ContractSchema::classic();
        let path = dir.join(name);
        let mut writer = csv::Writer::from_path(&path).unwrap();
        writer.write_record(&schema.required_fields).unwrap();
        for overrides in rows {
            let record: Vec<String> = schema
                .required_fields
                .iter()
                .map(|field| {
                    overrides
                        .iter()
                        .find(|(k, _)| k == field)
                        .map(|(_, v)| v.to_string())
                        .unwrap_or_default()
                })
                .collect();
            writer.write_record(&record).unwrap();
        }
        writer.flush().unwrap();
        path
    }

    #[test]
    fn test_rejects_non_csv_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contracts.txt");
        std::fs::write(&path, "ISBN\n123\n").unwrap();
        let err = load(&path, &ContractSchema::builtins(), &LoadOptions::new()).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFileType));
        assert_eq!(err.to_string(), "Please upload a CSV file.");
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_classic_csv(
            dir.path(),
            "contracts.CSV",
            &[&[
                ("ISBN", "B9780470059376"),
                ("Signatory Name", "Ada Lovelace"),
                ("Recommendation for Licensing", "Yes"),
            ]],
        );
        let result = load(&path, &ContractSchema::builtins(), &LoadOptions::new());
        // The extension itself is accepted; any failure would be validation.
        assert!(!matches!(result, Err(UploadError::UnsupportedFileType)));
    }

    #[test]
    fn test_missing_fields_lists_every_absent_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contracts.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "ISBN,Signatory Name").unwrap();
        writeln!(file, "9780470059376,Ada Lovelace").unwrap();

        let err = load(&path, &ContractSchema::builtins(), &LoadOptions::new()).unwrap_err();
        match &err {
            UploadError::MissingFields(missing) => {
                assert!(missing.contains(&"Rationale".to_string()));
                assert!(!missing.contains(&"ISBN".to_string()));
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
        let message = err.to_string();
        assert!(message.starts_with("Missing required fields: "));
        assert!(message.ends_with('.'));
    }

    #[test]
    fn test_io_failure_maps_to_parse_error() {
        let err = load(
            Path::new("definitely-not-here.csv"),
            &ContractSchema::builtins(),
            &LoadOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, UploadError::Parse(_)));
        assert!(err.to_string().starts_with("Error reading CSV: "));
    }

    fn full_row<'a>(
        isbn: &'a str,
        name: &'a str,
        recommendation: &'a str,
        signed: &'a str,
    ) -> Vec<(&'a str, &'a str)> {
        vec![
            ("ISBN", isbn),
            ("eLIB link", "https://elib.example/1"),
            ("Signatory Name", name),
            ("Signatory Location", "Hoboken, NJ"),
            ("Wiley Entity", "Wiley & Sons"),
            ("Contract Signing Date", "01/02/2020"),
            ("Latest Signing Date", "01/05/2020"),
            ("Agreement Date", "01/02/2020"),
            ("Is agreement fully signed by all parties", signed),
            ("Recommendation for Licensing", recommendation),
            ("Rationale", "Straightforward grant."),
            (
                r#"Type of Rights Grant, Part 1 ("copyright assignment", "copyright transfer or license", "other")"#,
                "copyright assignment",
            ),
            (
                r#"Type of Rights Grant, Part 2: "Exclusive" or "Non-Exclusive" or Silent"#,
                "Exclusive",
            ),
            (
                r#"Type of Rights Grant, Part 3: "Revocable" or "Irrevocable" or Silent"#,
                "Irrevocable",
            ),
            ("Governing Law (Country or State only)", "New York"),
            (
                r#"Term of Agreement ("Full Term of Copyright", or Language if "Other")"#,
                "Full Term of Copyright",
            ),
            ("Amendments/Appendices (Y/N)", "Y"),
            ("Summary of Amendment/Appendix", "Appendix A updates the territory list."),
        ]
    }

    #[test]
    fn test_load_accepts_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let row_a = full_row("B9780470059376", "Ada Lovelace", "Yes", "Fully signed");
        let row_b = full_row("9781119183617", "Grace Hopper", "No", "Not signed");
        let path = write_classic_csv(dir.path(), "contracts.csv", &[&row_a, &row_b]);

        let dataset = load(&path, &ContractSchema::builtins(), &LoadOptions::new()).unwrap();
        assert_eq!(dataset.schema.name, "classic");
        assert_eq!(dataset.total_rows, 2);
        assert_eq!(dataset.contracts.len(), 2);
        assert_eq!(dataset.contracts[0].isbn, "9780470059376");
        assert_eq!(dataset.contracts[0].signed, SignedStatus::Signed);
    }

    #[test]
    fn test_rows_without_recommendation_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let row_a = full_row("B9780470059376", "Ada Lovelace", "Yes", "Fully signed");
        let row_b = full_row("9781119183617", "Grace Hopper", "", "Not signed");
        let path = write_classic_csv(dir.path(), "contracts.csv", &[&row_a, &row_b]);

        let dataset = load(&path, &ContractSchema::builtins(), &LoadOptions::new()).unwrap();
        assert_eq!(dataset.total_rows, 2);
        assert_eq!(dataset.contracts.len(), 1);
        assert_eq!(dataset.contracts[0].isbn, "9780470059376");
    }

    #[test]
    fn test_pinned_variant_overrides_detection() {
        let dir = tempfile::tempdir().unwrap();
        let row = full_row("B9780470059376", "Ada Lovelace", "Yes", "Fully signed");
        let path = write_classic_csv(dir.path(), "contracts.csv", &[&row]);

        let options = LoadOptions::new().with_variant("assisted");
        let err = load(&path, &ContractSchema::builtins(), &options).unwrap_err();
        // Forcing the wrong generation fails validation instead of guessing.
        assert!(matches!(err, UploadError::MissingFields(_)));
    }

    #[test]
    fn test_unknown_pinned_variant_falls_back_to_detection() {
        let dir = tempfile::tempdir().unwrap();
        let row = full_row("B9780470059376", "Ada Lovelace", "Yes", "Fully signed");
        let path = write_classic_csv(dir.path(), "contracts.csv", &[&row]);

        let options = LoadOptions::new().with_variant("no-such-layout");
        let dataset = load(&path, &ContractSchema::builtins(), &options).unwrap();
        assert_eq!(dataset.schema.name, "classic");
    }

    #[test]
    fn test_short_rows_pad_with_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contracts.csv");
        let schema = ContractSchema::classic();
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .unwrap();
        writer.write_record(&schema.required_fields).unwrap();
        // A truncated data row: only the first two fields present.
        writer
            .write_record(["9780470059376", "Ada Lovelace"])
            .unwrap();
        writer
            .write_record(
                full_row("9781119183617", "Grace Hopper", "Yes", "Fully signed")
                    .iter()
                    .map(|(_, v)| *v)
                    .collect::<Vec<_>>(),
            )
            .unwrap();
        writer.flush().unwrap();

        let dataset = load(&path, &ContractSchema::builtins(), &LoadOptions::new()).unwrap();
        // The truncated row normalizes (empty derivation inputs are valid)
        // but has no recommendation, so only the full row is accepted.
        assert_eq!(dataset.total_rows, 2);
        assert_eq!(dataset.contracts.len(), 1);
    }
}
