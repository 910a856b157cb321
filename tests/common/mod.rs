use std::path::{Path, PathBuf};

use contratui::schema::ContractSchema;

/// A fully populated classic-layout row with a few knobs the tests care
/// about. Unlisted columns get plausible filler.
pub fn classic_row(
    isbn: &str,
    name: &str,
    date: &str,
    recommendation: &str,
    signed: &str,
) -> Vec<(String, String)> {
    let schema = ContractSchema::classic();
    let mut row: Vec<(String, String)> = schema
        .required_fields
        .iter()
        .map(|f| (f.clone(), String::new()))
        .collect();

    let mut set = |field: &str, value: &str| {
        if let Some(entry) = row.iter_mut().find(|(k, _)| k == field) {
            entry.1 = value.to_string();
        }
    };
    set("ISBN", isbn);
    set("eLIB link", "https://elib.example/record");
    set("Signatory Name", name);
    set("Signatory Location", "Hoboken, NJ");
    set("Wiley Entity", "Wiley & Sons");
    set("Contract Signing Date", date);
    set("Latest Signing Date", date);
    set("Agreement Date", date);
    set("Is agreement fully signed by all parties", signed);
    set("Recommendation for Licensing", recommendation);
    set("Rationale", "Clear grant, no carve-outs.");
    set(&schema.grant_fields[0], "copyright assignment");
    set(&schema.grant_fields[1], "Exclusive");
    set(&schema.grant_fields[2], "Irrevocable");
    set("Governing Law (Country or State only)", "New York");
    set(
        r#"Term of Agreement ("Full Term of Copyright", or Language if "Other")"#,
        "Full Term of Copyright",
    );
    set("Amendments/Appendices (Y/N)", "Y");
    set(
        "Summary of Amendment/Appendix",
        "Appendix A updates the territory list.",
    );
    row
}

/// Write rows (all sharing the classic header set) to `<dir>/<name>`.
pub fn write_classic_csv(dir: &Path, name: &str, rows: &[Vec<(String, String)>]) -> PathBuf {
    let schema = ContractSchema::classic();
    write_csv(dir, name, &schema.required_fields, rows)
}

/// Write an assisted-layout export with one row per (category overrides) set.
pub fn write_assisted_csv(dir: &Path, name: &str, rows: &[Vec<(String, String)>]) -> PathBuf {
    let schema = ContractSchema::assisted();
    write_csv(dir, name, &schema.required_fields, rows)
}

/// A fully populated assisted-layout row.
pub fn assisted_row(
    isbn: &str,
    name: &str,
    recommendation: &str,
    law_output: &str,
    law_rationale: &str,
) -> Vec<(String, String)> {
    let schema = ContractSchema::assisted();
    let mut row: Vec<(String, String)> = schema
        .required_fields
        .iter()
        .map(|f| (f.clone(), String::new()))
        .collect();

    let mut set = |field: &str, value: &str| {
        if let Some(entry) = row.iter_mut().find(|(k, _)| k == field) {
            entry.1 = value.to_string();
        }
    };
    set("ISBN", isbn);
    set("eLIB link", "https://elib.example/record");
    set("Signatory Name", name);
    set("Signatory Location", "Chichester, UK");
    set("Wiley Entity", "Wiley & Sons");
    set("Contract Signing Date", "02/10/2021");
    set("Latest Signing Date", "02/12/2021");
    set("Agreement Date", "02/10/2021");
    set("Is agreement fully signed by all parties", "Fully signed");
    set("Recommendation for Licensing", recommendation);
    set("Rationale", "Assessed from the signed scan.");
    set(&schema.grant_fields[0], "copyright transfer or license");
    set(&schema.grant_fields[1], "Non-Exclusive");
    set(&schema.grant_fields[2], "Revocable");
    // Every paired column carries something so dataset validation passes;
    // tests blank individual pairs out as needed.
    for category in &schema.paired.as_ref().unwrap().categories {
        let paired = schema.paired.as_ref().unwrap();
        set(&paired.output_column(category), "Reviewed, no concerns");
        set(&paired.rationale_column(category), "Matches the signed scan.");
    }
    set("Governing Law AI Output", law_output);
    set("Governing Law Rationale", law_rationale);
    row
}

/// Blank a column in a prepared row (e.g. to empty one half of a pair).
pub fn clear_field(row: &mut [(String, String)], field: &str) {
    if let Some(entry) = row.iter_mut().find(|(k, _)| k == field) {
        entry.1 = String::new();
    }
}

fn write_csv(
    dir: &Path,
    name: &str,
    headers: &[String],
    rows: &[Vec<(String, String)>],
) -> PathBuf {
    let path = dir.join(name);
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(headers).unwrap();
    for row in rows {
        let record: Vec<&str> = headers
            .iter()
            .map(|header| {
                row.iter()
                    .find(|(k, _)| k == header)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("")
            })
            .collect();
        writer.write_record(&record).unwrap();
    }
    writer.flush().unwrap();
    path
}
