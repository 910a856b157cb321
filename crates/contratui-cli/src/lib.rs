//! Shared CLI definitions for contratui.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};

/// Which contract-export header layout to expect.
///
/// The licensing team has shipped two incompatible generations of the
/// export; `Auto` picks one by inspecting the header row.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SchemaChoice {
    /// Detect the export generation from the CSV header row
    #[default]
    Auto,
    /// Original export layout (plain Rationale and analysis columns)
    Classic,
    /// AI-assisted export layout (paired "AI Output"/"Rationale" columns)
    Assisted,
}

impl SchemaChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaChoice::Auto => "auto",
            SchemaChoice::Classic => "classic",
            SchemaChoice::Assisted => "assisted",
        }
    }
}

/// Command-line arguments for contratui
#[derive(Clone, Parser, Debug)]
#[command(
    name = "contratui",
    version,
    about = "Contract Review in the Terminal",
    long_about = "Load a licensing-contract CSV export and explore it as an \
interactive, sortable, fuzzy-searchable grid with a per-contract detail view.\n\n\
Without a PATH the application starts empty; press `o` to load a file."
)]
pub struct Args {
    /// Path to the contract CSV export to open (optional; press `o` in the
    /// application to load a file later)
    #[arg(value_name = "PATH")]
    pub path: Option<std::path::PathBuf>,

    /// Which export header layout to expect (default: auto-detect from the
    /// header row). Overrides the config file.
    #[arg(long = "schema", value_enum)]
    pub schema: Option<SchemaChoice>,

    /// Specify the delimiter to use when reading the file
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file under the platform config
    /// directory and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
///
/// Used by the gen_docs binary; output is written to stdout and then
/// into the reference docs by the docs build process.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder: String = arg
                .get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            parts.join(", ")
        };

        let help = arg
            .get_long_help()
            .or_else(|| arg.get_help())
            .map(|h| h.to_string())
            .unwrap_or_default();

        out.push_str(&format!(
            "| `{}` | {} |\n",
            escape_table_cell(&option_str),
            escape_table_cell(&help)
        ));
    }

    out
}
