//! Binary that emits command-line options markdown to stdout.
//!
//! Used by the docs build process to refresh the command-line reference
//! before publishing.

fn main() {
    print!("{}", contratui_cli::render_options_markdown());
}
