//! Binary that emits command-line options markdown to stdout.
//!
//! Used when regenerating `docs/command-line-options.md`.

fn main() {
    print!("{}", coldash_cli::render_options_markdown());
}
