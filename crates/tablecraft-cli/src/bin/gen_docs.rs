//! Binary that emits command-line options markdown to stdout.
//!
//! Redirect the output to refresh the command-line options reference.

fn main() {
    print!("{}", tablecraft_cli::render_options_markdown());
}
