//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

#[expect(clippy::print_stderr, reason = "top-level failures are reported on stderr")]
fn main() {
    tessera_cli::init_logging();
    if let Err(err) = tessera_cli::run() {
        eprintln!("tessera: {err}");
        std::process::exit(1);
    }
}
