//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

#[expect(clippy::print_stderr, reason = "the binary reports fatal errors on stderr")]
fn main() {
    sensible_env_logger::init!();
    if let Err(err) = gemscout_cli::run() {
        eprintln!("gemscout: {err}");
        std::process::exit(1);
    }
}
