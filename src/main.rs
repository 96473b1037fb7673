use std::process;

fn main() {
    if let Err(e) = wavescope::app::run() {
        tracing::error!("Application error: {e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
