//! Render Bench CLI entry point.

fn main() {
    if let Err(e) = render_bench_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
