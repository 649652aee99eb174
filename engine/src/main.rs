// Engine command line entry point
mod cli;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the JSON results.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    tracing::debug!("Starting stock analysis engine");
    cli::run()
}
