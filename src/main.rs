mod cli;
mod report;
mod run_report;
mod ui;

/// Entry point for the `http-mutant` binary.
fn main() -> anyhow::Result<()> {
    env_logger::init();
    cli::run()
}
