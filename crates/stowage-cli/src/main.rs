//! Binary entrypoint for the Stowage CLI.

#[tokio::main]
async fn main() {
    let exit_code = stowage_cli::run().await;
    std::process::exit(exit_code);
}
