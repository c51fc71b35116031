//! `brewlink` binary entrypoint.

#[tokio::main]
async fn main() {
    let exit_code = brewlink_cli::run().await;
    std::process::exit(exit_code);
}
