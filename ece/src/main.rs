use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    ece::run().await
}
