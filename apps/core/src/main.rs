use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = plantfind_core::cli::Cli::parse();

    if let Err(error) = plantfind_core::cli::run(cli).await {
        eprintln!("[plantfind-core] runtime failed: {error}");
        std::process::exit(1);
    }
}
