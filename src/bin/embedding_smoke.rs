//! Checks that local sentence embeddings load and behave sensibly.
//!
//! Exits non-zero only when the model cannot be loaded; the quality checks
//! are reported but never change the exit status.

use std::process::ExitCode;

use kgenrich::config::{Config, ENV_LOCAL_EMBEDDING_MODEL, ENV_USE_LOCAL_EMBEDDINGS};
use kgenrich::embedder::{Embedder, load_local_embedder};
use kgenrich::logging::init_logging;
use kgenrich::smoke::run_smoke_test;

fn main() -> ExitCode {
    init_logging();

    let mut config = Config::from_env();
    config.embeddings.use_local = true;

    println!("Testing local embeddings");
    println!("{ENV_USE_LOCAL_EMBEDDINGS}: {}", config.embeddings.use_local);
    println!("{ENV_LOCAL_EMBEDDING_MODEL}: {}", config.embeddings.model);

    let embedder = match load_local_embedder(&config.embeddings) {
        Ok(embedder) => embedder,
        Err(e) => {
            println!("Model failed to load: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "Model loaded successfully: {} dimensions",
        embedder.dimensions()
    );

    match run_smoke_test(&embedder) {
        Ok(report) => println!("{report}"),
        Err(e) => println!("Error testing embeddings: {e}"),
    }
    ExitCode::SUCCESS
}
