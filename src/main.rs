//! xlattice entry point.
//!
//! `xlattice build [version] [--with module[@version][=replacement]]...
//! [--enable-cgo] [--output path]` produces a named binary and verifies
//! it runs. Any other invocation is dev mode: build Lattice from the
//! local module, run it with the arguments forwarded, then delete the
//! temporary binary.

use std::env;
use std::path::Path;
use std::process;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use xlattice::builder::GoBuilder;
use xlattice::config::Config;
use xlattice::run::{run_build, run_dev, DEV_OUTPUT};
use xlattice::signal::{install_handler, CancelToken};
use xlattice::toolchain::GoWorkspace;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let token = CancelToken::new();
    if let Err(err) = install_handler(Arc::clone(&token)) {
        tracing::error!("installing signal handler: {err}");
        process::exit(1);
    }

    let config = Config::from_env();
    let builder = GoBuilder;
    let args: Vec<String> = env::args().skip(1).collect();

    let result = match args.first().map(String::as_str) {
        Some("build") => run_build(&token, &config, &builder, &args[1..]),
        _ => run_dev(
            &token,
            &config,
            &builder,
            &GoWorkspace,
            &args,
            Path::new(DEV_OUTPUT),
        ),
    };

    token.finish();

    if let Err(err) = result {
        tracing::error!("{err}");
        process::exit(err.exit_code());
    }
}
