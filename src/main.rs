mod args;
mod rcv;

use clap::Parser;
use log::{error, LevelFilter};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    if let Err(e) = rcv::run_election(&args) {
        error!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            error!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
