use clap::Parser;
use log::LevelFilter;

mod args;
mod flow;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Err(e) = flow::run_election(&args) {
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
