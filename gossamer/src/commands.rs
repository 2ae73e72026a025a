use crate::CLAP_STYLING;
use clap::arg;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("gossamer")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("gossamer")
        .styles(CLAP_STYLING)
        .about(
            "Recursively discover the reachable pages, scripts, API routes and assets \
            of a target site.",
        )
        .arg(arg!(<URL> "The seed URL to crawl (scheme defaults to http://)"))
        .arg(
            arg!(-d --depth <DEPTH>)
                .required(false)
                .help("Maximum recursion depth into internal links")
                .value_parser(clap::value_parser!(usize))
                .default_value("3"),
        )
        .arg(
            arg!(--"internal-only")
                .required(false)
                .help("Record only links on the seed's authority")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("external-only"),
        )
        .arg(
            arg!(--"external-only")
                .required(false)
                .help("Record only links outside the seed's authority")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-t --threads <NUM_WORKERS>)
                .required(false)
                .help("Concurrency gate capacity (default: 4x available cores, min 16)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--timeout <SECONDS>)
                .required(false)
                .help("Page request timeout; reachability probes use half of it")
                .value_parser(clap::value_parser!(u64))
                .default_value("60"),
        )
        .arg(
            arg!(-o --output <PATH>)
                .required(false)
                .help("Save a JSON report of the run to this path"),
        )
        .arg(
            arg!(--tree)
                .required(false)
                .help("Render the discovered site tree after the crawl")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-v --verbose)
                .required(false)
                .help("Log branch-level fetch and probe failures")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-q --quiet "Suppress banner and non-essential output").required(false),
        )
}
