use anyhow::{Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use gossamer_core::report::{ScanReport, generate_summary};
use gossamer_core::tree::{build_site_tree, render_tree};
use gossamer_crawler::crawler::DiscoveryCallback;
use gossamer_crawler::trust::TrustPrompt;
use gossamer_crawler::{CrawlConfig, Crawler, FilterMode};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

// Helper functions for the scan handler

/// Parse the seed argument, defaulting the scheme to http:// when the bare
/// form lacks one.
pub fn parse_seed_url(raw: &str) -> Option<String> {
    // A bare "host:port/..." parses with the host as its scheme, so accept
    // the as-is form only when it actually carries a host.
    if let Ok(url) = Url::parse(raw)
        && url.host_str().is_some()
    {
        return Some(url.to_string());
    }

    let with_scheme = format!("http://{raw}");
    Url::parse(&with_scheme)
        .ok()
        .filter(|u| u.host_str().is_some())
        .map(|u| u.to_string())
}

/// Expand `~` in a user-supplied output path.
pub fn expand_output_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Translate the filter flags into a mode.
pub fn filter_from_flags(internal_only: bool, external_only: bool) -> FilterMode {
    if internal_only {
        FilterMode::InternalOnly
    } else if external_only {
        FilterMode::ExternalOnly
    } else {
        FilterMode::All
    }
}

fn config_from_matches(matches: &ArgMatches) -> Result<CrawlConfig> {
    let raw_url = matches.get_one::<String>("URL").unwrap();
    let seed =
        parse_seed_url(raw_url).ok_or_else(|| anyhow!("invalid seed URL '{raw_url}'"))?;

    let mut config = CrawlConfig::new(seed);
    config.max_depth = *matches.get_one::<usize>("depth").unwrap();
    config.filter = filter_from_flags(
        matches.get_flag("internal-only"),
        matches.get_flag("external-only"),
    );
    config.verbose = matches.get_flag("verbose");
    config.show_tree = matches.get_flag("tree");
    config.timeout_secs = *matches.get_one::<u64>("timeout").unwrap();
    config.output_path = matches
        .get_one::<String>("output")
        .map(|raw| expand_output_path(raw));
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.workers = *threads;
    }
    Ok(config)
}

pub async fn handle_scan(matches: &ArgMatches) -> Result<()> {
    let config = config_from_matches(matches)?;
    let seed_url = Url::parse(&config.seed).expect("seed was validated above");

    println!(
        "{} Crawling {}",
        "→".blue(),
        config.seed.as_str().bright_white()
    );
    println!(
        "  depth: {}   workers: {}   filter: {}\n",
        config.max_depth, config.workers, config.filter
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("crawling...");

    // Stream discoveries above the spinner as they land.
    let discovered = Arc::new(AtomicUsize::new(0));
    let discovered_clone = discovered.clone();
    let spinner_clone = spinner.clone();
    let on_discovery: DiscoveryCallback = Arc::new(move |address: &str, external: bool| {
        let count = discovered_clone.fetch_add(1, Ordering::Relaxed) + 1;
        let tag = if external {
            "[EXT]".cyan().bold()
        } else {
            "[INT]".green().bold()
        };
        spinner_clone.suspend(|| println!("{tag} {address}"));
        spinner_clone.set_message(format!("crawling... {count} discovered"));
    });

    // The trust prompt is the run's one interactive moment; suspending the
    // spinner keeps the question readable while the engine holds all other
    // dispatch parked.
    let prompt_spinner = spinner.clone();
    let trust_prompt: TrustPrompt = Arc::new(move |host: &str| {
        prompt_spinner.suspend(|| {
            println!(
                "\n{} {} presented an invalid or self-signed certificate.",
                "[!]".yellow().bold(),
                host
            );
            print!("Proceed without certificate verification? [Y/n]: ");
            io::stdout().flush().unwrap();

            let mut response = String::new();
            io::stdin().read_line(&mut response).unwrap();
            let response = response.trim().to_lowercase();

            response.is_empty() || response == "y" || response == "yes"
        })
    });

    let crawler = Arc::new(
        Crawler::new(config.clone())?
            .with_discovery_callback(on_discovery)
            .with_trust_prompt(trust_prompt),
    );

    let results = match crawler.run().await {
        Ok(results) => {
            spinner.finish_and_clear();
            results
        }
        Err(err) => {
            spinner.finish_and_clear();
            return Err(err.into());
        }
    };

    println!("\n{}", generate_summary(&seed_url, &results));

    if config.show_tree {
        println!("{}", "=== Site Tree ===".magenta().bold());
        println!("{}", config.seed);
        print!("{}", render_tree(&build_site_tree(&seed_url, &results)));
        println!();
    }

    if let Some(ref path) = config.output_path {
        let report = ScanReport::new(&seed_url, results, config.show_tree);
        report.save_json(path)?;
        println!("{} Report saved to {}", "✓".green().bold(), path.display());
    }

    Ok(())
}
