pub mod report;
pub mod tree;

use colored::Colorize;

const BANNER: &str = r#"
                                                   .
   __ _  ___  ___ ___  __ _ _ __ ___   ___ _ __   /|\
  / _` |/ _ \/ __/ __|/ _` | '_ ` _ \ / _ \ '__| / | \
 | (_| | (_) \__ \__ \ (_| | | | | | |  __/ |    \ | /
  \__, |\___/|___/___/\__,_|_| |_| |_|\___|_|     \|/
  |___/                                            '
"#;

/// Startup banner, suppressed by --quiet.
pub fn print_banner() {
    println!("{}", BANNER.bright_magenta());
    println!(
        "{}",
        format!(
            "  gossamer v{} - recursive link discovery",
            env!("CARGO_PKG_VERSION")
        )
        .bright_white()
    );
    println!();
}
