//! Binary entry point for the `tsq` command-line tool.

use turbosqueeze::cli::{self, USAGE};

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cmd = match cli::parse_args(&argv) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("tsq: {}", e);
            eprint!("{}", USAGE);
            std::process::exit(1);
        }
    };
    std::process::exit(cli::run(cmd));
}
