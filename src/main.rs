// Mon Jul 27 2026 - Alex

use clap::Parser;
use colored::Colorize;
use ctype_oracle::cli::{self, Args, Command};
use ctype_oracle::utils::logging;

fn main() {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }
    logging::init(&args.log_level, !args.no_color);

    let result = match &args.command {
        Command::Layout(layout) => cli::run_layout(layout, args.quiet),
        Command::Compare(compare) => cli::run_compare(compare, args.quiet),
        Command::Check(check) => cli::run_check(check, args.quiet),
        Command::Dump(dump) => cli::run_dump(dump, args.quiet),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{} {:#}", "[!]".red(), err);
            std::process::exit(1);
        }
    }
}
