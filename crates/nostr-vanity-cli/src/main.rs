// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

use std::ffi::OsString;
use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use nostr_vanity::{Result, VanityOptions, VanitySearch};
use tracing_subscriber::EnvFilter;

mod cli;
mod util;

use self::cli::Cli;

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    ExitCode::from(exec(std::env::args_os()))
}

/// Parse `args` and run the search, returning the process exit code
fn exec<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    // Usage errors print the usage and are not failures
    let args: Cli = match Cli::try_parse_from(args) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return EXIT_SUCCESS;
        }
    };

    let Some(prefix) = args.prefix.clone() else {
        let _ = Cli::command().print_help();
        return EXIT_SUCCESS;
    };

    match run(prefix, args.options()) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            EXIT_FAILURE
        }
    }
}

fn run(prefix: String, opts: VanityOptions) -> Result<()> {
    println!("Searching for vanity pubkeys starting with \"{prefix}\"");

    let search: VanitySearch = VanitySearch::compile(prefix, opts)?;
    util::print_constraint(search.constraint());

    let handle = search.spawn()?;
    println!("Running search on {} threads!\n", handle.threads());

    for event in handle {
        util::print_event(&event);
    }

    Ok(())
}
