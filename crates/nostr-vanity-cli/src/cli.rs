// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

use std::time::Duration;

use clap::Parser;
use nostr_vanity::VanityOptions;

#[derive(Debug, Parser)]
#[clap(name = "nostr-vanity", author, version, about, long_about = None)]
pub struct Cli {
    /// Bech32 prefix (a-z 0-9 excluding b, i, o and 1, at most 12 chars)
    pub prefix: Option<String>,
    /// Worker threads [default: one per hardware thread]
    #[clap(short = 'j', long)]
    pub threads: Option<usize>,
    /// Seconds between two throughput reports
    #[clap(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub report_interval: u64,
    /// Stop after this number of matches [default: never]
    #[clap(long)]
    pub max_matches: Option<usize>,
}

impl Cli {
    pub fn options(&self) -> VanityOptions {
        let mut opts = VanityOptions::new()
            .report_interval(Duration::from_secs(self.report_interval))
            .max_matches(self.max_matches.unwrap_or_default());

        if let Some(threads) = self.threads {
            opts = opts.threads(threads);
        }

        opts
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse() {
        let cli = Cli::try_parse_from(["nostr-vanity", "m0", "-j", "4", "--max-matches", "2"]).unwrap();
        assert_eq!(cli.prefix.as_deref(), Some("m0"));
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.report_interval, 30);

        let expected = VanityOptions::new()
            .threads(4)
            .report_interval(Duration::from_secs(30))
            .max_matches(2);
        assert_eq!(cli.options(), expected);
    }

    #[test]
    fn test_report_interval_must_be_positive() {
        let err = Cli::try_parse_from(["nostr-vanity", "q", "--report-interval", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli::try_parse_from(["nostr-vanity", "q", "--report-interval", "1"]).unwrap();
        assert_eq!(cli.report_interval, 1);
    }

    #[test]
    fn test_prefix_is_optional() {
        let cli = Cli::try_parse_from(["nostr-vanity"]).unwrap();
        assert!(cli.prefix.is_none());
        assert_eq!(cli.options(), VanityOptions::new());
    }
}
