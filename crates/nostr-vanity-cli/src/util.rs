// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2024 Rust Nostr Developers
// Distributed under the MIT software license

use nostr_vanity::{PrefixConstraint, SearchEvent};

pub fn print_constraint(constraint: &PrefixConstraint) {
    println!();
    println!("... represented as hex ...");
    println!("  prefix to find (in hex) = {:016x}", constraint.value());
    println!("  prefix mask    (in hex) = {:016x}", constraint.mask());
    println!();
}

pub fn print_event(event: &SearchEvent) {
    match event {
        SearchEvent::Match(found) => println!("{found}"),
        SearchEvent::Progress(progress) => println!("  ... {progress} ..."),
    }
}
