// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use colored::*;
use kdam::{Bar, tqdm};

/// A basic progress bar for tracking iterations
pub fn progress_bar(n: usize, desc: &str, verbose: bool) -> Bar {
    if !verbose {
        return tqdm!(disable = true);
    }

    tqdm!(
        total = n,
        force_refresh = false,
        desc = progress_timestamp(desc),
        bar_format =
            "{desc suffix=' '}[{percentage:.0}%] ({rate:.1}/s, eta: {remaining human=true})"
    )
}

/// A timestamped prefix for console messages
pub fn progress_timestamp(desc: &str) -> String {
    let time = chrono::Local::now();
    let time = format!(
        "{} | {}",
        time.format("%Y-%m-%d"),
        time.format("%H:%M:%S")
    );

    format!(
        "{} {} {} {} {} {}",
        "[".bold(),
        time,
        "|".bold(),
        "sorrel".truecolor(176, 58, 46).bold(),
        "]".bold(),
        desc,
    )
}

/// Print timestamped statements to console
pub fn progress_log(desc: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", progress_timestamp(desc));
}

/// Print timestamped warnings to stderr
///
/// Warnings are printed regardless of verbosity.
pub fn progress_warn(desc: &str) {
    eprintln!(
        "{}",
        progress_timestamp(&format!("{} {}", "WARNING:".yellow().bold(), desc))
    );
}

/// Format numbers to readable thousands format
///
/// ```
/// use sorrel_core::ut::track::thousands_format;
///
/// assert_eq!(thousands_format(1234), "1234");
/// assert_eq!(thousands_format(1234567), "1,234,567");
/// ```
pub fn thousands_format<T>(number: T) -> String
where
    T: std::fmt::Display,
{
    let number = number.to_string();
    if number.len() <= 4 {
        return number;
    }

    number
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).to_string())
        .collect::<Vec<String>>()
        .join(",")
}
