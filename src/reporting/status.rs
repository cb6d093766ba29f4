//! One-line status messages in the console's `[*]` / `[+]` / `[-]` / `[!]` style

use colored::Colorize;

pub fn info(msg: impl AsRef<str>) {
    println!("{} {}", "[*]".blue().bold(), msg.as_ref());
}

pub fn success(msg: impl AsRef<str>) {
    println!("{} {}", "[+]".green().bold(), msg.as_ref());
}

pub fn failure(msg: impl AsRef<str>) {
    println!("{} {}", "[-]".red().bold(), msg.as_ref());
}

pub fn warning(msg: impl AsRef<str>) {
    println!("{} {}", "[!]".yellow().bold(), msg.as_ref());
}
