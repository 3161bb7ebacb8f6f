use crate::ui::{Icons, theme};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::EYE, text.style(theme().header()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn()));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO, label.style(theme().dim()), value);
}

/// Heading for one repository in multi-repo output
pub fn section(alias_name: &str, repo_path: &str) {
    println!();
    println!(
        "{} {} {}",
        Icons::BRANCH,
        alias_name.style(theme().alias()),
        repo_path.style(theme().dim())
    );
}

pub fn alias(text: &str) -> String {
    text.style(theme().alias()).to_string()
}

pub fn path(text: &str) -> String {
    text.style(theme().path()).to_string()
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim()).to_string()
}
