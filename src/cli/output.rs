//! Terminal output helpers.
//!
//! Status lines go to stdout, problems to stderr. Styling is dropped when
//! `NO_COLOR` is set so scripts and tests see plain text.

use std::fmt::Display;

use console::{Style, StyledObject};

const RULE_WIDTH: usize = 56;

fn paint<D>(value: D, style: Style) -> StyledObject<D> {
    let style = if std::env::var_os("NO_COLOR").is_some() {
        Style::new().force_styling(false)
    } else {
        style
    };
    style.apply_to(value)
}

/// `✓ stored DB_PASS`
pub fn success(msg: &str) {
    println!("{} {}", paint("✓", Style::new().green()), msg);
}

/// `✗ <message>` on stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", paint("✗", Style::new().red().for_stderr()), msg);
}

/// `⚠ <message>` on stderr.
pub fn warn(msg: &str) {
    eprintln!("{} {}", paint("⚠", Style::new().yellow().for_stderr()), msg);
}

/// `→ set CELLAR_SECRET_KEY or CELLAR_ENV_BINDING` on stderr.
pub fn hint(msg: &str) {
    let cyan = Style::new().cyan().for_stderr();
    eprintln!("{} {}", paint("→", cyan.clone()), paint(msg, cyan));
}

pub fn header(title: &str) {
    println!("{}", paint(title, Style::new().bold()));
}

/// Indented `label  value` line.
pub fn kv(label: &str, value: impl Display) {
    println!(
        "  {}  {}",
        paint(label, Style::new().dim()),
        paint(value, Style::new().bold())
    );
}

pub fn list_item(item: &str) {
    println!("  • {}", item);
}

/// Inline highlight for names and tokens.
pub fn key(k: &str) -> String {
    paint(k, Style::new().cyan()).to_string()
}

pub fn dimmed(msg: &str) {
    println!("{}", paint(msg, Style::new().dim()));
}

/// Undecorated output: secret values, tokens, documents.
pub fn data(value: &str) {
    println!("{}", value);
}

/// Blank line, bold title and a rule.
pub fn section(title: &str) {
    println!();
    header(title);
    println!("{}", paint("─".repeat(RULE_WIDTH), Style::new().dim()));
}
