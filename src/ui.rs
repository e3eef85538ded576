use colored::Colorize;
use declarative::Error;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a resolution error with its category and advice
pub fn resolution_error(node: &str, err: &Error) {
    let category = err.category();
    error(&format!("{}: {}", node.bold(), category.description()));
    eprintln!("    {err}");
    eprintln!("    {}", category.advice().dimmed());
}

/// Shorten multi-line values to their first line for tabular output
pub fn first_line(value: &str) -> String {
    let mut lines = value.lines();
    let first = lines.next().unwrap_or_default();
    let rest = lines.count();
    if rest == 0 {
        first.to_string()
    } else {
        format!("{first} … (+{rest} lines)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line_single() {
        assert_eq!(first_line("present"), "present");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_first_line_multi() {
        assert_eq!(
            first_line("worker_processes 1;\nevents {}\n"),
            "worker_processes 1; … (+1 lines)"
        );
    }
}
