use colored::Colorize;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
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

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a line diff between two texts, indented
pub fn line_diff(old: &str, new: &str) {
    let diff = similar::TextDiff::from_lines(old, new);

    for change in diff.iter_all_changes() {
        let line = change.to_string_lossy();
        let line = line.trim_end_matches('\n');
        match change.tag() {
            similar::ChangeTag::Delete => println!("      {}", format!("- {line}").red()),
            similar::ChangeTag::Insert => println!("      {}", format!("+ {line}").green()),
            similar::ChangeTag::Equal => println!("      {}", format!("  {line}").dimmed()),
        }
    }
}
