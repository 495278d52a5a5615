use colored::{ColoredString, Colorize};
use scaffold_codemod::{ChangeSet, ChangeType, Reporter};

fn label(change_type: ChangeType) -> ColoredString {
    match change_type {
        ChangeType::Add => change_type.label().green(),
        ChangeType::Update => change_type.label().yellow(),
        ChangeType::Delete => change_type.label().red(),
    }
}

/// Render a change set as printed after each codemod.
pub fn render(title: &str, description: &str, changes: &ChangeSet) -> String {
    let mut out = format!("{}\n{title} ({description})\n", "─".repeat(60).dimmed());
    if changes.is_empty() {
        out.push_str("No changes were made\n");
        return out;
    }

    out.push_str(&format!("{}\n", "Changes:".bold()));
    for change_type in [ChangeType::Add, ChangeType::Update, ChangeType::Delete] {
        for path in changes.of_type(change_type) {
            out.push_str(&format!("  • {} {path}\n", label(change_type)));
        }
    }
    out
}

/// Prints progress to stderr.
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn report(&self, title: &str, description: &str, changes: &ChangeSet) {
        eprint!("{}", render(title, description, changes));
    }

    fn notice(&self, message: &str) {
        eprintln!("{message}");
    }
}
