//! Line commands for the terminal front end
//!
//! Each input line maps to one command; unknown lines show the help text.

/// A command typed by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Like,
    Dislike,
    Reload,
    RefreshQuota,
    Status,
    GoOffline,
    GoOnline,
    Help,
    Quit,
}

/// A single shortcut for display
pub struct Shortcut {
    pub keys: &'static str,
    pub description: &'static str,
}

/// Parse one input line
pub fn parse(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "l" | "like" | "y" => Some(Command::Like),
        "d" | "dislike" | "n" => Some(Command::Dislike),
        "r" | "reload" => Some(Command::Reload),
        "u" | "quota" => Some(Command::RefreshQuota),
        "s" | "status" => Some(Command::Status),
        "off" | "offline" => Some(Command::GoOffline),
        "on" | "online" => Some(Command::GoOnline),
        "?" | "h" | "help" => Some(Command::Help),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// Shortcuts shown by the help command
pub fn shortcuts() -> Vec<Shortcut> {
    vec![
        Shortcut { keys: "l", description: "Like the current item" },
        Shortcut { keys: "d", description: "Dislike the current item" },
        Shortcut { keys: "r", description: "Reload today's deck" },
        Shortcut { keys: "u", description: "Refresh the remaining quota" },
        Shortcut { keys: "s", description: "Show session status" },
        Shortcut { keys: "off / on", description: "Simulate losing / regaining connectivity" },
        Shortcut { keys: "?", description: "Show this help" },
        Shortcut { keys: "q", description: "Quit" },
    ]
}

/// Help text listing every shortcut
pub fn help_text() -> String {
    shortcuts()
        .iter()
        .map(|s| format!("  {:<10} {}", s.keys, s.description))
        .collect::<Vec<_>>()
        .join("\n")
}
