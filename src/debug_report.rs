use charge::{LoadIssue, LoadReport, Outcome, ReplyDetails, RuleSummary};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_load(report: &LoadReport, color: bool) {
    let palette = ansi::Palette::new(color);
    eprintln!(
        "{} {} {}",
        palette.bold(palette.paint(format!("⚙  Loaded {}", report.source), ansi::CYAN)),
        palette.paint(format!("{} scripts", report.scripts), ansi::BLUE),
        palette.paint(format!("{} rules", report.rules), ansi::GREEN),
    );
    for issue in &report.issues {
        let tint = match issue {
            LoadIssue::Unsupported { .. } => ansi::GRAY,
            LoadIssue::DuplicateRule { .. } | LoadIssue::NoRules(_) => ansi::YELLOW,
            LoadIssue::Script(_) | LoadIssue::Rule(_) => ansi::RED,
        };
        eprintln!("  {} {}", palette.paint("•", tint), issue);
    }
}

pub fn print_rules(rules: &[RuleSummary], color: bool) {
    let palette = ansi::Palette::new(color);
    let mut topic: Option<&str> = None;

    for (idx, row) in rules.iter().enumerate() {
        if topic != Some(row.topic.as_str()) {
            topic = Some(row.topic.as_str());
            println!("\n{}", palette.paint(format!("━━━ Topic \"{}\" ━━━", row.topic), ansi::GRAY));
        }

        let pattern = if row.cached { palette.bold(palette.paint(&row.pattern, ansi::GREEN)) } else { palette.dim(&row.pattern) };
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{idx}]"), ansi::GRAY),
            pattern,
            palette.dim("│"),
            palette.paint(format!("weight {} score {}", row.weight, row.score), ansi::YELLOW),
        );

        let previous = row.previous.as_deref().map(|p| format!("  {} {}", palette.dim("│ previous:"), p)).unwrap_or_default();
        let broken = if row.cached { String::new() } else { format!("  {}", palette.paint("✗ not compiled", ansi::RED)) };
        println!("      {} {}{previous}{broken}", palette.dim("rule:"), palette.paint(&row.rule, ansi::CYAN));
    }
    println!();
}

pub fn print_reply(details: &ReplyDetails, color: bool) {
    let palette = ansi::Palette::new(color);

    let outcome = match details.outcome {
        Outcome::Replied => palette.paint("✓ replied", ansi::GREEN),
        Outcome::NoMatch => palette.dim("✗ no match"),
        Outcome::HandlerFailed => palette.paint("✗ handler failed", ansi::RED),
        Outcome::DepthExceeded => palette.paint("✗ depth limit", ansi::YELLOW),
    };
    let rule = details.rule.as_deref().map(|r| palette.paint(r, ansi::CYAN)).unwrap_or_else(|| palette.dim("-"));

    eprintln!(
        "  {} \"{}\"  {} {}  {} {}",
        palette.dim("normalized:"),
        palette.paint(&details.normalized, ansi::BLUE),
        palette.dim("│ rule:"),
        rule,
        palette.dim("│"),
        outcome,
    );
    eprintln!(
        "  {} {}  {} {}",
        palette.dim("considered:"),
        details.considered,
        palette.dim("│ time:"),
        palette.paint(format!("{:?}", details.elapsed), ansi::GREEN),
    );
}
