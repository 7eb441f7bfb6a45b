//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};
use serde::Serialize;

use bookshelf_core::{Book, DerivedView, Notification, NotificationKind, ReadingStatus, Tone};

use crate::commands::book::short_id;
use crate::cover::describe_cover;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
    /// Whether human output may use ANSI colors
    color: bool,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        let color = format == OutputFormat::Human
            && atty::is(atty::Stream::Stdout)
            && std::env::var_os("NO_COLOR").is_none();
        Self { format, color }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print a single book
    pub fn print_book(&self, book: &Book) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", book.id);
                println!("Title:       {}", book.title);
                println!("Author:      {}", book.author);
                if let Some(ref year) = book.year {
                    println!("Year:        {}", year);
                }
                if let Some(ref isbn) = book.isbn {
                    println!("ISBN:        {}", isbn);
                }
                if let Some(ref category) = book.category {
                    println!(
                        "Category:    {}",
                        self.paint(category.as_str(), category.tone())
                    );
                }
                println!(
                    "Status:      {} {}",
                    status_glyph(book.status),
                    book.status.map(|s| s.as_str()).unwrap_or("(none)")
                );
                println!("Cover:       {}", describe_cover(book.cover_or_default()));
                if let Some(ref desc) = book.description {
                    println!();
                    println!("{}", desc);
                }
            }
            OutputFormat::Json => print_json(book),
            OutputFormat::Quiet => {
                println!("{}", book.id);
            }
        }
    }

    /// Print one page of a derived view
    pub fn print_view(&self, view: &DerivedView, filtered: bool) {
        match self.format {
            OutputFormat::Human => {
                if view.visible.is_empty() {
                    if view.total_count == 0 {
                        println!("No books found.");
                    } else {
                        println!(
                            "No books on page {} ({} page(s)).",
                            view.page_index + 1,
                            view.page_count()
                        );
                    }
                    return;
                }
                for book in &view.visible {
                    let category = format!("{:<12}", truncate(book.category_str(), 12));
                    let category = match book.category {
                        Some(ref c) => self.paint(&category, c.tone()),
                        None => category,
                    };
                    println!(
                        "{:<8} | {:<35} | {:<22} | {:>7} | {} | {}",
                        short_id(&book.id),
                        truncate(&book.title, 35),
                        truncate(&book.author, 22),
                        book.year.as_deref().unwrap_or(""),
                        category,
                        self.status_label(book.status)
                    );
                }
                println!(
                    "\nPage {} of {} - {} book(s){}",
                    view.page_index + 1,
                    view.page_count(),
                    view.total_count,
                    if filtered { " (filtered)" } else { "" }
                );
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "books": view.visible,
                "total": view.total_count,
                "page": view.page_index + 1,
                "pageSize": view.page_size,
                "pageCount": view.page_count(),
            })),
            OutputFormat::Quiet => {
                for book in &view.visible {
                    println!("{}", book.id);
                }
            }
        }
    }

    /// Print categories with their book counts
    pub fn print_categories(&self, categories: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if categories.is_empty() {
                    println!("No categories found.");
                    return;
                }
                for (name, count) in categories {
                    let tone = bookshelf_core::Category::from(name.as_str()).tone();
                    println!("{} ({})", self.paint(name, tone), count);
                }
                println!("\n{} categor{}", categories.len(), plural_y(categories.len()));
            }
            OutputFormat::Json => {
                let json: Vec<_> = categories
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json);
            }
            OutputFormat::Quiet => {
                for (name, _) in categories {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print pending notifications, oldest first
    ///
    /// In JSON mode they go to stderr, one object per line, so stdout carries
    /// only the command's own document.
    pub fn print_notifications(&self, notifications: &[Notification]) {
        let written = if self.notifications_on_stderr() {
            self.write_notifications(&mut io::stderr().lock(), notifications)
        } else {
            self.write_notifications(&mut io::stdout().lock(), notifications)
        };
        if let Err(e) = written {
            eprintln!("Failed to print notifications: {}", e);
        }
    }

    fn notifications_on_stderr(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn write_notifications(
        &self,
        out: &mut dyn Write,
        notifications: &[Notification],
    ) -> io::Result<()> {
        for notification in notifications {
            match self.format {
                OutputFormat::Human => {
                    let glyph = notification_glyph(notification.kind);
                    writeln!(
                        out,
                        "{} {}",
                        self.paint(glyph, notification.kind.tone()),
                        notification.message
                    )?;
                }
                OutputFormat::Json => {
                    writeln!(
                        out,
                        "{}",
                        serde_json::json!({
                            "status": notification.kind,
                            "message": notification.message
                        })
                    )?;
                }
                OutputFormat::Quiet => {}
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    fn status_label(&self, status: Option<ReadingStatus>) -> String {
        match status {
            Some(status) => self.paint(
                &format!("{} {}", status_glyph(Some(status)), status.as_str()),
                status.tone(),
            ),
            None => String::new(),
        }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_string();
        }
        text.with(tone_color(tone)).to_string()
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Primary => Color::Blue,
        Tone::Accent => Color::Magenta,
        Tone::Warn => Color::Red,
    }
}

/// Terminal stand-ins for the status icons
fn status_glyph(status: Option<ReadingStatus>) -> &'static str {
    match ReadingStatus::icon(status) {
        "bookmark_border" => "☐",
        "auto_stories" => "◐",
        "check_circle" => "✓",
        _ => "·",
    }
}

fn notification_glyph(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "✓",
        NotificationKind::Error => "✗",
        NotificationKind::Warning => "!",
        NotificationKind::Info => "i",
    }
}

fn plural_y(n: usize) -> &'static str {
    if n == 1 {
        "y"
    } else {
        "ies"
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::Notifier;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("Cien años de soledad", 8), "Cien ...");
    }

    #[test]
    fn test_status_glyph() {
        assert_eq!(status_glyph(None), "·");
        assert_eq!(status_glyph(Some(ReadingStatus::Read)), "✓");
        assert_eq!(status_glyph(Some(ReadingStatus::WantToRead)), "☐");
    }

    #[test]
    fn test_no_color_outside_human() {
        let output = Output::new(OutputFormat::Json);
        assert_eq!(output.paint("Fiction", Tone::Primary), "Fiction");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural_y(1), "y");
        assert_eq!(plural_y(3), "ies");
    }

    #[test]
    fn test_json_notifications_stay_off_stdout() {
        let json = Output::new(OutputFormat::Json);
        assert!(json.notifications_on_stderr());
        assert!(!Output::new(OutputFormat::Human).notifications_on_stderr());

        let notifier = Notifier::new();
        notifier.success("Book updated successfully");
        notifier.error("Please fill in all required fields correctly");

        let mut buf = Vec::new();
        json.write_notifications(&mut buf, &notifier.snapshot()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["status"], "success");
        assert_eq!(lines[1]["message"], "Please fill in all required fields correctly");
    }

    #[test]
    fn test_quiet_notifications_write_nothing() {
        let notifier = Notifier::new();
        notifier.info("Loading");

        let mut buf = Vec::new();
        Output::new(OutputFormat::Quiet)
            .write_notifications(&mut buf, &notifier.snapshot())
            .unwrap();
        assert!(buf.is_empty());
    }
}
