//! Visual theme and styling.

use console::Style;

use super::stream::OutputStream;

/// Bracket header glyph.
pub const HEADER_GLYPH: &str = "┌";
/// Prefix for every line written inside a bracket.
pub const BODY_GLYPH: &str = "│ ";
/// Bracket footer glyph.
pub const FOOTER_GLYPH: &str = "└";
/// Bullet in front of a task description.
pub const TASK_GLYPH: &str = "•";

/// Styles for brackets, tasks, command logs and exit badges.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Style for box-drawing borders (dim).
    pub border: Style,
    /// Style for bracket titles (bold).
    pub title: Style,
    /// Style for bracket detail lines (dim).
    pub detail: Style,
    /// Style for task bullets (magenta).
    pub task: Style,
    /// Style for commands shown in output (dim italic).
    pub command: Style,
    /// Style for error banners (red bold).
    pub error: Style,
    /// Exit-code badge for a zero exit (green background).
    pub badge_ok: Style,
    /// Exit-code badge for a non-zero exit (red background).
    pub badge_fail: Style,
    /// Style for captured output echoed back (dim).
    pub output: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    /// Create the colored theme.
    ///
    /// Styling is forced on; use [`Theme::for_stream`] to pick between this
    /// and [`Theme::plain`] based on the target.
    pub fn new() -> Self {
        let forced = Style::new().force_styling(true);
        Self {
            border: forced.clone().dim(),
            title: forced.clone().bold(),
            detail: forced.clone().dim(),
            task: forced.clone().magenta(),
            command: forced.clone().dim().italic(),
            error: forced.clone().red().bold(),
            badge_ok: forced.clone().black().on_green().bold(),
            badge_fail: forced.clone().white().on_red().bold(),
            output: forced.dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or `NO_COLOR`).
    pub fn plain() -> Self {
        Self {
            border: Style::new(),
            title: Style::new(),
            detail: Style::new(),
            task: Style::new(),
            command: Style::new(),
            error: Style::new(),
            badge_ok: Style::new(),
            badge_fail: Style::new(),
            output: Style::new(),
        }
    }

    /// Colored if `stream` is a terminal and colors are allowed, plain otherwise.
    pub fn for_stream(stream: &OutputStream) -> Self {
        if should_use_colors(stream) {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Format a bracket header line.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.border.apply_to(HEADER_GLYPH),
            self.title.apply_to(title)
        )
    }

    /// Format a bracket detail line.
    pub fn format_detail(&self, detail: &str) -> String {
        format!(
            "{}{}",
            self.border.apply_to(BODY_GLYPH),
            self.detail.apply_to(detail)
        )
    }

    /// The prefix written before each line inside a bracket.
    pub fn body_prefix(&self) -> String {
        self.border.apply_to(BODY_GLYPH).to_string()
    }

    /// Format a bracket footer line.
    pub fn format_footer(&self) -> String {
        self.border.apply_to(FOOTER_GLYPH).to_string()
    }

    /// Format a task description.
    pub fn format_task(&self, description: &str) -> String {
        format!("{} {}", self.task.apply_to(TASK_GLYPH), description)
    }

    /// Format a command log line.
    pub fn format_command(&self, command: &str) -> String {
        format!("{}", self.command.apply_to(format!("$ {}", command)))
    }

    /// Format an exit-code badge.
    pub fn format_badge(&self, code: i32) -> String {
        let style = if code == 0 {
            &self.badge_ok
        } else {
            &self.badge_fail
        };
        format!("{}", style.apply_to(format!(" {} ", code)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }
}

/// Check if colors should be enabled for `stream`.
pub fn should_use_colors(stream: &OutputStream) -> bool {
    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    stream.is_interactive()
}
