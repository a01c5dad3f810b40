//! Command templates and shell escaping.
//!
//! A [`Command`] is an ordered list of literal fragments interleaved with
//! typed [`Value`]s. Rendering escapes every value according to its kind and
//! collapses whitespace in the literal text, so a multi-line template logs as
//! one readable line.
//!
//! # Example
//!
//! ```
//! use shellbracket::cmd;
//!
//! let files = vec!["a b.txt", "c.txt"];
//! let command = cmd!("tar czf {} {}", "out.tgz", files).unwrap();
//! assert_eq!(command.render(), "tar czf out.tgz 'a b.txt' c.txt");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, ShellError};

/// Regex matching runs of whitespace in literal fragments.
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE must compile"));

/// Placeholder that separates fragments in a [`Command::parse`] template.
const PLACEHOLDER: &str = "{}";

/// A value interpolated into a command template.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text, escaped as a single shell token.
    Str(String),
    /// A number, pre-formatted and escaped as a single shell token.
    Number(String),
    /// Rendered as the bare token `true` or `false`.
    Bool(bool),
    /// Each element formatted recursively, joined by one space.
    Array(Vec<Value>),
    /// Already-safe text inserted verbatim.
    Raw(String),
    /// Anything else, stringified without an escaping guarantee.
    Other(String),
}

/// Marker for text that must be inserted into a command without escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub String);

impl Raw {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Value {
    /// Wrap pre-escaped text.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    /// Stringify an arbitrary displayable value. The result is not escaped.
    pub fn other(value: &dyn fmt::Display) -> Self {
        Self::Other(value.to_string())
    }

    /// Format this value as shell text.
    pub fn format(&self) -> String {
        match self {
            Self::Raw(text) => text.clone(),
            Self::Str(text) | Self::Number(text) => escape(text),
            Self::Bool(flag) => flag.to_string(),
            Self::Array(items) => items
                .iter()
                .map(Value::format)
                .collect::<Vec<_>>()
                .join(" "),
            Self::Other(text) => text.clone(),
        }
    }
}

impl From<Raw> for Value {
    fn from(raw: Raw) -> Self {
        Self::Raw(raw.0)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<&Path> for Value {
    fn from(path: &Path) -> Self {
        Self::Str(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        Self::from(path.as_path())
    }
}

impl From<&PathBuf> for Value {
    fn from(path: &PathBuf) -> Self {
        Self::from(path.as_path())
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

macro_rules! number_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Self::Number(n.to_string())
                }
            }
        )*
    };
}

number_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(items: &[T]) -> Self {
        Self::Array(items.iter().cloned().map(Into::into).collect())
    }
}

/// Escape `s` as a single shell token.
///
/// Strings made only of characters the shell never interprets are returned
/// bare. Everything else is single-quoted, with embedded quotes spliced as
/// `'\''`.
pub fn escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().all(is_safe_char) {
        return s.to_string();
    }
    quote(s)
}

/// Single-quote `s` unconditionally.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '@' | '%' | '+' | ',')
}

/// Collapse every run of whitespace to a single space.
fn normalize(fragment: &str) -> String {
    WHITESPACE.replace_all(fragment, " ").into_owned()
}

/// A command template: literal fragments with values between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    fragments: Vec<String>,
    values: Vec<Value>,
}

impl Command {
    /// Build a command from fragments and values.
    ///
    /// There must be exactly one more fragment than there are values.
    pub fn new<S: Into<String>>(fragments: Vec<S>, values: Vec<Value>) -> Result<Self> {
        let fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
        if fragments.len() != values.len() + 1 {
            return Err(ShellError::Template {
                fragments: fragments.len(),
                values: values.len(),
                expected: values.len() + 1,
            });
        }
        Ok(Self { fragments, values })
    }

    /// A command with no interpolated values.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            fragments: vec![text.into()],
            values: Vec::new(),
        }
    }

    /// `program` followed by each argument, separated by single spaces.
    pub fn from_args(program: &str, args: Vec<Value>) -> Self {
        if args.is_empty() {
            return Self::literal(program);
        }
        let mut fragments = Vec::with_capacity(args.len() + 1);
        fragments.push(format!("{} ", program));
        fragments.extend(std::iter::repeat_n(" ".to_string(), args.len() - 1));
        fragments.push(String::new());
        Self {
            fragments,
            values: args,
        }
    }

    /// Every element of `argv` escaped and separated by single spaces.
    pub fn from_argv<I, V>(argv: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = argv.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Self::literal("");
        }
        let mut fragments = vec![String::new()];
        fragments.extend(std::iter::repeat_n(" ".to_string(), values.len() - 1));
        fragments.push(String::new());
        Self { fragments, values }
    }

    /// Split `template` on `{}` placeholders and pair the pieces with `values`.
    pub fn parse(template: &str, values: Vec<Value>) -> Result<Self> {
        Self::new(template.split(PLACEHOLDER).collect(), values)
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Render the escaped command string.
    pub fn render(&self) -> String {
        let mut out = normalize(&self.fragments[0]);
        for (value, fragment) in self.values.iter().zip(&self.fragments[1..]) {
            out.push_str(&value.format());
            out.push_str(&normalize(fragment));
        }
        out
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Build a [`Command`] from a `{}` template and values.
///
/// Each value is converted with [`Value::from`], so strings, numbers, booleans,
/// vectors and [`Raw`] all work directly. Evaluates to
/// `Result<Command, ShellError>`.
#[macro_export]
macro_rules! cmd {
    ($template:expr $(, $value:expr)* $(,)?) => {
        $crate::shell::Command::parse(
            $template,
            vec![$($crate::shell::Value::from($value)),*],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_leaves_safe_tokens_bare() {
        assert_eq!(escape("hello"), "hello");
        assert_eq!(escape("/usr/local/bin"), "/usr/local/bin");
        assert_eq!(escape("user@host:22"), "user@host:22");
        assert_eq!(escape("-1.5"), "-1.5");
    }

    #[test]
    fn escape_quotes_unsafe_tokens() {
        assert_eq!(escape("a b"), "'a b'");
        assert_eq!(escape("$HOME"), "'$HOME'");
        assert_eq!(escape("x;rm -rf /"), "'x;rm -rf /'");
    }

    #[test]
    fn escape_splices_single_quotes() {
        assert_eq!(escape("it's"), r"'it'\''s'");
    }

    #[test]
    fn escape_empty_string() {
        assert_eq!(escape(""), "''");
    }

    #[test]
    fn quote_always_wraps() {
        assert_eq!(quote("/tmp"), "'/tmp'");
    }

    #[test]
    fn bool_false_renders_as_token() {
        let command = Command::new(vec!["test ", ""], vec![Value::Bool(false)]).unwrap();
        assert_eq!(command.render(), "test false");
    }

    #[test]
    fn raw_value_is_verbatim() {
        let raw = "$(echo 'hi') | grep \"h\"";
        let command = Command::new(vec!["", ""], vec![Value::raw(raw)]).unwrap();
        assert_eq!(command.render(), raw);
    }

    #[test]
    fn array_joins_with_single_space() {
        let command = cmd!("rm {}", vec!["a", "b c", "d"]).unwrap();
        assert_eq!(command.render(), "rm a 'b c' d");
    }

    #[test]
    fn empty_array_renders_nothing() {
        let command = cmd!("ls {}", Vec::<String>::new()).unwrap();
        assert_eq!(command.render(), "ls ");
    }

    #[test]
    fn nested_arrays_flatten_recursively() {
        let value = Value::Array(vec![
            Value::from("x"),
            Value::Array(vec![Value::from(1), Value::from(true)]),
        ]);
        assert_eq!(value.format(), "x 1 true");
    }

    #[test]
    fn numbers_render_plainly() {
        let command = cmd!("head -n {} -c {}", 5, 2.5).unwrap();
        assert_eq!(command.render(), "head -n 5 -c 2.5");
    }

    #[test]
    fn other_values_are_stringified() {
        let addr = std::net::Ipv4Addr::new(10, 0, 0, 1);
        let command = Command::new(vec!["ping ", ""], vec![Value::other(&addr)]).unwrap();
        assert_eq!(command.render(), "ping 10.0.0.1");
    }

    #[test]
    fn whitespace_in_fragments_collapses() {
        let command = cmd!(
            "docker run
                --rm
                {}",
            "alpine"
        )
        .unwrap();
        assert_eq!(command.render(), "docker run --rm alpine");
    }

    #[test]
    fn values_do_not_alter_fragments() {
        let command = cmd!("echo {} >  {}", "a  b", "out").unwrap();
        assert_eq!(command.render(), "echo 'a  b' > out");
    }

    #[test]
    fn fragment_count_must_exceed_values_by_one() {
        let err = Command::new(vec!["a", "b"], vec![]).unwrap_err();
        assert!(matches!(err, ShellError::Template { expected: 1, .. }));
        assert!(cmd!("echo {} {}", "one").is_err());
    }

    #[test]
    fn literal_has_no_values() {
        let command = Command::literal("uname -a");
        assert_eq!(command.fragments().len(), 1);
        assert!(command.values().is_empty());
        assert_eq!(command.to_string(), "uname -a");
    }

    #[test]
    fn from_args_spaces_arguments() {
        let command = Command::from_args(
            "git",
            vec![Value::from("commit"), Value::from("-m"), Value::from("first try")],
        );
        assert_eq!(command.render(), "git commit -m 'first try'");
        assert_eq!(command.fragments().len(), command.values().len() + 1);
        assert_eq!(Command::from_args("ls", vec![]).render(), "ls");
    }

    #[test]
    fn from_argv_escapes_program_too() {
        let command = Command::from_argv(["my  tool", "--flag", "a b"]);
        assert_eq!(command.render(), "'my  tool' --flag 'a b'");
        assert_eq!(Command::from_argv(Vec::<String>::new()).render(), "");
    }

    #[test]
    fn paths_are_escaped() {
        let command = cmd!("cat {}", PathBuf::from("/tmp/my file")).unwrap();
        assert_eq!(command.render(), "cat '/tmp/my file'");
    }

    #[test]
    fn raw_marker_converts() {
        let command = cmd!("echo {}", Raw::new("$PATH")).unwrap();
        assert_eq!(command.render(), "echo $PATH");
    }
}
