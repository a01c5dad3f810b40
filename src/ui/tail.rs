//! Bounded tails of captured command output.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How much of a command's output to echo back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tail {
    /// Every non-blank line.
    #[default]
    All,
    /// Only the last `n` non-blank lines.
    Last(usize),
}

impl Tail {
    /// `Tail::Last(n)` for `Some(n)`, `Tail::All` otherwise.
    pub fn from_limit(limit: Option<usize>) -> Self {
        limit.map_or(Self::All, Self::Last)
    }
}

/// The non-blank lines of `text` selected by `tail`, in order.
pub fn tail_lines(text: &str, tail: Tail) -> Vec<&str> {
    let lines = text.lines().filter(|line| !line.trim().is_empty());
    match tail {
        Tail::All => lines.collect(),
        Tail::Last(max_lines) => {
            let mut buf: VecDeque<&str> = VecDeque::with_capacity(max_lines);
            for line in lines {
                if max_lines == 0 {
                    break;
                }
                if buf.len() == max_lines {
                    buf.pop_front();
                }
                buf.push_back(line);
            }
            buf.into_iter().collect()
        }
    }
}
