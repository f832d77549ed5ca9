use std::fmt::Display;

/// One physical line of a source file. Line numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    number: usize,
    content: String,
}

impl Line {
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{: >4} | {}", self.number, self.content)
    }
}

/// The lines of one compilation unit, in file order.
///
/// Neighbouring lines are reached through `prev` and `next` rather than stored links,
/// so a `Line` never owns (or outlives) its siblings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Source {
    lines: Vec<Line>,
}

impl Source {
    pub fn new(text: &str) -> Self {
        Source::from_lines(text.lines())
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Source {
            lines: lines
                .into_iter()
                .enumerate()
                .map(|(idx, content)| Line {
                    number: idx + 1,
                    content: content.into(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    pub fn get(&self, number: usize) -> Option<&Line> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
    }

    pub fn prev(&self, line: &Line) -> Option<&Line> {
        self.get(line.number - 1)
    }

    pub fn next(&self, line: &Line) -> Option<&Line> {
        self.get(line.number + 1)
    }
}
