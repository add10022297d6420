//! Path pattern predicates.
//!
//! A pattern is either a literal path (exact match) or a prefix followed by
//! the trailing wildcard marker `**`, meaning the prefix itself or anything
//! lexically below it. Any other text, `*` and `%` included, is literal.
//! Patterns compile into a list of `(column, operator, value)` conditions
//! joined by OR. Values are always bound as statement parameters; LIKE
//! escaping happens only in this module.

use std::fmt;

pub const WILDCARD_MARKER: &str = "**";
const LIKE_ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Subtree(String),
}

impl PathPattern {
    /// Parse the textual form. A literal path that itself ends in `**` can
    /// only be matched by building [`PathPattern::Exact`] directly.
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix(WILDCARD_MARKER) {
            Some(prefix) => PathPattern::Subtree(prefix.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    fn conditions(&self) -> Vec<Condition> {
        match self {
            PathPattern::Exact(path) => vec![Condition::new(Column::Path, Operator::Eq, path)],
            PathPattern::Subtree(prefix) => {
                let mut conds = vec![Condition::new(
                    Column::Path,
                    Operator::Like,
                    format!("{}%", escape_like(prefix)),
                )];
                // "/a/**" also matches a directory recorded as "/a"
                if prefix.len() > 1 {
                    if let Some(base) = prefix.strip_suffix('/') {
                        conds.push(Condition::new(Column::Path, Operator::Eq, base));
                    }
                }
                conds
            }
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Exact(path) => f.write_str(path),
            PathPattern::Subtree(prefix) => write!(f, "{}{}", prefix, WILDCARD_MARKER),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Path,
}

impl Column {
    fn as_sql(self) -> &'static str {
        match self {
            Column::Path => "fileinfo.path",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Like,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: Column,
    pub op: Operator,
    pub value: String,
}

impl Condition {
    pub fn new(column: Column, op: Operator, value: impl Into<String>) -> Self {
        Self {
            column,
            op,
            value: value.into(),
        }
    }

    /// Render with the `?N` placeholder `index`.
    fn to_sql(&self, index: usize) -> String {
        match self.op {
            Operator::Eq => format!("{} = ?{}", self.column.as_sql(), index),
            Operator::Like => format!(
                "{} LIKE ?{} ESCAPE '{}'",
                self.column.as_sql(),
                index,
                LIKE_ESCAPE
            ),
        }
    }

    /// Render a group of same-operator conditions bound as one JSON array
    /// parameter, expanded by SQLite's `json_each`.
    fn group_to_sql(column: Column, op: Operator, index: usize) -> String {
        match op {
            Operator::Eq => format!(
                "{} IN (SELECT value FROM json_each(?{}))",
                column.as_sql(),
                index
            ),
            Operator::Like => format!(
                "EXISTS (SELECT 1 FROM json_each(?{}) AS p WHERE {} LIKE p.value ESCAPE '{}')",
                index,
                column.as_sql(),
                LIKE_ESCAPE
            ),
        }
    }
}

/// OR-combination of the conditions of every input pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPredicate {
    conditions: Vec<Condition>,
}

impl PathPredicate {
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Self {
        let parsed: Vec<PathPattern> = patterns.iter().map(|p| PathPattern::parse(p.as_ref())).collect();
        Self::from_path_patterns(&parsed)
    }

    pub fn from_path_patterns(patterns: &[PathPattern]) -> Self {
        let conditions = patterns.iter().flat_map(PathPattern::conditions).collect();
        Self { conditions }
    }

    /// An empty predicate matches nothing.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// SQL boolean expression plus its parameters, in placeholder order.
    ///
    /// Conditions sharing an operator are bound together as a single JSON
    /// array, so the statement holds at most two parameters and a flat
    /// expression no matter how many patterns were given.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        if self.conditions.is_empty() {
            return ("0".to_string(), Vec::new());
        }
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for op in [Operator::Eq, Operator::Like] {
            let group: Vec<&Condition> = self.conditions.iter().filter(|c| c.op == op).collect();
            match group.as_slice() {
                [] => {}
                [single] => {
                    params.push(single.value.clone());
                    clauses.push(single.to_sql(params.len()));
                }
                _ => {
                    let values: Vec<&str> = group.iter().map(|c| c.value.as_str()).collect();
                    params.push(serde_json::Value::from(values).to_string());
                    clauses.push(Condition::group_to_sql(Column::Path, op, params.len()));
                }
            }
        }
        (format!("({})", clauses.join(" OR ")), params)
    }
}

impl fmt::Display for PathPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (clause, params) = self.to_sql();
        write!(f, "{} {:?}", clause, params)
    }
}

/// Escape LIKE metacharacters so they match literally.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}
