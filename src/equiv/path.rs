// Sat Jul 25 2026 - Alex

use std::fmt;

use serde::Serialize;

/// One hop taken while walking a pair of types in lock step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PathStep {
    /// Field at `index` on both sides. The names differ only when loose
    /// matching paired fields positionally.
    Field { index: usize, left: String, right: String },
    Element,
    Pointee,
    Param { index: usize },
    Return,
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Field { left, right, .. } if left == right => write!(f, ".{left}"),
            PathStep::Field { left, right, .. } => write!(f, ".{left}|{right}"),
            PathStep::Element => write!(f, "[]"),
            PathStep::Pointee => write!(f, "*"),
            PathStep::Param { index } => write!(f, "(arg {index})"),
            PathStep::Return => write!(f, "(ret)"),
        }
    }
}

/// Where inside the compared pair a divergence was found, from the roots
/// down. Empty means the roots themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct DivergePath(pub Vec<PathStep>);

impl fmt::Display for DivergePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<root>")?;
        for step in &self.0 {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_renders_like_a_member_expression() {
        let path = DivergePath(vec![
            PathStep::Field { index: 1, left: "next".into(), right: "next".into() },
            PathStep::Pointee,
            PathStep::Field { index: 0, left: "value".into(), right: "val".into() },
        ]);
        assert_eq!(path.to_string(), "<root>.next*.value|val");
    }

    #[test]
    fn test_empty_path_is_the_root() {
        assert_eq!(DivergePath::default().to_string(), "<root>");
    }
}
