//! Parse state threaded through a single validation call.

use serde::Deserialize;

use super::issue::{Issue, IssueCode, PathSegment};

/// Default maximum nesting depth accepted while parsing.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ParseOptions {
    /// Maximum number of nested object keys / array indices.
    pub max_depth: usize,
}

impl ParseOptions {
    /// Set the maximum depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

pub(crate) struct ParseContext {
    max_depth: usize,
    path: Vec<PathSegment>,
    issues: Vec<Issue>,
}

impl ParseContext {
    pub(crate) fn new(options: &ParseOptions) -> Self {
        Self {
            max_depth: options.max_depth,
            path: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// A context at the same position with no issues, used to try union
    /// alternatives in isolation.
    pub(crate) fn fork(&self) -> Self {
        Self {
            max_depth: self.max_depth,
            path: self.path.clone(),
            issues: Vec::new(),
        }
    }

    pub(crate) fn absorb(&mut self, other: ParseContext) {
        self.issues.extend(other.issues);
    }

    pub(crate) fn report(&mut self, code: IssueCode) {
        self.issues.push(Issue::new(self.path.clone(), code));
    }

    /// Report an issue one key below the current position.
    pub(crate) fn report_at(&mut self, key: &str, code: IssueCode) {
        let mut path = self.path.clone();
        path.push(PathSegment::Key(key.to_string()));
        self.issues.push(Issue::new(path, code));
    }

    pub(crate) fn report_relative(&mut self, issue: Issue) {
        let mut path = self.path.clone();
        path.extend(issue.path);
        self.issues.push(Issue::new(path, issue.code));
    }

    /// Descend one level. Returns `false` (and reports) when the depth limit
    /// would be exceeded; the caller must not call `leave` in that case.
    pub(crate) fn enter(&mut self, segment: PathSegment) -> bool {
        if self.path.len() >= self.max_depth {
            self.report(IssueCode::DepthExceeded {
                max_depth: self.max_depth,
            });
            return false;
        }
        self.path.push(segment);
        true
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    /// True when every issue is a type mismatch at the current position,
    /// meaning the alternative never matched the value's shape at all.
    pub(crate) fn only_shape_mismatch(&self) -> bool {
        self.issues.iter().all(|issue| {
            issue.path.len() == self.path.len()
                && matches!(
                    issue.code,
                    IssueCode::InvalidType { .. }
                        | IssueCode::InvalidLiteral { .. }
                        | IssueCode::InvalidUnion
                )
        })
    }

    pub(crate) fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_limit() {
        let mut cx = ParseContext::new(&ParseOptions::default().with_max_depth(1));
        assert!(cx.enter(PathSegment::Key("a".into())));
        assert!(!cx.enter(PathSegment::Key("b".into())));
        cx.leave();

        let issues = cx.into_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::DepthExceeded { max_depth: 1 });
        assert_eq!(issues[0].path_string(), "a");
    }

    #[test]
    fn test_fork_keeps_position() {
        let mut cx = ParseContext::new(&ParseOptions::default());
        cx.enter(PathSegment::Key("where".into()));
        let mut fork = cx.fork();
        fork.report(IssueCode::Required);
        assert!(!fork.only_shape_mismatch());
        cx.absorb(fork);
        assert_eq!(cx.into_issues()[0].path_string(), "where");
    }
}
