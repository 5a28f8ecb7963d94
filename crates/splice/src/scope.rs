use crate::classify::closes_scope;

/// One open `impl`/`trait` scope on the original side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    /// Canonical scope name
    pub name: String,
    /// Leading whitespace of the header line
    pub indent: String,
}

/// Stack of open scopes, bottomed by a file-scope sentinel.
///
/// Nesting is tracked by indentation only: a frame is popped by a `}` line
/// whose indentation equals the frame's header indentation.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![ScopeFrame {
                name: String::new(),
                indent: String::new(),
            }],
        }
    }

    pub fn push(&mut self, name: impl Into<String>, indent: impl Into<String>) {
        self.frames.push(ScopeFrame {
            name: name.into(),
            indent: indent.into(),
        });
    }

    /// Innermost scope name, `None` at file scope
    pub fn current(&self) -> Option<&str> {
        if self.frames.len() > 1 {
            self.frames.last().map(|frame| frame.name.as_str())
        } else {
            None
        }
    }

    fn top_indent(&self) -> &str {
        self.frames
            .last()
            .map(|frame| frame.indent.as_str())
            .unwrap_or_default()
    }

    /// Consume `raw` if it closes the innermost scope.
    ///
    /// Returns whether the line was a closing line at the top frame's
    /// indentation. The sentinel is never popped, but a matching `}` at file
    /// scope still counts as consumed.
    pub fn close(&mut self, raw: &str) -> bool {
        if !closes_scope(raw, self.top_indent()) {
            return false;
        }
        if self.frames.len() > 1 {
            self.frames.pop();
        }
        true
    }

    /// Number of open scopes, sentinel excluded
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_file_scope() {
        let stack = ScopeStack::new();
        assert_eq!(stack.current(), None);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_pop_requires_matching_indentation() {
        let mut stack = ScopeStack::new();
        stack.push("Outer", "");
        stack.push("Inner", "    ");

        // a method body closing deeper than the frame
        assert!(!stack.close("        }"));
        assert_eq!(stack.current(), Some("Inner"));

        assert!(stack.close("    }"));
        assert_eq!(stack.current(), Some("Outer"));

        assert!(stack.close("}"));
        assert_eq!(stack.current(), None);
    }

    #[test]
    fn test_sentinel_is_never_popped() {
        let mut stack = ScopeStack::new();
        assert!(stack.close("}"));
        assert!(stack.close("}"));
        assert_eq!(stack.depth(), 0);
        stack.push("Foo", "");
        assert_eq!(stack.current(), Some("Foo"));
    }
}
