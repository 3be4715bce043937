pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options for `compile_expression_with` / `compile_template_with`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Deepest allowed nesting of block bodies, parenthesised groups and
    /// binary operators.
    pub max_depth: usize,
    /// Template name shown in diagnostics.
    pub name: String,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            name: "template".to_string(),
        }
    }
}
