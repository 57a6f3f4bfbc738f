/// Default cap on search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Filters for a spec search. Unset or empty filters match everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Case-insensitive substring of name, description or system instruction.
    pub text: Option<String>,
    /// Every tag listed here must be present on a match.
    pub tags: Vec<String>,
    pub provider: Option<String>,
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            tags: Vec::new(),
            provider: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// The text filter, if it is set and non-empty.
    pub fn text_filter(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// The provider filter, if it is set and non-empty.
    pub fn provider_filter(&self) -> Option<&str> {
        self.provider.as_deref().filter(|p| !p.is_empty())
    }
}
