use std::fmt::{Display, Formatter, Result as FormatResult};

/// Concrete location handed to the resource locator.
///
/// Either `<app_base><relative>` or a passthrough URI exactly as the host encoded it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocation(String);

impl ResourceLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Text after the final `/`. Empty for directory-like locations.
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl Display for ResourceLocation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ResourceLocation {
    fn from(location: &str) -> Self {
        Self::new(location)
    }
}
