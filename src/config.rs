//! Verifier configuration.

/// Qualified name of the annotation that declares a domain.
pub const MAGIC_CONSTANT: &str = "org.intellij.lang.annotations.MagicConstant";

/// Tunables of a [`Verifier`][crate::verifier::Verifier].
///
/// ```
/// use magic_rs::config::VerifierConfig;
///
/// let config = VerifierConfig::default().with_display_limit(80).with_on_the_fly(false);
/// assert_eq!(config.max_annotation_depth, 5);
/// assert!(!config.on_the_fly);
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VerifierConfig {
    /// Annotation type recognized as a domain declaration.
    pub magic_annotation: String,
    /// Meta-annotation chains deeper than this resolve to no domain.
    pub max_annotation_depth: usize,
    /// Maximum length of the allowed-values text in diagnostics.
    pub display_limit: usize,
    /// Interactive (`true`) or batch (`false`) analysis; forwarded to the slicer.
    pub on_the_fly: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            magic_annotation: MAGIC_CONSTANT.to_string(),
            max_annotation_depth: 5,
            display_limit: 300,
            on_the_fly: true,
        }
    }
}

impl VerifierConfig {
    pub fn with_magic_annotation(mut self, qualified_name: &str) -> Self {
        self.magic_annotation = qualified_name.to_string();
        self
    }

    pub fn with_max_annotation_depth(mut self, depth: usize) -> Self {
        self.max_annotation_depth = depth;
        self
    }

    pub fn with_display_limit(mut self, limit: usize) -> Self {
        self.display_limit = limit;
        self
    }

    pub fn with_on_the_fly(mut self, on_the_fly: bool) -> Self {
        self.on_the_fly = on_the_fly;
        self
    }
}
