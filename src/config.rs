//! Discovery configuration for the CLI.

use std::collections::BTreeSet;

use crate::model::{Conditions, TypeName};

/// Discovery configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverConfig {
    /// Marker type whose instances gate the branch they are attached to
    pub gate: Option<TypeName>,
    /// Flags a gating instance can refer to with `flag` / `unless`
    pub flags: BTreeSet<String>,
    /// Never expand the meta-metadata of built-in structural markers
    pub builtins_terminal: bool,
    /// How results are printed
    pub format: OutputFormat,
}

/// Output format for discovery results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            gate: None,
            flags: BTreeSet::new(),
            builtins_terminal: true,
            format: OutputFormat::Text,
        }
    }
}

impl DiscoverConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gating marker type
    pub fn with_gate(mut self, gate: impl Into<TypeName>) -> Self {
        self.gate = Some(gate.into());
        self
    }

    /// Enable one flag
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// Enable several flags
    pub fn with_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Choose whether built-in markers are terminal
    pub fn with_builtins_terminal(mut self, terminal: bool) -> Self {
        self.builtins_terminal = terminal;
        self
    }

    /// Set the output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Flag set for evaluating gating instances
    pub fn conditions(&self) -> Conditions {
        Conditions::new(self.flags.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttrValue, Instance};

    // ========================================
    // Default config tests
    // ========================================

    #[test]
    fn test_default_config_has_no_gate() {
        let config = DiscoverConfig::default();
        assert_eq!(config.gate, None);
    }

    #[test]
    fn test_default_config_has_no_flags() {
        let config = DiscoverConfig::default();
        assert!(config.flags.is_empty());
    }

    #[test]
    fn test_default_config_builtins_terminal() {
        let config = DiscoverConfig::default();
        assert!(config.builtins_terminal);
    }

    #[test]
    fn test_default_config_format() {
        let config = DiscoverConfig::default();
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_new_equals_default() {
        assert_eq!(DiscoverConfig::new(), DiscoverConfig::default());
    }

    // ========================================
    // Builder method tests
    // ========================================

    #[test]
    fn test_with_gate() {
        let config = DiscoverConfig::new().with_gate("Conditional");
        assert_eq!(config.gate, Some(TypeName::new("Conditional")));
        // Other fields unchanged
        assert!(config.builtins_terminal);
    }

    #[test]
    fn test_with_flag_deduplicates() {
        let config = DiscoverConfig::new().with_flag("slow").with_flag("slow");
        assert_eq!(config.flags.len(), 1);
    }

    #[test]
    fn test_with_flags() {
        let config = DiscoverConfig::new().with_flags(["b", "a"]);
        assert_eq!(config.flags.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_with_builtins_terminal() {
        let config = DiscoverConfig::new().with_builtins_terminal(false);
        assert!(!config.builtins_terminal);
    }

    #[test]
    fn test_with_format() {
        let config = DiscoverConfig::new().with_format(OutputFormat::Json);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_chained_builders() {
        let config = DiscoverConfig::new()
            .with_gate("Conditional")
            .with_flag("slow")
            .with_builtins_terminal(false)
            .with_format(OutputFormat::Json);
        assert_eq!(config.gate.as_ref().map(TypeName::as_str), Some("Conditional"));
        assert!(config.flags.contains("slow"));
        assert!(!config.builtins_terminal);
        assert_eq!(config.format, OutputFormat::Json);
    }

    // ========================================
    // Conditions
    // ========================================

    #[test]
    fn test_conditions_see_enabled_flags() {
        let gate = Instance::marker("Conditional").with_attr("flag", AttrValue::Text("slow".into()));
        assert!(!DiscoverConfig::new().conditions().evaluate(&gate));
        assert!(DiscoverConfig::new().with_flag("slow").conditions().evaluate(&gate));
    }
}
