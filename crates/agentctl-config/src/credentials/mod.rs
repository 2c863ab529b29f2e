//! Credential lookup behind a single source interface.
//!
//! Each place a secret may live (process environment, the stored config
//! document, a shell profile) is one [`CredentialSource`]. The
//! [`CredentialResolver`] only knows the order to try them in, so a source
//! can be dropped or replaced without touching the ordering logic.

mod resolver;
mod source;

pub use resolver::{CredentialResolver, ResolvedCredential};
pub use source::{ConfigEntrySource, CredentialSource, EnvVarSource, ShellProfileSource};

/// Whether a found value is a real secret rather than a template stub.
///
/// Rejects empty strings, `${NAME}` placeholders and `<your-token>` style
/// markers left in example configs.
pub(crate) fn is_usable_secret(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || value.starts_with("${")
        || (value.starts_with('<') && value.ends_with('>')))
}

#[cfg(test)]
mod tests {
    use super::is_usable_secret;

    #[test]
    fn template_values_are_not_secrets() {
        assert!(is_usable_secret("ghp_123"));
        assert!(!is_usable_secret(""));
        assert!(!is_usable_secret("   "));
        assert!(!is_usable_secret("${GITHUB_TOKEN}"));
        assert!(!is_usable_secret("<your-token>"));
    }
}
