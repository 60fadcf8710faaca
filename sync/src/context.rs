//! Detection of automated (CI) execution.
//!
//! The fallback version is only tried when the process runs under
//! automation, signalled by a single environment variable.

use std::ffi::OsString;

/// Environment variable GitHub Actions sets on every runner.
pub const DEFAULT_CI_ENV_VAR: &str = "GITHUB_ACTIONS";

/// Whether the process runs interactively or under automation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A developer machine: primary failures are final.
    #[default]
    Interactive,
    /// A CI runner: primary failures may fall back to another version.
    Automated,
}

impl ExecutionContext {
    /// Detect the context from the process environment.
    #[must_use]
    pub fn detect(env_var: &str) -> Self {
        Self::detect_with(env_var, |name| std::env::var_os(name))
    }

    /// Detect the context using an injected environment lookup.
    ///
    /// A variable that is set to a non-empty value marks the process as
    /// automated.
    ///
    /// ```
    /// use wasm_artefact_sync::context::ExecutionContext;
    ///
    /// let ctx = ExecutionContext::detect_with("CI", |_| Some("true".into()));
    /// assert!(ctx.allows_fallback());
    /// let ctx = ExecutionContext::detect_with("CI", |_| Some("".into()));
    /// assert!(!ctx.allows_fallback());
    /// ```
    #[must_use]
    pub fn detect_with<F>(env_var: &str, lookup: F) -> Self
    where
        F: FnOnce(&str) -> Option<OsString>,
    {
        match lookup(env_var) {
            Some(value) if !value.is_empty() => Self::Automated,
            _ => Self::Interactive,
        }
    }

    /// Whether a failed primary attempt may be retried with the fallback.
    #[must_use]
    pub const fn allows_fallback(self) -> bool {
        matches!(self, Self::Automated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unset(None, ExecutionContext::Interactive)]
    #[case::empty(Some(""), ExecutionContext::Interactive)]
    #[case::github(Some("true"), ExecutionContext::Automated)]
    #[case::any_value(Some("1"), ExecutionContext::Automated)]
    fn detection_follows_variable(
        #[case] value: Option<&str>,
        #[case] expected: ExecutionContext,
    ) {
        let detected = temp_env::with_var(DEFAULT_CI_ENV_VAR, value, || {
            ExecutionContext::detect(DEFAULT_CI_ENV_VAR)
        });
        assert_eq!(detected, expected);
    }

    #[test]
    fn custom_variable_names_are_honoured() {
        let detected = ExecutionContext::detect_with("BUILDKITE", |name| {
            (name == "BUILDKITE").then(|| OsString::from("true"))
        });
        assert_eq!(detected, ExecutionContext::Automated);
    }
}
