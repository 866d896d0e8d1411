//! Build information embedded at compile time.

/// Version and commit of this library, fixed at build time.
///
/// The commit comes from the `UPTIME_GIT_COMMIT` environment variable when
/// the crate is compiled and is `"unknown"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: match option_env!("UPTIME_GIT_COMMIT") {
                Some(commit) => commit,
                None => "unknown",
            },
        }
    }

    /// Client identifier sent as `User-Agent`, e.g. `uptime-rs/0.1.0`.
    pub fn user_agent(&self) -> String {
        format!("uptime-rs/{}", self.version)
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_package_version() {
        let info = BuildInfo::current();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.user_agent(), format!("uptime-rs/{}", env!("CARGO_PKG_VERSION")));
        assert!(!info.commit.is_empty());
    }
}
