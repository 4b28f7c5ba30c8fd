use serde::Deserialize;

/// What the one-shot (kqueue) backend does after a target fires.
///
/// - `Rearm`: re-register the target before handing out the event, so every
///   write keeps triggering (default).
/// - `Once`: drop the target after its first firing. Once every target has
///   fired, the source reports that it is exhausted.
///
/// The persistent (inotify) backend never needs re-arming and ignores this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OneShotPolicy {
    #[default]
    Rearm,
    Once,
}

/// Which processes receive the kill signal when a job is preempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KillScope {
    /// The child runs in its own process group; the whole group is killed.
    #[default]
    ProcessGroup,
    /// Only the `sh` process is signalled. Its descendants may survive.
    ShellOnly,
}

impl KillScope {
    pub fn from_process_group_flag(enabled: bool) -> Self {
        if enabled {
            KillScope::ProcessGroup
        } else {
            KillScope::ShellOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: OneShotPolicy,
        }

        let w: Wrapper = toml::from_str("policy = \"once\"").unwrap();
        assert_eq!(w.policy, OneShotPolicy::Once);
        assert!(toml::from_str::<Wrapper>("policy = \"sometimes\"").is_err());
    }

    #[test]
    fn kill_scope_follows_flag() {
        assert_eq!(KillScope::from_process_group_flag(true), KillScope::ProcessGroup);
        assert_eq!(KillScope::from_process_group_flag(false), KillScope::ShellOnly);
    }
}
