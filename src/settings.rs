use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TICK_MS: u64 = 100;
const MIN_TICK_MS: u64 = 10;
const MAX_TICK_MS: u64 = 1000;

/// Runtime knobs read from the environment. None of them change what is
/// captured, only how it is observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    /// Where tracing output goes; logging stays off when unset.
    pub(crate) log_path: Option<PathBuf>,
    /// Idle poll interval of the interactive loop.
    pub(crate) tick: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_path: None,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl Settings {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let log_path = read("BUILDCAP_LOG").map(PathBuf::from);
        let tick_ms = read("BUILDCAP_TICK_MS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(|ms| ms.clamp(MIN_TICK_MS, MAX_TICK_MS))
            .unwrap_or(DEFAULT_TICK_MS);

        Self {
            log_path,
            tick: Duration::from_millis(tick_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(settings_from(&[]), Settings::default());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let settings = settings_from(&[("BUILDCAP_LOG", "   "), ("BUILDCAP_TICK_MS", "")]);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn reads_log_path_and_clamps_tick() {
        let settings = settings_from(&[
            ("BUILDCAP_LOG", " /tmp/buildcap.log "),
            ("BUILDCAP_TICK_MS", "5000"),
        ]);
        assert_eq!(settings.log_path, Some(PathBuf::from("/tmp/buildcap.log")));
        assert_eq!(settings.tick, Duration::from_millis(MAX_TICK_MS));

        let settings = settings_from(&[("BUILDCAP_TICK_MS", "1")]);
        assert_eq!(settings.tick, Duration::from_millis(MIN_TICK_MS));
    }

    #[test]
    fn unparsable_tick_falls_back_to_default() {
        let settings = settings_from(&[("BUILDCAP_TICK_MS", "fast")]);
        assert_eq!(settings.tick, Duration::from_millis(DEFAULT_TICK_MS));
    }
}
