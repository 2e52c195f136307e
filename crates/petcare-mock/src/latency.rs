//! Latency simulation applied before every mock response.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DELAY_MS: u64 = 300;

/// Delay profile: fixed milliseconds or a `{min, max}` range.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LatencyProfile {
    Fixed(u64),
    Range {
        #[serde(rename = "min")]
        min_ms: u64,
        #[serde(rename = "max")]
        max_ms: u64,
    },
}

impl Default for LatencyProfile {
    fn default() -> Self {
        LatencyProfile::Fixed(DEFAULT_DELAY_MS)
    }
}

impl LatencyProfile {
    pub fn duration_ms(&self) -> u64 {
        match self {
            LatencyProfile::Fixed(ms) => *ms,
            LatencyProfile::Range { min_ms, max_ms } if min_ms >= max_ms => *min_ms,
            LatencyProfile::Range { min_ms, max_ms } => {
                use rand::Rng;
                rand::thread_rng().gen_range(*min_ms..=*max_ms)
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let LatencyProfile::Range { min_ms, max_ms } = self {
            if min_ms > max_ms {
                anyhow::bail!("latency min ({min_ms}ms) is greater than max ({max_ms}ms)");
            }
        }
        Ok(())
    }
}

/// Suspends callers before a mock result is produced.
///
/// The delay is a plain timer future: dropping it (a caller abandoning the
/// request, or an enclosing `tokio::time::timeout`) cancels the wait and
/// nothing after it runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencySimulator {
    profile: LatencyProfile,
}

impl LatencySimulator {
    pub fn new(profile: LatencyProfile) -> Self {
        Self { profile }
    }

    pub fn fixed(ms: u64) -> Self {
        Self::new(LatencyProfile::Fixed(ms))
    }

    pub fn none() -> Self {
        Self::fixed(0)
    }

    pub fn profile(&self) -> LatencyProfile {
        self.profile
    }

    pub async fn delay(&self) {
        delay(self.profile.duration_ms()).await;
    }
}

/// Sleep for `ms` milliseconds; zero returns immediately.
pub async fn delay(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_default_profile() {
        assert_eq!(LatencyProfile::default(), LatencyProfile::Fixed(300));
        assert_eq!(LatencySimulator::default().profile().duration_ms(), 300);
    }

    #[test]
    fn test_range_profile() {
        let profile = LatencyProfile::Range {
            min_ms: 100,
            max_ms: 200,
        };
        for _ in 0..10 {
            assert!((100..=200).contains(&profile.duration_ms()));
        }
    }

    #[test]
    fn test_inverted_range_is_invalid() {
        let profile = LatencyProfile::Range {
            min_ms: 500,
            max_ms: 100,
        };
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("min (500ms) is greater than max (100ms)"));
        assert_eq!(profile.duration_ms(), 500);
    }

    #[test]
    fn test_profile_serde() {
        let profile: LatencyProfile = serde_yaml::from_str("150").unwrap();
        assert_eq!(profile, LatencyProfile::Fixed(150));

        let profile: LatencyProfile = serde_yaml::from_str("min: 10\nmax: 20").unwrap();
        assert_eq!(
            profile,
            LatencyProfile::Range {
                min_ms: 10,
                max_ms: 20
            }
        );
    }

    #[tokio::test]
    async fn test_delay_waits_at_least_configured_time() {
        let start = Instant::now();
        LatencySimulator::fixed(40).delay().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_dropped_delay_is_cancelled() {
        let result =
            tokio::time::timeout(Duration::from_millis(10), LatencySimulator::fixed(5_000).delay())
                .await;
        assert!(result.is_err());
    }
}
