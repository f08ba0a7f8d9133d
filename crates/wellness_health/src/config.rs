use std::path::PathBuf;

use chrono::TimeDelta;

use crate::error::{HealthError, HealthResult};
use crate::platform::Platform;
use crate::uploader::DEFAULT_UPLOAD_INTERVAL;

pub const DEFAULT_THROTTLE_FILE: &str = ".wellness_last_upload";

/// Settings for wiring the pipeline in the binary.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub records_path: PathBuf,
    pub throttle_path: PathBuf,
    pub platform: Platform,
    pub upload_interval: TimeDelta,
}

impl PipelineConfig {
    pub fn from_env() -> HealthResult<Self> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> HealthResult<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let records_path = get("WELLNESS_HEALTH_RECORDS")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| HealthError::Config("WELLNESS_HEALTH_RECORDS is not set".into()))?;
        let throttle_path = get("WELLNESS_THROTTLE_FILE")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_THROTTLE_FILE.into())
            .into();
        let platform = match get("WELLNESS_PLATFORM") {
            Some(p) => p.parse()?,
            None => Platform::current(),
        };
        let upload_interval = match get("WELLNESS_UPLOAD_INTERVAL_HOURS") {
            Some(raw) => {
                let hours: i64 = raw.trim().parse().map_err(|_| {
                    HealthError::Config(format!(
                        "WELLNESS_UPLOAD_INTERVAL_HOURS must be a whole number, got {raw}"
                    ))
                })?;
                if hours < 0 {
                    return Err(HealthError::Config(format!(
                        "WELLNESS_UPLOAD_INTERVAL_HOURS must not be negative, got {hours}"
                    )));
                }
                TimeDelta::try_hours(hours).ok_or_else(|| {
                    HealthError::Config(format!(
                        "WELLNESS_UPLOAD_INTERVAL_HOURS is out of range, got {hours}"
                    ))
                })?
            }
            None => DEFAULT_UPLOAD_INTERVAL,
        };
        Ok(Self {
            records_path,
            throttle_path,
            platform,
            upload_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_path_is_required() {
        assert!(matches!(
            PipelineConfig::from_env_with(|_| None),
            Err(HealthError::Config(_))
        ));
    }

    #[test]
    fn defaults_apply() {
        let get = |k: &str| (k == "WELLNESS_HEALTH_RECORDS").then(|| "records.json".to_string());
        let cfg = PipelineConfig::from_env_with(get).expect("cfg");
        assert_eq!(cfg.records_path, PathBuf::from("records.json"));
        assert_eq!(cfg.throttle_path, PathBuf::from(DEFAULT_THROTTLE_FILE));
        assert_eq!(cfg.platform, Platform::current());
        assert_eq!(cfg.upload_interval, TimeDelta::hours(4));
    }

    #[test]
    fn reads_values() {
        let get = |k: &str| match k {
            "WELLNESS_HEALTH_RECORDS" => Some("/data/export.json".into()),
            "WELLNESS_THROTTLE_FILE" => Some("/tmp/kv.json".into()),
            "WELLNESS_PLATFORM" => Some("ios".into()),
            "WELLNESS_UPLOAD_INTERVAL_HOURS" => Some("12".into()),
            _ => None,
        };
        let cfg = PipelineConfig::from_env_with(get).expect("cfg");
        assert_eq!(cfg.throttle_path, PathBuf::from("/tmp/kv.json"));
        assert_eq!(cfg.platform, Platform::Ios);
        assert_eq!(cfg.upload_interval, TimeDelta::hours(12));
    }

    #[test]
    fn rejects_bad_interval_and_platform() {
        let get = |k: &str| match k {
            "WELLNESS_HEALTH_RECORDS" => Some("r.json".into()),
            "WELLNESS_UPLOAD_INTERVAL_HOURS" => Some("soon".into()),
            _ => None,
        };
        assert!(PipelineConfig::from_env_with(get).is_err());

        let get = |k: &str| match k {
            "WELLNESS_HEALTH_RECORDS" => Some("r.json".into()),
            "WELLNESS_PLATFORM" => Some("palm".into()),
            _ => None,
        };
        assert!(PipelineConfig::from_env_with(get).is_err());
    }

    #[test]
    fn rejects_interval_beyond_duration_range() {
        let get = |k: &str| match k {
            "WELLNESS_HEALTH_RECORDS" => Some("r.json".into()),
            "WELLNESS_UPLOAD_INTERVAL_HOURS" => Some(i64::MAX.to_string()),
            _ => None,
        };
        assert!(matches!(
            PipelineConfig::from_env_with(get),
            Err(HealthError::Config(_))
        ));
    }
}
