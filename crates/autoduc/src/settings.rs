//! Process-level settings
//!
//! Everything the binary reads from the environment lives here, behind a
//! lookup function so tests never touch the real process environment.

use anyhow::{Context, Result, bail};
use duc_core::config::{
    Credential, DEFAULT_PUBLIC_IP_URL, DucConfig, FailurePolicy, RecordTarget, UpdateMethod,
};
use tracing::Level;

/// Logging settings, read before anything else so config errors can be logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: Level,
    pub file: Option<String>,
}

impl LogSettings {
    /// Read `AUTODUC_LOG_LEVEL` and `AUTODUC_LOG_FILE`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let level = match lookup("AUTODUC_LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            other => bail!(
                "AUTODUC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        };

        let file = lookup("AUTODUC_LOG_FILE").filter(|path| !path.trim().is_empty());

        Ok(Self { level, file })
    }
}

/// Load the run configuration
///
/// `AUTODUC_CONFIG` names a JSON file (native or classic `conf.json` layout).
/// Without it, the configuration is assembled from `AUTODUC_*` variables.
/// `AUTODUC_MODE` and `AUTODUC_LIST_ONLY` apply on top of either source.
pub fn load_config(lookup: impl Fn(&str) -> Option<String>) -> Result<DucConfig> {
    let mut config = match lookup("AUTODUC_CONFIG") {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read AUTODUC_CONFIG file {}", path))?;
            DucConfig::from_json_str(&raw)
                .with_context(|| format!("Failed to parse AUTODUC_CONFIG file {}", path))?
        }
        None => config_from_vars(&lookup)?,
    };

    if let Some(mode) = lookup("AUTODUC_MODE") {
        config.dry_run = match mode.to_lowercase().as_str() {
            "live" => false,
            "dry-run" | "dry_run" | "dryrun" => true,
            other => bail!("AUTODUC_MODE '{}' is not valid. Valid modes: live, dry-run", other),
        };
    }

    if let Some(list_only) = lookup("AUTODUC_LIST_ONLY") {
        config.list_only = parse_bool("AUTODUC_LIST_ONLY", &list_only)?;
    }

    config.validate()?;
    Ok(config)
}

fn config_from_vars(lookup: &impl Fn(&str) -> Option<String>) -> Result<DucConfig> {
    let Some(zone_id) = lookup("AUTODUC_ZONE_ID") else {
        bail!(
            "AUTODUC_ZONE_ID is required (or point AUTODUC_CONFIG at a config file). \
            Set it via: export AUTODUC_ZONE_ID=your_zone_id"
        );
    };

    let credential = match (
        lookup("AUTODUC_API_TOKEN"),
        lookup("AUTODUC_API_EMAIL"),
        lookup("AUTODUC_API_KEY"),
    ) {
        (Some(token), _, _) => Credential::api_token(token),
        (None, Some(email), Some(key)) => Credential::api_key(email, key),
        _ => bail!(
            "No credential configured. Set AUTODUC_API_TOKEN, \
            or AUTODUC_API_EMAIL together with AUTODUC_API_KEY"
        ),
    };

    let mut config = DucConfig::new(zone_id, credential).with_public_ip_url(
        lookup("AUTODUC_PUBLIC_IP_URL").unwrap_or_else(|| DEFAULT_PUBLIC_IP_URL.to_string()),
    );

    if let Some(records) = lookup("AUTODUC_RECORDS") {
        config = config.with_records(parse_targets(&records));
    }

    if let Some(method) = lookup("AUTODUC_UPDATE_METHOD") {
        config.update.method = match method.to_lowercase().as_str() {
            "patch" => UpdateMethod::Patch,
            "put" => UpdateMethod::Put,
            other => bail!("AUTODUC_UPDATE_METHOD '{}' is not valid. Valid: patch, put", other),
        };
    }

    if let Some(proxied) = lookup("AUTODUC_PROXIED") {
        config.update.overrides.proxied = Some(parse_bool("AUTODUC_PROXIED", &proxied)?);
    }

    if let Some(ttl) = lookup("AUTODUC_TTL") {
        let ttl = ttl
            .trim()
            .parse::<u32>()
            .with_context(|| format!("AUTODUC_TTL must be a number of seconds. Got: {}", ttl))?;
        config.update.overrides.ttl = Some(ttl);
    }

    if let Some(timeout) = lookup("AUTODUC_TIMEOUT_SECS") {
        config.http.timeout_secs = timeout.trim().parse::<u64>().with_context(|| {
            format!("AUTODUC_TIMEOUT_SECS must be a number of seconds. Got: {}", timeout)
        })?;
    }

    if let Some(policy) = lookup("AUTODUC_FAILURE_POLICY") {
        config.failure_policy = match policy.to_lowercase().as_str() {
            "continue" => FailurePolicy::Continue,
            "abort" => FailurePolicy::Abort,
            other => bail!(
                "AUTODUC_FAILURE_POLICY '{}' is not valid. Valid: continue, abort",
                other
            ),
        };
    }

    Ok(config)
}

/// Parse a comma-separated target list; `name:` entries select by name
fn parse_targets(raw: &str) -> Vec<RecordTarget> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.strip_prefix("name:") {
            Some(name) => RecordTarget::Name(name.trim().to_string()),
            None => RecordTarget::Id(entry.strip_prefix("id:").unwrap_or(entry).trim().to_string()),
        })
        .collect()
}

fn parse_bool(variable: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be true or false. Got: {}", variable, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duc_core::RecordSelection;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn minimal_env_config() {
        let config = load_config(env(&[
            ("AUTODUC_ZONE_ID", "zone-1"),
            ("AUTODUC_API_TOKEN", "t0k3n"),
        ]))
        .unwrap();

        assert_eq!(config.zone_id, "zone-1");
        assert_eq!(config.credential, Credential::api_token("t0k3n"));
        assert_eq!(config.public_ip.url, DEFAULT_PUBLIC_IP_URL);
        assert_eq!(config.records, RecordSelection::All);
        assert_eq!(config.update.method, UpdateMethod::Patch);
        assert!(!config.dry_run);
        assert!(!config.list_only);
    }

    #[test]
    fn full_env_config() {
        let config = load_config(env(&[
            ("AUTODUC_ZONE_ID", "zone-1"),
            ("AUTODUC_API_EMAIL", "ops@example.com"),
            ("AUTODUC_API_KEY", "global-key"),
            ("AUTODUC_PUBLIC_IP_URL", "https://ifconfig.me/ip"),
            ("AUTODUC_RECORDS", "abc123, name:home.example.com,,id:def456"),
            ("AUTODUC_UPDATE_METHOD", "PUT"),
            ("AUTODUC_PROXIED", "false"),
            ("AUTODUC_TTL", "60"),
            ("AUTODUC_TIMEOUT_SECS", "5"),
            ("AUTODUC_FAILURE_POLICY", "abort"),
            ("AUTODUC_MODE", "dry-run"),
            ("AUTODUC_LIST_ONLY", "0"),
        ]))
        .unwrap();

        assert_eq!(config.credential, Credential::api_key("ops@example.com", "global-key"));
        assert_eq!(config.public_ip.url, "https://ifconfig.me/ip");
        assert_eq!(
            config.records,
            RecordSelection::Only(vec![
                RecordTarget::Id("abc123".to_string()),
                RecordTarget::Name("home.example.com".to_string()),
                RecordTarget::Id("def456".to_string()),
            ])
        );
        assert_eq!(config.update.method, UpdateMethod::Put);
        assert_eq!(config.update.overrides.proxied, Some(false));
        assert_eq!(config.update.overrides.ttl, Some(60));
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.dry_run);
        assert!(!config.list_only);
    }

    #[test]
    fn missing_zone_is_rejected() {
        let err = load_config(env(&[("AUTODUC_API_TOKEN", "t0k3n")])).unwrap_err();
        assert!(err.to_string().contains("AUTODUC_ZONE_ID"));
    }

    #[test]
    fn missing_credential_is_rejected() {
        let err = load_config(env(&[
            ("AUTODUC_ZONE_ID", "zone-1"),
            ("AUTODUC_API_EMAIL", "ops@example.com"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("credential"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = [("AUTODUC_ZONE_ID", "zone-1"), ("AUTODUC_API_TOKEN", "t0k3n")];

        for (key, value) in [
            ("AUTODUC_TTL", "30"),
            ("AUTODUC_TTL", "soon"),
            ("AUTODUC_TIMEOUT_SECS", "0"),
            ("AUTODUC_MODE", "maybe"),
            ("AUTODUC_PROXIED", "perhaps"),
            ("AUTODUC_UPDATE_METHOD", "post"),
            ("AUTODUC_PUBLIC_IP_URL", "ftp://ip.example.com"),
        ] {
            let mut vars = base.to_vec();
            vars.push((key, value));
            assert!(load_config(env(&vars)).is_err(), "{}={} should be rejected", key, value);
        }
    }

    #[test]
    fn legacy_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "AuthKey": "legacy-token",
                "ZoneID": "zone-legacy",
                "Records": [{{"id": "r1", "name": "home.example.com"}}],
                "PublicAddressAPI": "https://api.ipify.org",
                "ListRecords": true
            }}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = load_config(env(&[("AUTODUC_CONFIG", path.as_str())])).unwrap();

        assert_eq!(config.zone_id, "zone-legacy");
        assert_eq!(config.credential, Credential::api_token("legacy-token"));
        assert_eq!(config.update.method, UpdateMethod::Put);
        assert_eq!(config.update.overrides.ttl, Some(60));
        assert!(config.list_only);
    }

    #[test]
    fn native_config_file_with_mode_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "zone_id": "zone-native",
                "credential": {{"type": "api_token", "token": "t0k3n"}},
                "public_ip": {{"url": "https://ip.example.com/json", "family": "v4"}},
                "records": {{"only": [{{"name": "home.example.com"}}]}}
            }}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = load_config(env(&[
            ("AUTODUC_CONFIG", path.as_str()),
            ("AUTODUC_MODE", "dry-run"),
            // File-based configs ignore the per-field variables
            ("AUTODUC_ZONE_ID", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.zone_id, "zone-native");
        assert_eq!(config.public_ip.json_field, "ip");
        assert!(config.dry_run);
    }

    #[test]
    fn unreadable_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json").to_string_lossy().into_owned();

        let err = load_config(env(&[("AUTODUC_CONFIG", path.as_str())])).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn log_settings() {
        let defaults = LogSettings::from_lookup(env(&[])).unwrap();
        assert_eq!(defaults, LogSettings { level: Level::INFO, file: None });

        let custom = LogSettings::from_lookup(env(&[
            ("AUTODUC_LOG_LEVEL", "DEBUG"),
            ("AUTODUC_LOG_FILE", "/var/log/autoduc.log"),
        ]))
        .unwrap();
        assert_eq!(custom.level, Level::DEBUG);
        assert_eq!(custom.file.as_deref(), Some("/var/log/autoduc.log"));

        assert!(LogSettings::from_lookup(env(&[("AUTODUC_LOG_LEVEL", "loud")])).is_err());
    }
}
