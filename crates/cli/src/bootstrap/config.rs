//! YAML configuration loading: read the file, deserialize, apply CLI
//! overrides, then run the domain-level structural validation before
//! anything downstream sees the config.

use std::fs;
use std::path::Path;

use tracing::info;

use ksr_ceremony_domain::CeremonyConfig;

/// Per-invocation overrides that win over whatever the YAML file declares.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub schema_name: Option<String>,
}

pub fn load_config(config_path: &Path, overrides: CliOverrides) -> anyhow::Result<CeremonyConfig> {
    let text = fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", config_path.display()))?;
    let mut config: CeremonyConfig =
        serde_yaml::from_str(&text).map_err(|e| anyhow::anyhow!("parsing {}: {e}", config_path.display()))?;

    if let Some(schema_name) = overrides.schema_name {
        config.schema_name = Some(schema_name);
    }

    config.validate()?;

    info!(
        config_file = %config_path.display(),
        num_bundles = config.num_bundles,
        acceptable_domains = ?config.acceptable_domains,
        "configuration loaded"
    );

    Ok(config)
}
