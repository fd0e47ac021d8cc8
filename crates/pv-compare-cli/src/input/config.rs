use pv_compare_core::CalculatorConfig;

use super::file;

/// Load the calculator configuration. Without a path the built-in defaults
/// apply: no benchmark spread, no tax gross-up, at most 120 installments.
pub fn load_config(path: Option<&str>) -> Result<CalculatorConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(CalculatorConfig::default());
    };

    let (canonical, contents) = file::read_text(path)?;
    let is_yaml = canonical
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let config = if is_yaml {
        let config: CalculatorConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
        config.validate()?;
        config
    } else {
        CalculatorConfig::from_json(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };

    tracing::debug!(path = %canonical.display(), ?config, "configuration loaded");
    Ok(config)
}
