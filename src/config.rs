//! Export settings.
//!
//! Every field has a default, so an empty JSON object is a valid config file.
//! Durations are written either as whole milliseconds (`3000`) or as a string
//! with a unit (`"3s"`, `"250ms"`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, de};
use vellum_content::Theme;
use vellum_types::PageSize;

use crate::error::ExportError;

/// A4 width at 96 CSS pixels per inch.
pub const DEFAULT_STAGE_WIDTH_PX: u32 = 794;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Physical size of every output page.
    pub page_size: PageSize,
    /// Width of the off-screen stage in CSS pixels.
    pub stage_width_px: u32,
    /// Device pixels per CSS pixel used when capturing the stage.
    pub scale: f32,
    /// Fallback deadline for asset loading before the stage is laid out.
    #[serde(deserialize_with = "duration")]
    pub settle_timeout: Duration,
    /// How long `Success` stays visible before the status returns to `Idle`.
    #[serde(deserialize_with = "duration")]
    pub success_display: Duration,
    pub jpeg_quality: u8,
    /// Hosts whose remote images may be captured.
    pub trusted_hosts: Vec<String>,
    /// Overrides the `<name> Resume` document title.
    pub document_title: Option<String>,
    pub theme: Theme,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            stage_width_px: DEFAULT_STAGE_WIDTH_PX,
            scale: 2.0,
            settle_timeout: Duration::from_secs(3),
            success_display: Duration::from_secs(3),
            jpeg_quality: vellum_pdf_composer::DEFAULT_JPEG_QUALITY,
            trusted_hosts: Vec::new(),
            document_title: None,
            theme: Theme::default(),
        }
    }
}

impl ExportConfig {
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let config: ExportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExportError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config from '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.stage_width_px == 0 {
            return Err(ExportError::Config("stageWidthPx must be positive".to_string()));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ExportError::Config(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ExportError::Config(format!(
                "jpegQuality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.page_size.width_pt <= 0.0 || self.page_size.height_pt <= 0.0 {
            return Err(ExportError::Config(format!(
                "page size must be positive, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    /// Title for the document info dictionary.
    pub fn title_for(&self, person_name: &str) -> String {
        match &self.document_title {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ if person_name.is_empty() => "Resume".to_string(),
            _ => format!("{} Resume", person_name),
        }
    }
}

fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DurationDef {
        Millis(u64),
        Text(String),
    }

    match DurationDef::deserialize(deserializer)? {
        DurationDef::Millis(ms) => Ok(Duration::from_millis(ms)),
        DurationDef::Text(text) => parse_duration(&text).map_err(de::Error::custom),
    }
}

fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    let (number, unit_ms) = if let Some(n) = text.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = text.strip_suffix('s') {
        (n, 1000.0)
    } else {
        (text, 1.0)
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("Invalid duration: {}", text))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("Duration must be non-negative: {}", text));
    }
    Ok(Duration::from_secs_f64(value * unit_ms / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_a4_at_double_density() {
        let config = ExportConfig::default();
        assert_eq!(config.page_size, PageSize::A4);
        assert_eq!(config.stage_width_px, 794);
        assert_eq!(config.scale, 2.0);
        assert_eq!(config.settle_timeout, Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(ExportConfig::from_json("{}").unwrap(), ExportConfig::default());
    }

    #[test]
    fn parses_camel_case_fields_and_durations() {
        let config = ExportConfig::from_json(
            r#"{
                "pageSize": "Letter",
                "scale": 1.5,
                "settleTimeout": "250ms",
                "successDisplay": 1500,
                "trustedHosts": ["cdn.example.com"],
                "documentTitle": "CV"
            }"#,
        )
        .unwrap();
        assert_eq!(config.page_size, PageSize::LETTER);
        assert_eq!(config.scale, 1.5);
        assert_eq!(config.settle_timeout, Duration::from_millis(250));
        assert_eq!(config.success_display, Duration::from_millis(1500));
        assert_eq!(config.trusted_hosts, vec!["cdn.example.com".to_string()]);
        assert_eq!(config.title_for("Amara Okafor"), "CV");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            ExportConfig::from_json(r#"{"scale": 0}"#),
            Err(ExportError::Config(_))
        ));
        assert!(matches!(
            ExportConfig::from_json(r#"{"jpegQuality": 0}"#),
            Err(ExportError::Config(_))
        ));
        assert!(matches!(
            ExportConfig::from_json(r#"{"settleTimeout": "soon"}"#),
            Err(ExportError::ConfigJson(_))
        ));
    }

    #[test]
    fn title_falls_back_to_name() {
        let config = ExportConfig::default();
        assert_eq!(config.title_for("Amara Okafor"), "Amara Okafor Resume");
        assert_eq!(config.title_for(""), "Resume");
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
    }
}
