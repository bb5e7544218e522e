//! Pipeline configuration loaded from environment variables.
//!
//! Every operational constant of the pipeline is tunable here; nothing is
//! hardwired at the call sites.

/// Tiled watermark parameters applied to derived images.
#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    /// Watermark text; stamp width is derived from its length.
    pub text: String,
    /// Blend opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Tiling angle in degrees (45 = diagonal).
    pub angle_degrees: f32,
    /// Distance between stamp centres in pixels.
    pub spacing: u32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: "gala preview".to_string(),
            opacity: 0.18,
            angle_degrees: 45.0,
            spacing: 160,
        }
    }
}

/// Pipeline configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Entries processed between two checkpoints (default: `10`).
    pub batch_size: usize,
    /// Hard wall-clock ceiling per invocation in seconds (default: `540`).
    pub execution_ceiling_secs: u64,
    /// Seconds reserved below the ceiling for checkpointing and the
    /// continuation call (default: `30`).
    pub safety_buffer_secs: u64,
    /// Maximum accepted archive size in bytes (default: 1 GiB).
    pub max_archive_bytes: u64,
    /// Maximum image entries per archive (default: `500`).
    pub max_entries: usize,
    /// Maximum uncompressed size of a single entry (default: 25 MiB).
    pub max_entry_bytes: u64,
    /// Bounding box edge for the display rendition (default: `1600`).
    pub display_max_dim: u32,
    /// Bounding box edge for the thumbnail rendition (default: `400`).
    pub thumbnail_max_dim: u32,
    /// JPEG quality for the display rendition (default: `85`).
    pub display_quality: u8,
    /// JPEG quality for the thumbnail rendition (default: `70`).
    pub thumbnail_quality: u8,
    /// Watermark parameters.
    pub watermark: WatermarkConfig,
    /// Bucket holding uploaded archives awaiting processing.
    pub archive_bucket: String,
    /// Bucket receiving original and derived photo artifacts.
    pub media_bucket: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            execution_ceiling_secs: 540,
            safety_buffer_secs: 30,
            max_archive_bytes: 1024 * 1024 * 1024,
            max_entries: 500,
            max_entry_bytes: 25 * 1024 * 1024,
            display_max_dim: 1600,
            thumbnail_max_dim: 400,
            display_quality: 85,
            thumbnail_quality: 70,
            watermark: WatermarkConfig::default(),
            archive_bucket: "gala-archives".to_string(),
            media_bucket: "gala-media".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default         |
    /// |---------------------------|-----------------|
    /// | `PIPELINE_BATCH_SIZE`     | `10`            |
    /// | `PIPELINE_CEILING_SECS`   | `540`           |
    /// | `PIPELINE_SAFETY_SECS`    | `30`            |
    /// | `MAX_ARCHIVE_BYTES`       | `1073741824`    |
    /// | `MAX_ARCHIVE_ENTRIES`     | `500`           |
    /// | `MAX_ENTRY_BYTES`         | `26214400`      |
    /// | `DISPLAY_MAX_DIM`         | `1600`          |
    /// | `THUMBNAIL_MAX_DIM`       | `400`           |
    /// | `DISPLAY_QUALITY`         | `85`            |
    /// | `THUMBNAIL_QUALITY`       | `70`            |
    /// | `WATERMARK_TEXT`          | `gala preview`  |
    /// | `WATERMARK_OPACITY`       | `0.18`          |
    /// | `WATERMARK_ANGLE_DEGREES` | `45`            |
    /// | `WATERMARK_SPACING`       | `160`           |
    /// | `ARCHIVE_BUCKET`          | `gala-archives` |
    /// | `MEDIA_BUCKET`            | `gala-media`    |
    ///
    /// # Panics
    ///
    /// Panics on malformed numeric values; misconfiguration should fail
    /// fast at startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: env_parse("PIPELINE_BATCH_SIZE", defaults.batch_size),
            execution_ceiling_secs: env_parse("PIPELINE_CEILING_SECS", defaults.execution_ceiling_secs),
            safety_buffer_secs: env_parse("PIPELINE_SAFETY_SECS", defaults.safety_buffer_secs),
            max_archive_bytes: env_parse("MAX_ARCHIVE_BYTES", defaults.max_archive_bytes),
            max_entries: env_parse("MAX_ARCHIVE_ENTRIES", defaults.max_entries),
            max_entry_bytes: env_parse("MAX_ENTRY_BYTES", defaults.max_entry_bytes),
            display_max_dim: env_parse("DISPLAY_MAX_DIM", defaults.display_max_dim),
            thumbnail_max_dim: env_parse("THUMBNAIL_MAX_DIM", defaults.thumbnail_max_dim),
            display_quality: env_parse("DISPLAY_QUALITY", defaults.display_quality),
            thumbnail_quality: env_parse("THUMBNAIL_QUALITY", defaults.thumbnail_quality),
            watermark: WatermarkConfig {
                text: env_string("WATERMARK_TEXT", &defaults.watermark.text),
                opacity: env_parse("WATERMARK_OPACITY", defaults.watermark.opacity),
                angle_degrees: env_parse("WATERMARK_ANGLE_DEGREES", defaults.watermark.angle_degrees),
                spacing: env_parse("WATERMARK_SPACING", defaults.watermark.spacing),
            },
            archive_bucket: env_string("ARCHIVE_BUCKET", &defaults.archive_bucket),
            media_bucket: env_string("MEDIA_BUCKET", &defaults.media_bucket),
        }
    }
}

fn env_string(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{var} must be a valid value: {e}")),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = PipelineConfig::default();
        assert!(config.batch_size > 0);
        assert!(config.safety_buffer_secs < config.execution_ceiling_secs);
        assert!(config.thumbnail_max_dim < config.display_max_dim);
        assert!(config.thumbnail_quality < config.display_quality);
        assert!(config.watermark.opacity > 0.0 && config.watermark.opacity < 1.0);
    }
}
