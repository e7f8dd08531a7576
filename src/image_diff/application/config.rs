use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ApplicationError;
use crate::domain::annotator_trait::{BoxStyle, DEFAULT_LINE_THICKNESS};
use crate::domain::color::parse_hex_color;
use crate::domain::region_extractor::{RegionExtractor, DEFAULT_THRESHOLD};
use crate::infrastructure::error::InfrastructureError;

/// Tunables for one comparison run. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Difference intensity a pixel must strictly exceed to count as changed.
    pub threshold: u8,
    pub line_thickness: u32,
    /// `#RRGGBB` or `#RRGGBBAA`.
    pub highlight_color: String,
    /// Fail instead of converting when the two images have different color modes.
    pub strict_modes: bool,
    /// Ratio above which a difference counts as a failed check.
    pub max_ratio: Option<f64>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            line_thickness: DEFAULT_LINE_THICKNESS,
            highlight_color: "#FF0000".to_string(),
            strict_modes: false,
            max_ratio: None,
        }
    }
}

impl DiffConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, InfrastructureError> {
        let raw = std::fs::read_to_string(path).map_err(|source| InfrastructureError::ConfigReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.line_thickness == 0 {
            return Err(ApplicationError::ConfigurationError(
                "line_thickness must be at least 1".to_string(),
            ));
        }
        if let Some(max_ratio) = self.max_ratio {
            if !(0.0..=1.0).contains(&max_ratio) {
                return Err(ApplicationError::ConfigurationError(format!(
                    "max_ratio must be within [0, 1], got {max_ratio}"
                )));
            }
        }
        Ok(())
    }

    pub fn box_style(&self) -> BoxStyle {
        BoxStyle {
            color: parse_hex_color(&self.highlight_color),
            thickness: self.line_thickness,
        }
    }

    pub fn region_extractor(&self) -> RegionExtractor {
        RegionExtractor::new(self.threshold)
    }
}

/// Where the three outputs of a differing comparison go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub diff: PathBuf,
    pub annotated_one: PathBuf,
    pub annotated_two: PathBuf,
}

impl OutputPaths {
    /// `diff.png` next to the first input, `<stem>-annotated.<ext>` next to each input.
    /// When an input is itself named `diff.png`, the diff goes to `diff-<n>.png`.
    pub fn derive(path_one: &Path, path_two: &Path) -> Result<Self, ApplicationError> {
        let parent = path_one.parent().unwrap_or_else(|| Path::new("."));
        let mut diff = parent.join(DIFF_FILE_NAME);
        let mut suffix = 1;
        while same_file(&diff, path_one) || same_file(&diff, path_two) {
            diff = parent.join(format!("diff-{suffix}.png"));
            suffix += 1;
        }
        Ok(Self {
            diff,
            annotated_one: annotated_path(path_one)?,
            annotated_two: annotated_path(path_two)?,
        })
    }

    /// Rejects outputs that would overwrite an input or each other.
    pub fn check_inputs(&self, path_one: &Path, path_two: &Path) -> Result<(), ApplicationError> {
        let outputs = [&self.diff, &self.annotated_one, &self.annotated_two];
        for (i, output) in outputs.iter().enumerate() {
            if let Some(input) = [path_one, path_two].into_iter().find(|input| same_file(output, input)) {
                return Err(ApplicationError::ConfigurationError(format!(
                    "output {} would overwrite input {}",
                    output.display(),
                    input.display()
                )));
            }
            if outputs[i + 1..].iter().any(|other| same_file(output, other)) {
                return Err(ApplicationError::ConfigurationError(format!(
                    "output {} is used for more than one result",
                    output.display()
                )));
            }
        }
        Ok(())
    }
}

const DIFF_FILE_NAME: &str = "diff.png";

// 存在するファイルは正規化して比較する
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn annotated_path(input: &Path) -> Result<PathBuf, ApplicationError> {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            ApplicationError::ConfigurationError(format!(
                "input filename has no valid stem: {}",
                input.display()
            ))
        })?;
    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("png");
    Ok(parent.join(format!("{stem}-annotated.{ext}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::color::Color;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = DiffConfig::default();
        assert_eq!(config.threshold, 60);
        assert_eq!(config.box_style(), BoxStyle { color: Color::RED, thickness: 2 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diff.json");
        std::fs::write(&path, r##"{ "threshold": 25, "highlight_color": "#00FF00" }"##).unwrap();

        let config = DiffConfig::from_json_file(&path).unwrap();
        assert_eq!(config.threshold, 25);
        assert_eq!(config.line_thickness, 2);
        assert_eq!(config.box_style().color, Color::new(0, 255, 0, 255));
        assert_eq!(config.region_extractor().threshold(), 25);
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diff.json");
        std::fs::write(&path, "{ threshold: ").unwrap();
        assert!(matches!(
            DiffConfig::from_json_file(&path),
            Err(InfrastructureError::ConfigParseError(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            DiffConfig::from_json_file(&dir.path().join("absent.json")),
            Err(InfrastructureError::ConfigReadError { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_width = DiffConfig { line_thickness: 0, ..Default::default() };
        assert!(matches!(zero_width.validate(), Err(ApplicationError::ConfigurationError(_))));

        let bad_ratio = DiffConfig { max_ratio: Some(1.5), ..Default::default() };
        assert!(matches!(bad_ratio.validate(), Err(ApplicationError::ConfigurationError(_))));
    }

    #[test]
    fn test_derive_output_paths() {
        let outputs = OutputPaths::derive(Path::new("shots/base.png"), Path::new("other/head.jpg")).unwrap();
        assert_eq!(outputs.diff, PathBuf::from("shots/diff.png"));
        assert_eq!(outputs.annotated_one, PathBuf::from("shots/base-annotated.png"));
        assert_eq!(outputs.annotated_two, PathBuf::from("other/head-annotated.jpg"));
        assert!(outputs.check_inputs(Path::new("shots/base.png"), Path::new("other/head.jpg")).is_ok());
    }

    #[test]
    fn test_derived_diff_never_lands_on_an_input() {
        let outputs = OutputPaths::derive(Path::new("shots/diff.png"), Path::new("shots/new.png")).unwrap();
        assert_eq!(outputs.diff, PathBuf::from("shots/diff-1.png"));
        assert_eq!(outputs.annotated_one, PathBuf::from("shots/diff-annotated.png"));

        let outputs = OutputPaths::derive(Path::new("shots/old.png"), Path::new("shots/diff.png")).unwrap();
        assert_eq!(outputs.diff, PathBuf::from("shots/diff-1.png"));

        let outputs = OutputPaths::derive(Path::new("shots/diff.png"), Path::new("shots/diff-1.png")).unwrap();
        assert_eq!(outputs.diff, PathBuf::from("shots/diff-2.png"));
        assert!(outputs.check_inputs(Path::new("shots/diff.png"), Path::new("shots/diff-1.png")).is_ok());
    }

    #[test]
    fn test_check_inputs_rejects_overwrites() {
        let one = Path::new("shots/a.png");
        let two = Path::new("shots/a-annotated.png");

        // 二枚目が一枚目の注釈画像と同名
        let derived = OutputPaths::derive(one, two).unwrap();
        assert!(matches!(
            derived.check_inputs(one, two),
            Err(ApplicationError::ConfigurationError(_))
        ));

        let mut overridden = OutputPaths::derive(one, Path::new("shots/b.png")).unwrap();
        overridden.diff = one.to_path_buf();
        assert!(matches!(
            overridden.check_inputs(one, Path::new("shots/b.png")),
            Err(ApplicationError::ConfigurationError(_))
        ));

        let mut duplicated = OutputPaths::derive(one, Path::new("shots/b.png")).unwrap();
        duplicated.annotated_two = duplicated.annotated_one.clone();
        assert!(duplicated.check_inputs(one, Path::new("shots/b.png")).is_err());
    }

    #[test]
    fn test_check_inputs_resolves_existing_files() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("base.png");
        std::fs::write(&input, b"").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let outputs = OutputPaths {
            diff: dir.path().join("sub").join("..").join("base.png"),
            annotated_one: dir.path().join("one.png"),
            annotated_two: dir.path().join("two.png"),
        };
        assert!(outputs.check_inputs(&input, &dir.path().join("other.png")).is_err());
    }
}
