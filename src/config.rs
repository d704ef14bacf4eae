use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::weka::command::{DEFAULT_FOLDS, STRING_TO_NOMINAL};
use crate::weka::{Classifier, WekaConfig};

/// Settings for the end-to-end brand pipeline.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// input = "survey.csv"
/// folds = 5
///
/// [weka]
/// heap_gb = 4
/// classpath = ["/opt/weka/weka.jar", "/opt/weka/mtj.jar", "."]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source table (CSV, JSON or Parquet).
    pub input: PathBuf,
    pub arff_out: PathBuf,
    pub model_out: PathBuf,
    pub class_attr: String,
    pub relation: String,
    pub classifier: Classifier,
    /// FilteredClassifier filter spec; empty trains the classifier unfiltered.
    pub filter: String,
    pub folds: u32,
    /// Keep the one-row prediction ARFF instead of deleting it.
    pub keep_temp: bool,
    pub weka: WekaConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data_full_english.csv"),
            arff_out: PathBuf::from("sample.arff"),
            model_out: PathBuf::from("brand.model"),
            class_attr: "Current_brand".to_string(),
            relation: "smartphone".to_string(),
            classifier: Classifier::J48,
            filter: STRING_TO_NOMINAL.to_string(),
            folds: DEFAULT_FOLDS,
            keep_temp: false,
            weka: WekaConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults, overlaid by an optional TOML file, overlaid by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// `WEKA_JAR`, `MTJ_JAR`, `JAVA` and `WEKA_HEAP_GB` override the toolkit settings.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(jar) = lookup("WEKA_JAR") {
            self.weka.set_weka_jar(jar.into());
        }
        if let Some(jar) = lookup("MTJ_JAR") {
            self.weka.set_mtj_jar(jar.into());
        }
        if let Some(java) = lookup("JAVA") {
            self.weka.java = java;
        }
        if let Some(heap) = lookup("WEKA_HEAP_GB") {
            match heap.trim().parse() {
                Ok(gb) => self.weka.heap_gb = gb,
                Err(_) => log::warn!("Ignoring WEKA_HEAP_GB={heap}: not a whole number"),
            }
        }
    }

    pub fn filter(&self) -> Option<String> {
        let f = self.filter.trim();
        (!f.is_empty()).then(|| f.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_overrides_only_given_keys() {
        let cfg: PipelineConfig = toml::from_str(
            r#"
            input = "survey.parquet"
            classifier = "NaiveBayes"
            filter = ""

            [weka]
            heap_gb = 8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.input, PathBuf::from("survey.parquet"));
        assert_eq!(cfg.classifier, Classifier::NaiveBayes);
        assert_eq!(cfg.filter(), None);
        assert_eq!(cfg.weka.heap_gb, 8);
        assert_eq!(cfg.class_attr, "Current_brand");
        assert_eq!(cfg.folds, 10);
    }

    #[test]
    fn environment_overrides_toolkit_settings() {
        let env: HashMap<&str, &str> = [
            ("WEKA_JAR", "/opt/weka.jar"),
            ("JAVA", "/usr/lib/jvm/bin/java"),
            ("WEKA_HEAP_GB", "lots"),
        ]
        .into_iter()
        .collect();
        let mut cfg = PipelineConfig::default();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.weka.classpath[0], PathBuf::from("/opt/weka.jar"));
        assert_eq!(cfg.weka.classpath[1], PathBuf::from("model/mtj-1.0.4.jar"));
        assert_eq!(cfg.weka.java, "/usr/lib/jvm/bin/java");
        assert_eq!(cfg.weka.heap_gb, 2);
    }

    #[test]
    fn from_file_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "folds = \"ten\"").unwrap();
        let err = PipelineConfig::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
