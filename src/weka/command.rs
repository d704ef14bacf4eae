use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const FILTERED_CLASSIFIER: &str = "weka.classifiers.meta.FilteredClassifier";
pub const STRING_TO_NOMINAL: &str = "weka.filters.unsupervised.attribute.StringToNominal -R first-last";
pub const DEFAULT_FOLDS: u32 = 10;
pub const CLASS_LAST: &str = "last";

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Base classifier handed to Weka.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Classifier {
    #[default]
    J48,
    NaiveBayes,
    /// Any fully qualified Weka classifier class.
    Custom(String),
}

impl Classifier {
    pub fn class_name(&self) -> &str {
        match self {
            Classifier::J48 => "weka.classifiers.trees.J48",
            Classifier::NaiveBayes => "weka.classifiers.bayes.NaiveBayes",
            Classifier::Custom(name) => name,
        }
    }
}

impl FromStr for Classifier {
    type Err = std::convert::Infallible;

    /// Short names map to known classes; unknown short names fall back to J48.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "J48" | "j48" | "weka.classifiers.trees.J48" => Classifier::J48,
            "NaiveBayes" | "naivebayes" | "weka.classifiers.bayes.NaiveBayes" => {
                Classifier::NaiveBayes
            }
            qualified if qualified.starts_with("weka.") => Classifier::Custom(qualified.to_string()),
            other => {
                log::warn!("Unknown classifier '{other}', using J48");
                Classifier::J48
            }
        })
    }
}

impl TryFrom<String> for Classifier {
    type Error = std::convert::Infallible;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Classifier> for String {
    fn from(c: Classifier) -> Self {
        c.class_name().to_string()
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

fn path_arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// Train
// ---------------------------------------------------------------------------

/// Arguments for a training run (`-t ... -d ...`).
#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub classifier: Classifier,
    /// Filter spec for FilteredClassifier; `None` runs the classifier directly.
    pub filter: Option<String>,
    pub train: PathBuf,
    pub model_out: PathBuf,
    pub class_index: String,
    /// Cross-validation folds (`-x`).
    pub folds: Option<u32>,
    /// Suppress the model dump and print statistics only (`-o`).
    pub summary_only: bool,
    /// Extra scheme options appended verbatim.
    pub extra: Vec<String>,
}

impl TrainRequest {
    /// FilteredClassifier(StringToNominal ▸ J48), class last, 10-fold CV, summary only.
    pub fn new(train: impl Into<PathBuf>, model_out: impl Into<PathBuf>) -> Self {
        TrainRequest {
            classifier: Classifier::J48,
            filter: Some(STRING_TO_NOMINAL.to_string()),
            train: train.into(),
            model_out: model_out.into(),
            class_index: CLASS_LAST.to_string(),
            folds: Some(DEFAULT_FOLDS),
            summary_only: true,
            extra: Vec::new(),
        }
    }

    /// Top-level scheme class; predictions must load the model with the same one.
    pub fn scheme(&self) -> &str {
        match self.filter {
            Some(_) => FILTERED_CLASSIFIER,
            None => self.classifier.class_name(),
        }
    }

    pub fn scheme_description(&self) -> String {
        match &self.filter {
            Some(_) => format!("FilteredClassifier({})", self.classifier.class_name()),
            None => self.classifier.class_name().to_string(),
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match &self.filter {
            Some(filter) => {
                args.push(FILTERED_CLASSIFIER.to_string());
                args.push("-F".into());
                args.push(filter.clone());
                args.push("-W".into());
                args.push(self.classifier.class_name().to_string());
            }
            None => args.push(self.classifier.class_name().to_string()),
        }
        args.extend([
            "-t".to_string(),
            path_arg(&self.train),
            "-d".to_string(),
            path_arg(&self.model_out),
            "-c".to_string(),
            self.class_index.clone(),
        ]);
        if let Some(folds) = self.folds {
            args.push("-x".into());
            args.push(folds.to_string());
        }
        if self.summary_only {
            args.push("-o".into());
        }
        args.extend(self.extra.iter().cloned());
        args
    }
}

// ---------------------------------------------------------------------------
// Predict
// ---------------------------------------------------------------------------

/// Arguments for scoring a test file with a saved model (`-l ... -T ... -p 0`).
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub scheme: String,
    pub model: PathBuf,
    pub test: PathBuf,
    pub class_index: String,
    pub distribution: bool,
}

impl PredictRequest {
    pub fn new(scheme: impl Into<String>, model: impl Into<PathBuf>, test: impl Into<PathBuf>) -> Self {
        PredictRequest {
            scheme: scheme.into(),
            model: model.into(),
            test: test.into(),
            class_index: CLASS_LAST.to_string(),
            distribution: true,
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            self.scheme.clone(),
            "-l".into(),
            path_arg(&self.model),
            "-T".into(),
            path_arg(&self.test),
            "-p".into(),
            "0".into(),
        ];
        if self.distribution {
            args.push("-distribution".into());
        }
        args.push("-c".into());
        args.push(self.class_index.clone());
        args
    }
}

// ---------------------------------------------------------------------------
// Model info
// ---------------------------------------------------------------------------

/// Load a model and evaluate it on a header-only file, which makes Weka print the model.
#[derive(Debug, Clone)]
pub struct ModelInfoRequest {
    pub scheme: String,
    pub model: PathBuf,
    pub header_arff: PathBuf,
}

impl ModelInfoRequest {
    pub fn new(scheme: impl Into<String>, model: impl Into<PathBuf>, header_arff: impl Into<PathBuf>) -> Self {
        ModelInfoRequest {
            scheme: scheme.into(),
            model: model.into(),
            header_arff: header_arff.into(),
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        vec![
            self.scheme.clone(),
            "-l".into(),
            path_arg(&self.model),
            "-T".into(),
            path_arg(&self.header_arff),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_train_args_match_filtered_j48_cv() {
        let req = TrainRequest::new("sample.arff", "brand.model");
        assert_eq!(
            req.to_args(),
            vec![
                "weka.classifiers.meta.FilteredClassifier",
                "-F",
                "weka.filters.unsupervised.attribute.StringToNominal -R first-last",
                "-W",
                "weka.classifiers.trees.J48",
                "-t",
                "sample.arff",
                "-d",
                "brand.model",
                "-c",
                "last",
                "-x",
                "10",
                "-o",
            ]
        );
        assert_eq!(req.scheme(), FILTERED_CLASSIFIER);
    }

    #[test]
    fn unfiltered_train_runs_classifier_directly() {
        let mut req = TrainRequest::new("a.arff", "m.model");
        req.classifier = Classifier::NaiveBayes;
        req.filter = None;
        req.folds = None;
        req.summary_only = false;
        req.extra = vec!["-K".into()];
        assert_eq!(
            req.to_args(),
            vec![
                "weka.classifiers.bayes.NaiveBayes",
                "-t",
                "a.arff",
                "-d",
                "m.model",
                "-c",
                "last",
                "-K",
            ]
        );
        assert_eq!(req.scheme(), "weka.classifiers.bayes.NaiveBayes");
    }

    #[test]
    fn predict_args_request_distribution() {
        let req = PredictRequest::new(FILTERED_CLASSIFIER, "brand.model", "/tmp/row.arff");
        assert_eq!(
            req.to_args(),
            vec![
                FILTERED_CLASSIFIER,
                "-l",
                "brand.model",
                "-T",
                "/tmp/row.arff",
                "-p",
                "0",
                "-distribution",
                "-c",
                "last",
            ]
        );
    }

    #[test]
    fn model_info_args() {
        let req = ModelInfoRequest::new("weka.classifiers.trees.J48", "m.model", "empty.arff");
        assert_eq!(
            req.to_args(),
            vec!["weka.classifiers.trees.J48", "-l", "m.model", "-T", "empty.arff"]
        );
    }

    #[test]
    fn classifier_names() {
        assert_eq!("J48".parse::<Classifier>().unwrap(), Classifier::J48);
        assert_eq!("NaiveBayes".parse::<Classifier>().unwrap(), Classifier::NaiveBayes);
        assert_eq!(
            "weka.classifiers.functions.SMO".parse::<Classifier>().unwrap(),
            Classifier::Custom("weka.classifiers.functions.SMO".into())
        );
        assert_eq!("RandomThing".parse::<Classifier>().unwrap(), Classifier::J48);
    }
}
