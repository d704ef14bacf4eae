/// Weka toolkit layer: everything past the ARFF file is the toolkit's business.
///
/// ```text
///   TrainRequest / PredictRequest / ModelInfoRequest
///        │  command: build argument vectors
///        ▼
///   ToolkitRunner  (JavaRunner spawns `java -Xmx.. -cp .. <args>`)
///        │  stdout
///        ▼
///   output: scrape predictions / evaluation summary
/// ```
pub mod command;
pub mod config;
pub mod output;
pub mod runner;

use std::path::PathBuf;

use thiserror::Error;

pub use command::{Classifier, ModelInfoRequest, PredictRequest, TrainRequest};
pub use config::WekaConfig;
pub use output::{Evaluation, Prediction};
pub use runner::{JavaRunner, ToolkitRunner};

#[derive(Debug, Error)]
pub enum WekaError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Weka exited with {status}:\n{stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error("Weka didn't return predictions!\n{0}")]
    NoPredictions(String),

    #[error("no evaluation summary in Weka output")]
    NoSummary,

    #[error("cannot create model directory {path}: {source}")]
    ModelDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Raw output of a training run.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: PathBuf,
    pub stdout: String,
}

impl TrainOutcome {
    /// Parse the evaluation summary the toolkit printed.
    pub fn evaluation(&self) -> Result<Evaluation, WekaError> {
        output::parse_evaluation(&self.stdout)
    }
}

/// High-level operations on top of a [`ToolkitRunner`].
pub struct Weka<R: ToolkitRunner> {
    runner: R,
}

impl<R: ToolkitRunner> Weka<R> {
    pub fn new(runner: R) -> Self {
        Weka { runner }
    }

    /// Train (and optionally cross-validate) a classifier, saving the model.
    pub fn train(&self, req: &TrainRequest) -> Result<TrainOutcome, WekaError> {
        if let Some(dir) = req.model_out.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| WekaError::ModelDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        log::info!(
            "Training {} on {}",
            req.scheme_description(),
            req.train.display()
        );
        let stdout = self.runner.run(&req.to_args())?;
        log::info!("Model saved → {}", req.model_out.display());
        Ok(TrainOutcome {
            model: req.model_out.clone(),
            stdout,
        })
    }

    /// Predict every instance of the test file with a saved model.
    pub fn predict(&self, req: &PredictRequest) -> Result<Vec<Prediction>, WekaError> {
        log::info!("Predicting {} with {}", req.test.display(), req.model.display());
        let stdout = self.runner.run(&req.to_args())?;
        output::parse_predictions(&stdout)
    }

    /// Describe a saved model by evaluating it on a header-only file.
    pub fn model_info(&self, req: &ModelInfoRequest) -> Result<String, WekaError> {
        self.runner.run(&req.to_args())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::{ToolkitRunner, WekaError};

    /// Runner that replays canned stdout and records every argument vector.
    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: RefCell<VecDeque<Result<String, WekaError>>>,
        pub calls: RefCell<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, stdout: &str) -> Self {
            self.responses.borrow_mut().push_back(Ok(stdout.to_string()));
            self
        }

        pub fn fail(self, err: WekaError) -> Self {
            self.responses.borrow_mut().push_back(Err(err));
            self
        }
    }

    impl ToolkitRunner for ScriptedRunner {
        fn run(&self, args: &[String]) -> Result<String, WekaError> {
            self.calls.borrow_mut().push(args.to_vec());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;

    #[test]
    fn train_creates_model_dir_and_keeps_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("models").join("brand.model");
        let runner = ScriptedRunner::new().respond("=== Summary ===\n");
        let weka = Weka::new(&runner);

        let req = TrainRequest::new("sample.arff", &model);
        let outcome = weka.train(&req).unwrap();

        assert!(model.parent().unwrap().is_dir());
        assert_eq!(outcome.model, model);
        assert_eq!(outcome.stdout, "=== Summary ===\n");
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn process_failure_carries_stderr() {
        let weka = Weka::new(ScriptedRunner::new().fail(WekaError::ProcessFailed {
            status: "exit status: 1".into(),
            stderr: "java.io.FileNotFoundException: brand.model".into(),
        }));
        let req = PredictRequest::new("weka.classifiers.meta.FilteredClassifier", "brand.model", "t.arff");
        let err = weka.predict(&req).unwrap_err();
        assert!(err.to_string().contains("FileNotFoundException"));
    }
}
