use std::fmt;

use serde::Serialize;

use super::WekaError;

// ---------------------------------------------------------------------------
// Predictions (`-p 0 -distribution`)
// ---------------------------------------------------------------------------

/// One row of Weka's prediction listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub instance: usize,
    /// `None` when the test file held `?` for the class.
    pub actual: Option<String>,
    pub predicted: String,
    /// Weka's `+` marker: predicted differs from actual.
    pub error: bool,
    /// Class probabilities in nominal declaration order; empty when not printed.
    pub distribution: Vec<f64>,
}

impl Prediction {
    /// Probability assigned to the predicted class, if a distribution was printed.
    pub fn confidence(&self) -> Option<f64> {
        self.distribution.iter().copied().reduce(f64::max)
    }
}

/// Scrape every prediction line (first non-space character is a digit).
///
/// ```text
///  inst#     actual  predicted error distribution
///      1        1:?    2:Apple       0.1,*0.8,0.1
/// ```
pub fn parse_predictions(stdout: &str) -> Result<Vec<Prediction>, WekaError> {
    let predictions: Vec<Prediction> = stdout
        .lines()
        .filter(|ln| {
            ln.trim_start()
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
        .filter_map(parse_prediction_line)
        .collect();

    if predictions.is_empty() {
        return Err(WekaError::NoPredictions(stdout.to_string()));
    }
    Ok(predictions)
}

fn parse_prediction_line(line: &str) -> Option<Prediction> {
    let cols: Vec<&str> = line.split_whitespace().collect();
    if cols.len() < 3 {
        return None;
    }
    let instance = cols[0].parse().ok()?;
    let actual = Some(label_of(cols[1]))
        .filter(|a| *a != "?")
        .map(str::to_string);
    let predicted = label_of(cols[2]).to_string();

    let rest = &cols[3..];
    let error = rest.first() == Some(&"+");
    let distribution = rest
        .last()
        .filter(|tok| **tok != "+")
        .map(|tok| parse_distribution(tok))
        .unwrap_or_default();

    Some(Prediction {
        instance,
        actual,
        predicted,
        error,
        distribution,
    })
}

/// `2:Apple` → `Apple`; tokens without an index pass through.
fn label_of(token: &str) -> &str {
    token.split_once(':').map_or(token, |(_, label)| label)
}

/// `(0.1,*0.8,0.1)` / `[..]` / bare → probabilities. Anything unparsable yields an empty vector.
fn parse_distribution(token: &str) -> Vec<f64> {
    let inner = token.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']'));
    inner
        .split(',')
        .map(|p| p.trim().trim_start_matches('*').parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Evaluation summary
// ---------------------------------------------------------------------------

/// Which evaluation produced the figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    CrossValidation,
    TrainingData,
    TestData,
    Unknown,
}

impl EvaluationSource {
    fn from_header(header: &str) -> Self {
        let h = header.to_ascii_lowercase();
        if h.contains("cross-validation") {
            EvaluationSource::CrossValidation
        } else if h.contains("training") {
            EvaluationSource::TrainingData
        } else if h.contains("test") {
            EvaluationSource::TestData
        } else {
            EvaluationSource::Unknown
        }
    }
}

impl fmt::Display for EvaluationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvaluationSource::CrossValidation => "cross-validation",
            EvaluationSource::TrainingData => "training data",
            EvaluationSource::TestData => "test data",
            EvaluationSource::Unknown => "evaluation",
        };
        f.write_str(s)
    }
}

/// Figures from one `=== Summary ===` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub source: EvaluationSource,
    pub correctly_classified: f64,
    /// Percentage of correctly classified instances.
    pub accuracy: f64,
    pub incorrectly_classified: Option<f64>,
    pub error_rate: Option<f64>,
    pub kappa: Option<f64>,
    pub mean_absolute_error: Option<f64>,
    pub root_mean_squared_error: Option<f64>,
    pub relative_absolute_error: Option<f64>,
    pub root_relative_squared_error: Option<f64>,
    pub total_instances: Option<f64>,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.source)?;
        writeln!(
            f,
            "Correctly classified   {:>8} ({:.4} %)",
            self.correctly_classified, self.accuracy
        )?;
        if let (Some(n), Some(p)) = (self.incorrectly_classified, self.error_rate) {
            writeln!(f, "Incorrectly classified {n:>8} ({p:.4} %)")?;
        }
        let optional = [
            ("Kappa statistic", self.kappa),
            ("Mean absolute error", self.mean_absolute_error),
            ("Root mean squared error", self.root_mean_squared_error),
            ("Total instances", self.total_instances),
        ];
        for (label, value) in optional {
            if let Some(v) = value {
                writeln!(f, "{label:<23}{v:>9}")?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct Block {
    source: Option<EvaluationSource>,
    correct: Option<(f64, f64)>,
    incorrect: Option<(f64, f64)>,
    kappa: Option<f64>,
    mae: Option<f64>,
    rmse: Option<f64>,
    rae: Option<f64>,
    rrse: Option<f64>,
    total: Option<f64>,
}

impl Block {
    fn into_evaluation(self) -> Option<Evaluation> {
        let (correctly_classified, accuracy) = self.correct?;
        Some(Evaluation {
            source: self.source.unwrap_or(EvaluationSource::Unknown),
            correctly_classified,
            accuracy,
            incorrectly_classified: self.incorrect.map(|(n, _)| n),
            error_rate: self.incorrect.map(|(_, p)| p),
            kappa: self.kappa,
            mean_absolute_error: self.mae,
            root_mean_squared_error: self.rmse,
            relative_absolute_error: self.rae,
            root_relative_squared_error: self.rrse,
            total_instances: self.total,
        })
    }
}

/// Extract the evaluation summary, preferring the cross-validation block and
/// falling back to the last block that reports accuracy.
pub fn parse_evaluation(stdout: &str) -> Result<Evaluation, WekaError> {
    let mut blocks: Vec<Block> = vec![Block::default()];
    let mut source: Option<EvaluationSource> = None;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix("===") {
            // `=== Summary ===` continues the evaluation named by the previous header.
            if !header.to_ascii_lowercase().contains("summary") {
                source = Some(EvaluationSource::from_header(header));
            }
            blocks.push(Block {
                source,
                ..Block::default()
            });
            continue;
        }
        let Some(block) = blocks.last_mut() else {
            continue;
        };
        if let Some(rest) = trimmed.strip_prefix("Correctly Classified Instances") {
            block.correct = count_and_percent(rest);
        } else if let Some(rest) = trimmed.strip_prefix("Incorrectly Classified Instances") {
            block.incorrect = count_and_percent(rest);
        } else if let Some(rest) = trimmed.strip_prefix("Kappa statistic") {
            block.kappa = first_number(rest);
        } else if let Some(rest) = trimmed.strip_prefix("Mean absolute error") {
            block.mae = first_number(rest);
        } else if let Some(rest) = trimmed.strip_prefix("Root mean squared error") {
            block.rmse = first_number(rest);
        } else if let Some(rest) = trimmed.strip_prefix("Relative absolute error") {
            block.rae = first_number(rest);
        } else if let Some(rest) = trimmed.strip_prefix("Root relative squared error") {
            block.rrse = first_number(rest);
        } else if let Some(rest) = trimmed.strip_prefix("Total Number of Instances") {
            block.total = first_number(rest);
        }
    }

    let mut evaluations: Vec<Evaluation> = blocks
        .into_iter()
        .filter_map(Block::into_evaluation)
        .collect();

    if let Some(pos) = evaluations
        .iter()
        .position(|e| e.source == EvaluationSource::CrossValidation)
    {
        return Ok(evaluations.swap_remove(pos));
    }
    evaluations.pop().ok_or(WekaError::NoSummary)
}

fn first_number(s: &str) -> Option<f64> {
    s.split_whitespace().next()?.parse().ok()
}

fn count_and_percent(s: &str) -> Option<(f64, f64)> {
    let mut it = s.split_whitespace();
    let count = it.next()?.parse().ok()?;
    let pct = it.next()?.parse().ok()?;
    Some((count, pct))
}
