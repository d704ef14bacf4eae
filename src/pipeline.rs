use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::arff::{convert, parser, writer, ArffDataset};
use crate::config::PipelineConfig;
use crate::data::loader;
use crate::data::model::{Table, Value};
use crate::reorder::Reordered;
use crate::weka::{Evaluation, PredictRequest, Prediction, ToolkitRunner, TrainRequest, Weka};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// Everything the pipeline produced, printable as text or JSON.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub arff_path: PathBuf,
    pub model_path: PathBuf,
    pub rows: usize,
    pub attributes: usize,
    pub evaluation: Evaluation,
    pub prediction: Prediction,
    /// Distribution paired with the class attribute's nominal values.
    pub probabilities: Vec<ClassProbability>,
    /// Set when the one-row prediction file was kept.
    pub prediction_input: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Load → ARFF → train with CV → predict the first row with its class hidden.
pub fn run_pipeline<R: ToolkitRunner>(config: &PipelineConfig, weka: &Weka<R>) -> Result<PipelineReport> {
    log::info!("Converting {} → ARFF", config.input.display());
    let table = loader::load_file(&config.input)?;
    let dataset = export_arff(table, config)?;
    log::info!(
        "ARFF saved → {} ({} rows, {} attributes)",
        config.arff_out.display(),
        dataset.rows.len(),
        dataset.attributes.len()
    );

    let train = train_request(config);
    let outcome = weka.train(&train)?;
    let evaluation = outcome
        .evaluation()
        .context("reading the evaluation summary")?;
    log::info!(
        "{} accuracy: {:.4} %",
        evaluation.source,
        evaluation.accuracy
    );

    let temp = one_row_arff(&dataset)?;
    let request = PredictRequest::new(train.scheme(), &config.model_out, temp.path());
    let predictions = weka.predict(&request)?;
    let Some(prediction) = predictions.into_iter().next() else {
        bail!("Weka returned no prediction for the demo row");
    };

    let prediction_input = if config.keep_temp {
        let (_, path) = temp.keep().context("keeping the prediction input file")?;
        log::info!("Prediction input kept → {}", path.display());
        Some(path)
    } else {
        None
    };

    let probabilities = class_probabilities(&dataset, &prediction);
    Ok(PipelineReport {
        arff_path: config.arff_out.clone(),
        model_path: config.model_out.clone(),
        rows: dataset.rows.len(),
        attributes: dataset.attributes.len(),
        evaluation,
        prediction,
        probabilities,
        prediction_input,
    })
}

/// Move the class last, infer types and write the training ARFF.
pub fn export_arff(mut table: Table, config: &PipelineConfig) -> Result<ArffDataset> {
    if table.is_empty() {
        bail!("{} has no data rows", config.input.display());
    }
    table
        .move_column_last(&config.class_attr)
        .with_context(|| format!("preparing {}", config.input.display()))?;
    let dataset = convert::table_to_arff(&table, &config.relation);
    writer::save(&dataset, &config.arff_out)
        .with_context(|| format!("writing {}", config.arff_out.display()))?;
    Ok(dataset)
}

pub fn train_request(config: &PipelineConfig) -> TrainRequest {
    let mut req = TrainRequest::new(&config.arff_out, &config.model_out);
    req.classifier = config.classifier.clone();
    req.filter = config.filter();
    req.folds = Some(config.folds);
    req
}

/// First data row with its class set to `?`, under the training header.
pub fn one_row_arff(dataset: &ArffDataset) -> Result<tempfile::NamedTempFile> {
    let mut row = dataset
        .rows
        .first()
        .cloned()
        .context("dataset has no rows to predict")?;
    if let Some(class) = row.last_mut() {
        *class = Value::Missing;
    }
    let one = dataset.with_rows(vec![row]);

    let mut file = tempfile::Builder::new()
        .prefix("brand-row-")
        .suffix(".arff")
        .tempfile()
        .context("creating temporary ARFF")?;
    writer::write_arff(&one, &mut file).context("writing temporary ARFF")?;
    Ok(file)
}

// ---------------------------------------------------------------------------
// ARFF reordering
// ---------------------------------------------------------------------------

/// One file handled by [`move_class_in_files`].
#[derive(Debug, Clone, PartialEq)]
pub struct MovedFile {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub outcome: Reordered,
    /// False when the class was already last and the file was left alone.
    pub written: bool,
}

/// Move the class attribute last in each ARFF file, in place or into `output`.
pub fn move_class_in_files(
    files: &[PathBuf],
    class_attr: &str,
    output: Option<&Path>,
) -> Result<Vec<MovedFile>> {
    if output.is_some() && files.len() > 1 {
        bail!("--output needs exactly one input file");
    }
    let mut moved = Vec::with_capacity(files.len());
    for src in files {
        let dst = output.unwrap_or(src.as_path());
        let mut dataset = parser::load(src).with_context(|| format!("reading {}", src.display()))?;
        let outcome = dataset
            .move_class_last(class_attr)
            .with_context(|| format!("reordering {}", src.display()))?;

        let written = !(outcome == Reordered::AlreadyLast && dst == src.as_path());
        if written {
            writer::save(&dataset, dst).with_context(|| format!("writing {}", dst.display()))?;
            log::info!("{} → {}", src.display(), dst.display());
        } else {
            log::info!("{} already last", src.display());
        }
        moved.push(MovedFile {
            src: src.clone(),
            dst: dst.to_path_buf(),
            outcome,
            written,
        });
    }
    Ok(moved)
}

// ---------------------------------------------------------------------------
// Prediction input
// ---------------------------------------------------------------------------

/// Read prediction input: `.arff` through the ARFF parser, anything else as a table.
pub fn load_input(path: &Path) -> Result<Table> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("arff") => {
            let dataset = parser::load(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(convert::arff_to_table(&dataset))
        }
        _ => loader::load_file(path),
    }
}

/// Map input rows onto the training header with `class_attr` last.
///
/// Unlabelled input gets `?` for the class; labelled input must carry it, so
/// Weka can report the actual class and flag errors.
pub fn prediction_dataset(
    table: &Table,
    header: &ArffDataset,
    class_attr: &str,
    labelled: bool,
) -> Result<ArffDataset> {
    let mut template = header.header_only();
    template
        .move_class_last(class_attr)
        .context("matching the header's class attribute")?;
    convert::template_rows(table, &template, labelled)
}

fn class_probabilities(dataset: &ArffDataset, prediction: &Prediction) -> Vec<ClassProbability> {
    let labels = dataset
        .class_attribute()
        .and_then(|a| a.nominal_values())
        .unwrap_or_default();
    labels
        .iter()
        .zip(&prediction.distribution)
        .map(|(label, p)| ClassProbability {
            label: label.clone(),
            probability: *p,
        })
        .collect()
}
