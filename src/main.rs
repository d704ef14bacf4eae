mod arff;
mod config;
mod data;
mod pipeline;
mod reorder;
mod weka;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::arff::{convert, parser, writer};
use crate::config::PipelineConfig;
use crate::data::loader;
use crate::weka::command::{CLASS_LAST, DEFAULT_FOLDS, FILTERED_CLASSIFIER, STRING_TO_NOMINAL};
use crate::weka::{
    Classifier, JavaRunner, ModelInfoRequest, PredictRequest, Prediction, TrainRequest, Weka,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOpts {
    /// TOML file with pipeline and toolkit settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Java executable
    #[arg(long, global = true)]
    java: Option<String>,

    /// JVM max heap in GB
    #[arg(long, global = true)]
    heap_gb: Option<u32>,

    /// Full classpath, replacing the configured jars
    #[arg(long, global = true, value_delimiter = ',')]
    classpath: Option<Vec<PathBuf>>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args)]
struct PredictOpts {
    input: PathBuf,
    #[arg(long, default_value = "brand.model")]
    model: PathBuf,
    /// Training ARFF whose header the input is mapped onto
    #[arg(long)]
    header: PathBuf,
    /// Class attribute of the header; defaults to the configured one
    #[arg(long)]
    class_attr: Option<String>,
    /// Input carries the class: keep it so Weka reports actual and errors
    #[arg(long)]
    labelled: bool,
    #[arg(long, default_value = FILTERED_CLASSIFIER)]
    scheme: String,
    #[arg(long)]
    json: bool,
    /// Keep the generated test ARFF
    #[arg(long)]
    keep_temp: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CSV/JSON/Parquet table to ARFF with the class column last
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "Current_brand")]
        class_attr: String,
        #[arg(long, default_value = "smartphone")]
        relation: String,
        /// Keep the column order as loaded
        #[arg(long)]
        no_reorder: bool,
    },

    /// Move the class attribute of ARFF files to the last position
    MoveClass {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "Current_brand")]
        class_attr: String,
        /// Write here instead of overwriting (single input only)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Train a classifier on an ARFF file and print its evaluation
    Train {
        arff: PathBuf,
        #[arg(long, default_value = "brand.model")]
        model: PathBuf,
        /// J48, NaiveBayes or a fully qualified Weka class
        #[arg(long, default_value = "J48")]
        classifier: Classifier,
        #[arg(long, default_value = STRING_TO_NOMINAL, conflicts_with = "no_filter")]
        filter: String,
        /// Run the classifier without the FilteredClassifier wrapper
        #[arg(long)]
        no_filter: bool,
        #[arg(long, default_value_t = DEFAULT_FOLDS)]
        folds: u32,
        /// Evaluate on training data only
        #[arg(long, conflicts_with = "folds")]
        no_cv: bool,
        #[arg(long, default_value = CLASS_LAST)]
        class_index: String,
        /// Print the model as well as the statistics
        #[arg(long)]
        full_output: bool,
        #[arg(long)]
        json: bool,
        /// Extra scheme options, after `--`
        #[arg(last = true)]
        extra: Vec<String>,
    },

    /// Predict rows of a table or ARFF file with a saved model
    Predict(PredictOpts),

    /// Print the toolkit's description of a saved model
    ModelInfo {
        #[arg(long, default_value = "brand.model")]
        model: PathBuf,
        /// ARFF whose header matches the model
        #[arg(long)]
        header: PathBuf,
        #[arg(long, default_value = FILTERED_CLASSIFIER)]
        scheme: String,
    },

    /// CSV → ARFF → train with cross-validation → predict the first row
    Pipeline {
        /// Input table, overriding the configured one
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        keep_temp: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let config = load_config(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            class_attr,
            relation,
            no_reorder,
        } => run_convert(&input, &output, &class_attr, &relation, no_reorder),
        Commands::MoveClass {
            files,
            class_attr,
            output,
        } => run_move_class(&files, &class_attr, output.as_deref()),
        Commands::Train {
            arff,
            model,
            classifier,
            filter,
            no_filter,
            folds,
            no_cv,
            class_index,
            full_output,
            json,
            extra,
        } => {
            let mut req = TrainRequest::new(arff, model);
            req.classifier = classifier;
            req.filter = (!no_filter).then_some(filter);
            req.folds = (!no_cv).then_some(folds);
            req.class_index = class_index;
            req.summary_only = !full_output;
            req.extra = extra;
            run_train(&config, &req, json)
        }
        Commands::Predict(opts) => run_predict(&config, &opts),
        Commands::ModelInfo {
            model,
            header,
            scheme,
        } => run_model_info(&config, &model, &header, &scheme),
        Commands::Pipeline {
            input,
            json,
            keep_temp,
        } => {
            let mut config = config;
            if let Some(input) = input {
                config.input = input;
            }
            config.keep_temp |= keep_temp;
            run_pipeline(&config, json)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Defaults < TOML file < environment < command-line flags.
fn load_config(opts: &GlobalOpts) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(opts.config.as_deref())?;
    if let Some(java) = &opts.java {
        config.weka.java = java.clone();
    }
    if let Some(gb) = opts.heap_gb {
        config.weka.heap_gb = gb;
    }
    if let Some(cp) = &opts.classpath {
        config.weka.classpath = cp.clone();
    }
    log::debug!("Toolkit settings: {:?}", config.weka);
    Ok(config)
}

fn weka(config: &PipelineConfig) -> Weka<JavaRunner> {
    Weka::new(JavaRunner::new(config.weka.clone()))
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_convert(input: &Path, output: &Path, class_attr: &str, relation: &str, no_reorder: bool) -> Result<()> {
    log::info!("Converting {} → ARFF", input.display());
    let mut table = loader::load_file(input)?;
    if !no_reorder {
        table
            .move_column_last(class_attr)
            .with_context(|| format!("preparing {}", input.display()))?;
    }
    let dataset = convert::table_to_arff(&table, relation);
    writer::save(&dataset, output).with_context(|| format!("writing {}", output.display()))?;
    println!(
        "ARFF saved → {} ({} rows, {} attributes)",
        output.display(),
        dataset.rows.len(),
        dataset.attributes.len()
    );
    Ok(())
}

fn run_move_class(files: &[PathBuf], class_attr: &str, output: Option<&Path>) -> Result<()> {
    for file in pipeline::move_class_in_files(files, class_attr, output)? {
        if file.written {
            println!("{}  →  {}", file.src.display(), file.dst.display());
        } else {
            println!("{}  ✔ already last", file.src.display());
        }
    }
    Ok(())
}

fn run_train(config: &PipelineConfig, req: &TrainRequest, json: bool) -> Result<()> {
    let outcome = weka(config).train(req)?;
    if !req.summary_only {
        println!("{}", outcome.stdout.trim_end());
        return Ok(());
    }
    let evaluation = outcome.evaluation()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print!("{evaluation}");
        println!("Model saved → {}", outcome.model.display());
    }
    Ok(())
}

fn run_predict(config: &PipelineConfig, opts: &PredictOpts) -> Result<()> {
    let header = parser::load(&opts.header)
        .with_context(|| format!("reading header {}", opts.header.display()))?;
    let class_attr = opts.class_attr.as_deref().unwrap_or(config.class_attr.as_str());
    let table = pipeline::load_input(&opts.input)?;
    let test = pipeline::prediction_dataset(&table, &header, class_attr, opts.labelled)?;

    let mut file = tempfile::Builder::new()
        .prefix("brand-predict-")
        .suffix(".arff")
        .tempfile()
        .context("creating temporary ARFF")?;
    writer::write_arff(&test, &mut file)?;

    let req = PredictRequest::new(&opts.scheme, &opts.model, file.path());
    let predictions = weka(config).predict(&req)?;

    if opts.keep_temp {
        let (_, path) = file.keep().context("keeping the prediction input file")?;
        log::info!("Prediction input kept → {}", path.display());
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
    } else {
        let labels = test
            .class_attribute()
            .and_then(|a| a.nominal_values())
            .unwrap_or_default();
        for p in &predictions {
            print_prediction(p, labels);
        }
    }
    Ok(())
}

fn run_model_info(config: &PipelineConfig, model: &Path, header: &Path, scheme: &str) -> Result<()> {
    let template = parser::load(header).with_context(|| format!("reading header {}", header.display()))?;
    let mut file = tempfile::Builder::new()
        .prefix("brand-header-")
        .suffix(".arff")
        .tempfile()
        .context("creating temporary ARFF")?;
    writer::write_arff(&template.header_only(), &mut file)?;

    let req = ModelInfoRequest::new(scheme, model, file.path());
    let text = weka(config).model_info(&req)?;
    if text.trim().is_empty() {
        println!("No output from Weka");
    } else {
        println!("{}", text.trim_end());
    }
    Ok(())
}

fn run_pipeline(config: &PipelineConfig, json: bool) -> Result<()> {
    let report = pipeline::run_pipeline(config, &weka(config))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("ARFF saved  → {}", report.arff_path.display());
    println!("Model saved → {}", report.model_path.display());
    println!();
    print!("{}", report.evaluation);
    println!();
    println!("Brand = {}", report.prediction.predicted);
    let dist: Vec<String> = report
        .prediction
        .distribution
        .iter()
        .map(|p| p.to_string())
        .collect();
    println!("Probabilities = [{}]", dist.join(","));
    for cp in &report.probabilities {
        println!("  {:<16} {:.3}", cp.label, cp.probability);
    }
    Ok(())
}

fn print_prediction(p: &Prediction, labels: &[String]) {
    let confidence = p
        .confidence()
        .map(|c| format!(" ({c:.3})"))
        .unwrap_or_default();
    let actual = match &p.actual {
        Some(actual) if p.error => format!("  (actual {actual}, wrong)"),
        Some(actual) => format!("  (actual {actual})"),
        None => String::new(),
    };
    println!("#{} → {}{}{}", p.instance, p.predicted, confidence, actual);
    for (label, prob) in labels.iter().zip(&p.distribution) {
        println!("    {label:<16} {prob:.3}");
    }
}
