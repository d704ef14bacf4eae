use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

const BRANDS: [&str; 5] = ["Apple", "Samsung", "Xiaomi", "Oppo", "Vivo"];
const GENDERS: [&str; 2] = ["Female", "Male"];
const OCCUPATIONS: [&str; 4] = ["Student", "Employee", "Business owner", "Freelance"];
const PRIORITIES: [&str; 4] = ["Camera", "Battery", "Price", "Performance"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One survey respondent.
struct Respondent {
    age: i64,
    gender: &'static str,
    occupation: &'static str,
    income: Option<f64>,
    brand: &'static str,
    priority: &'static str,
    screen_size: f64,
}

/// Brand preference loosely follows income and priority, with noise,
/// so a decision tree has something to find.
fn respondent(rng: &mut SimpleRng) -> Respondent {
    let age = 16 + (rng.next_u64() % 50) as i64;
    let gender = rng.pick(&GENDERS);
    let occupation = rng.pick(&OCCUPATIONS);
    let income = (rng.next_f64() * 90_000.0 + 8_000.0).round();
    let priority = rng.pick(&PRIORITIES);

    let brand = if rng.next_f64() < 0.2 {
        rng.pick(&BRANDS)
    } else {
        match (priority, income > 50_000.0) {
            ("Camera", true) | ("Performance", true) => "Apple",
            ("Camera", false) => "Oppo",
            ("Battery", _) => "Samsung",
            ("Price", _) => "Xiaomi",
            _ => "Vivo",
        }
    };

    // Roughly one in twenty respondents skips the income question.
    let income = (rng.next_f64() >= 0.05).then_some(income);
    let screen_size = 5.5 + (rng.next_u64() % 13) as f64 * 0.1;

    Respondent {
        age,
        gender,
        occupation,
        income,
        brand,
        priority,
        screen_size,
    }
}

fn write_csv(path: &str, rows: &[Respondent]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    // Current_brand sits mid-table on purpose; the converter moves it last.
    writer.write_record([
        "Age",
        "Gender",
        "Occupation",
        "Current_brand",
        "Monthly_income",
        "Priority",
        "Screen_size",
    ])?;
    for r in rows {
        writer.write_record([
            r.age.to_string(),
            r.gender.to_string(),
            r.occupation.to_string(),
            r.brand.to_string(),
            r.income.map(|v| v.to_string()).unwrap_or_default(),
            r.priority.to_string(),
            format!("{:.1}", r.screen_size),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn build_batch(rows: &[Respondent]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Age", DataType::Int64, false),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("Occupation", DataType::Utf8, false),
        Field::new("Current_brand", DataType::Utf8, false),
        Field::new("Monthly_income", DataType::Float64, true),
        Field::new("Priority", DataType::Utf8, false),
        Field::new("Screen_size", DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.age))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.gender))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.occupation))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.brand))),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.income).collect::<Vec<_>>())),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.priority))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.screen_size))),
    ];

    RecordBatch::try_new(schema, columns).context("building record batch")
}

fn write_parquet(path: &str, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let n: usize = std::env::args()
        .nth(1)
        .map(|s| s.parse())
        .transpose()
        .context("row count must be a whole number")?
        .unwrap_or(300);

    let mut rng = SimpleRng::new(42);
    let rows: Vec<Respondent> = (0..n).map(|_| respondent(&mut rng)).collect();

    let csv_path = "sample_data.csv";
    let parquet_path = "sample_data.parquet";
    write_csv(csv_path, &rows)?;
    let batch = build_batch(&rows)?;
    write_parquet(parquet_path, &batch)?;

    log::info!(
        "Preview:\n{}",
        pretty_format_batches(&[batch.slice(0, batch.num_rows().min(5))])?
    );
    println!("Wrote {n} respondents to {csv_path} and {parquet_path}");
    Ok(())
}
