//! Synthetic messy price-history generation.
//!
//! Produces the kind of CSV people actually download: mixed date layouts, currency
//! symbols, thousands separators, `K`/`M` volumes, blanks, repeated dates and the odd
//! unreadable date. Prices follow a log-normal random walk with occasional jumps so
//! the outlier flags have something to find.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;

const DATE_FORMATS: [&str; 4] = ["%m/%d/%Y", "%Y-%m-%d", "%b %d, %Y", "%d-%b-%Y"];

pub const SAMPLE_HEADER: [&str; 7] = ["Date", "Price", "Open", "High", "Low", "Vol.", "Change %"];

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    /// Distinct trading days to generate (before duplicates are added).
    pub rows: usize,
    pub seed: u64,
    pub start: NaiveDate,
    pub start_price: f64,
    /// Daily log-return standard deviation.
    pub daily_vol: f64,
    pub jump_prob: f64,
    /// Jump size in units of `daily_vol`.
    pub jump_k: f64,
    pub blank_prob: f64,
    pub duplicate_prob: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rows: 250,
            seed: 0,
            start: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default(),
            start_price: 150.0,
            daily_vol: 0.015,
            jump_prob: 0.02,
            jump_k: 12.0,
            blank_prob: 0.03,
            duplicate_prob: 0.02,
        }
    }
}

/// What went into a generated file, for reporting and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSummary {
    pub rows_written: usize,
    pub duplicates: usize,
    pub jumps: usize,
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub csv: String,
    pub summary: SampleSummary,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.rows == 0 {
        return Err(AppError::new(2, "Sample row count must be > 0."));
    }
    if !(config.start_price.is_finite() && config.start_price > 0.0) {
        return Err(AppError::new(2, "Sample start price must be positive."));
    }
    for (name, p) in [
        ("jump", config.jump_prob),
        ("blank", config.blank_prob),
        ("duplicate", config.duplicate_prob),
    ] {
        if !(0.0..1.0).contains(&p) {
            return Err(AppError::new(2, format!("Invalid {name} probability {p}; expected [0, 1).")));
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.daily_vol.max(0.0))
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut wtr = csv::Writer::from_writer(Vec::new());
    write_row(&mut wtr, SAMPLE_HEADER.iter().map(|s| s.to_string()).collect())?;

    let bad_date_index = (config.rows > 2).then_some(config.rows / 2);
    let mut summary = SampleSummary {
        rows_written: 0,
        duplicates: 0,
        jumps: 0,
    };

    let mut date = next_trading_day(config.start);
    let mut prev_close = config.start_price;

    for i in 0..config.rows {
        let open = prev_close * (1.0 + normal.sample(&mut rng) * 0.25);
        let mut ret = normal.sample(&mut rng);
        let roll: f64 = rng.r#gen();
        if roll < config.jump_prob {
            // Spike, half up and half down.
            let sign = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
            ret += sign * config.jump_k * config.daily_vol;
            summary.jumps += 1;
        }
        let close = prev_close * ret.exp();
        let high = open.max(close) * (1.0 + normal.sample(&mut rng).abs() * 0.5);
        let low = open.min(close) * (1.0 - normal.sample(&mut rng).abs() * 0.5);
        let volume = (2_000_000.0 * (1.0 + normal.sample(&mut rng) * 10.0).abs()).round();
        let change_pct = (close / prev_close - 1.0) * 100.0;

        let date_text = if Some(i) == bad_date_index {
            "not-a-date".to_string()
        } else {
            date.format(DATE_FORMATS[rng.gen_range(0..DATE_FORMATS.len())]).to_string()
        };

        let mut cells = vec![
            date_text.clone(),
            fmt_price(&mut rng, close),
            fmt_price(&mut rng, open),
            fmt_price(&mut rng, high),
            fmt_price(&mut rng, low),
            fmt_volume(&mut rng, volume),
            format!("{change_pct:.2}%"),
        ];
        for cell in cells.iter_mut().skip(2).take(4) {
            if rng.r#gen::<f64>() < config.blank_prob {
                cell.clear();
            }
        }

        let duplicate = Some(i) != bad_date_index && rng.r#gen::<f64>() < config.duplicate_prob;
        if duplicate {
            // A stale first copy; the corrected row follows and should win.
            let mut stale = cells.clone();
            stale[1] = fmt_price(&mut rng, close * 0.97);
            write_row(&mut wtr, stale)?;
            summary.duplicates += 1;
            summary.rows_written += 1;
        }
        write_row(&mut wtr, cells)?;
        summary.rows_written += 1;

        prev_close = close;
        date = next_trading_day(date + Days::new(1));
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::new(4, format!("Failed to finish sample CSV: {e}")))?;
    let csv = String::from_utf8(bytes).map_err(|e| AppError::new(4, format!("Sample CSV is not UTF-8: {e}")))?;
    Ok(SampleData { csv, summary })
}

fn write_row(wtr: &mut csv::Writer<Vec<u8>>, cells: Vec<String>) -> Result<(), AppError> {
    wtr.write_record(&cells)
        .map_err(|e| AppError::new(4, format!("Failed to write sample row: {e}")))
}

fn next_trading_day(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date = date + Days::new(1);
    }
    date
}

fn fmt_price(rng: &mut StdRng, v: f64) -> String {
    match rng.gen_range(0..3) {
        0 => format!("{v:.2}"),
        1 => format!("${}", with_thousands(v, 2)),
        _ => with_thousands(v, 4),
    }
}

fn fmt_volume(rng: &mut StdRng, v: f64) -> String {
    match rng.gen_range(0..3) {
        0 if v >= 1e6 => format!("{:.2}M", v / 1e6),
        0 | 1 => format!("{:.1}K", v / 1e3),
        _ => with_thousands(v, 0),
    }
}

fn with_thousands(v: f64, decimals: usize) -> String {
    let text = format!("{v:.decimals$}");
    let (int, frac) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let (sign, digits) = match int.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", int),
    };

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
