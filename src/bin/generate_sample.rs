//! Writes a deterministic sample payment-verification CSV that `sla-dash`
//! can open directly. Useful for demos and manual testing.
//!
//! Usage: `generate_sample [output.csv]` (defaults to `sample_sla.csv`).

use std::path::Path;

use anyhow::Result;
use sla_dash::sample;

const ROWS: usize = 400;
const SEED: u64 = 42;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_sla.csv".to_string());

    sample::write_file(Path::new(&path), ROWS, SEED)?;

    println!("Wrote {ROWS} sample records to {path}");
    Ok(())
}
