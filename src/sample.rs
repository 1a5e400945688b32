use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Days, Duration, NaiveDate};

// ---------------------------------------------------------------------------
// Deterministic sample-data generation
// ---------------------------------------------------------------------------

const VENDORS: [&str; 5] = [
    "PT Nusantara Teknik",
    "CV Karya Mandiri",
    "PT Sinar Logistik",
    "PT Medan Jaya",
    "CV Berkah Abadi",
];

const UNITS: [&str; 4] = [
    "Unit Operasi",
    "Unit Pemeliharaan",
    "Unit Niaga",
    "Unit Keuangan",
];

/// Write `rows` sample payment-verification records as CSV. Deterministic
/// for a given seed, so demos and tests see identical data.
pub fn write_records<W: Write>(writer: W, rows: usize, seed: u64) -> Result<()> {
    let mut rng = SimpleRng::new(seed);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Tanggal Pembayaran", "Tanggal Verifikasi", "Vendor", "Unit"])
        .context("writing sample header")?;

    let origin = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    for _ in 0..rows {
        let payment = origin + Days::new(rng.below(180));
        // Mostly positive SLAs, with an occasional inverted entry so the
        // dashboard's negative-SLA handling is exercised.
        let sla = (rng.gauss(5.0, 3.0).round() as i64).max(-3);
        let verification = payment + Duration::days(sla);

        wtr.write_record([
            payment.format("%Y-%m-%d").to_string(),
            verification.format("%Y-%m-%d").to_string(),
            VENDORS[rng.below(VENDORS.len() as u64) as usize].to_string(),
            UNITS[rng.below(UNITS.len() as u64) as usize].to_string(),
        ])
        .context("writing sample row")?;
    }
    wtr.flush().context("flushing sample output")?;
    Ok(())
}

/// [`write_records`] into a file at `path`.
pub fn write_file(path: &Path, rows: usize, seed: u64) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_records(file, rows, seed)
}

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

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + std_dev * z
    }
}
