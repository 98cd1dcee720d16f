use std::path::PathBuf;

use anyhow::{Context, Result};
use car_market_dashboard::data::model::Column;

/// Brand, models, base price (PLN), base power (HP), base displacement (cm3).
const BRANDS: [(&str, [&str; 3], f64, f64, f64); 8] = [
    ("Volkswagen", ["Golf", "Passat", "Polo"], 60_000.0, 120.0, 1_600.0),
    ("Toyota", ["Corolla", "Yaris", "RAV4"], 70_000.0, 115.0, 1_500.0),
    ("Skoda", ["Octavia", "Fabia", "Superb"], 55_000.0, 110.0, 1_600.0),
    ("Opel", ["Astra", "Corsa", "Insignia"], 40_000.0, 105.0, 1_400.0),
    ("Ford", ["Focus", "Fiesta", "Mondeo"], 42_000.0, 110.0, 1_500.0),
    ("BMW", ["Seria 3", "Seria 5", "X3"], 110_000.0, 190.0, 2_000.0),
    ("Audi", ["A4", "A6", "Q5"], 105_000.0, 180.0, 2_000.0),
    ("Kia", ["Ceed", "Sportage", "Rio"], 65_000.0, 120.0, 1_600.0),
];

const FUELS: [&str; 5] = ["Gasoline", "Diesel", "Gasoline + LPG", "Hybrid", "Electric"];
const TRANSMISSIONS: [&str; 2] = ["Manual", "Automatic"];
const COLOURS: [&str; 9] = [
    "black", "silver", "white", "gray", "blue", "red", "green", "brown", "other",
];
const ORIGINS: [&str; 6] = ["Poland", "Germany", "France", "Belgium", "Netherlands", ""];

const ROWS: usize = 5_000;
const FIRST_YEAR: i32 = 2000;
const LAST_YEAR: i32 = 2024;

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

fn date(day: usize, month: usize, year: i32) -> String {
    format!("{:02}/{:02}/{year}", day + 1, month + 1)
}

/// Empty string for a dropped value, which the loader reads as null.
fn maybe(rng: &mut SimpleRng, value: String) -> String {
    if rng.chance(0.02) {
        String::new()
    } else {
        value
    }
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data").join("car_listings.csv"));
    if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    // Source exports carry a leading row index, which the loader ignores.
    let headers = std::iter::once("Index").chain(Column::SOURCE.iter().map(|c| c.name()));
    writer.write_record(headers)?;

    let mut rng = SimpleRng::new(42);
    for index in 0..ROWS {
        let (brand, models, base_price, base_power, base_cc) = *rng.pick(&BRANDS);
        let model = *rng.pick(&models);
        let is_new = rng.chance(0.1);

        let year = if is_new {
            LAST_YEAR - rng.below(2) as i32
        } else {
            FIRST_YEAR + rng.below((LAST_YEAR - FIRST_YEAR) as usize) as i32
        };
        let age = (LAST_YEAR - year) as f64;
        let mileage = if is_new {
            rng.below(50) as f64
        } else {
            (age * rng.gauss(15_000.0, 4_000.0)).max(1_000.0).round()
        };

        let fuel = *rng.pick(&FUELS);
        let power = rng.gauss(base_power, base_power * 0.2).max(50.0).round();
        let displacement = if fuel == "Electric" {
            0.0
        } else {
            rng.gauss(base_cc, 250.0).max(900.0).round()
        };
        let co2 = if fuel == "Electric" {
            0.0
        } else {
            rng.gauss(140.0, 25.0).max(80.0).round()
        };

        // Depreciation plus a small share of very expensive listings to be trimmed.
        let mut price = base_price * 0.9f64.powf(age) * rng.gauss(1.0, 0.15).max(0.3);
        if rng.chance(0.01) {
            price *= 8.0;
        }
        let price = (price / 100.0).round() * 100.0;

        let offer = date(rng.below(28), rng.below(12), 2021);
        // A few unparseable dates become nulls when loaded.
        let offer = if rng.chance(0.01) { "not a date".to_string() } else { offer };
        let registration = if is_new || rng.chance(0.2) {
            String::new()
        } else {
            date(rng.below(28), rng.below(12), year)
        };
        let doors = if rng.chance(0.8) { 5 } else { 3 };

        let record = [
            index.to_string(),
            format!("{price}"),
            if is_new { "New" } else { "Used" }.to_string(),
            brand.to_string(),
            model.to_string(),
            year.to_string(),
            maybe(&mut rng, format!("{mileage}")),
            maybe(&mut rng, format!("{power}")),
            maybe(&mut rng, format!("{displacement}")),
            fuel.to_string(),
            rng.pick(&TRANSMISSIONS).to_string(),
            rng.pick(&COLOURS).to_string(),
            rng.pick(&ORIGINS).to_string(),
            maybe(&mut rng, format!("{co2}")),
            doors.to_string(),
            offer,
            registration,
        ];
        writer.write_record(&record)?;
    }
    writer.flush()?;

    println!("Wrote {ROWS} listings to {}", output_path.display());
    Ok(())
}
