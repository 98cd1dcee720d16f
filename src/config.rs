use std::path::PathBuf;

use crate::data::clean::CleanOptions;

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

pub const DATA_PATH_ENV: &str = "CAR_DASHBOARD_DATA";
pub const REFERENCE_YEAR_ENV: &str = "CAR_DASHBOARD_REFERENCE_YEAR";

/// Settings resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Listings file read at startup.
    pub data_path: PathBuf,
    /// `Car_Age = reference_year - Production_year`.
    pub reference_year: i32,
    /// Rows above this quantile in any numeric column are dropped.
    pub outlier_quantile: f64,
    /// Default `n` for the top-N brand and colour helpers.
    pub top_n: usize,
    /// Granularity of the price range sliders.
    pub price_slider_step: f64,
    /// `--debug` on the command line.
    pub debug: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data").join("car_listings.csv"),
            reference_year: 2025,
            outlier_quantile: 0.95,
            top_n: 10,
            price_slider_step: 1000.0,
            debug: false,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then environment, then command-line arguments (program name excluded).
    pub fn from_env_and_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_args(args);
        config
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            quantile: self.outlier_quantile,
            reference_year: self.reference_year,
        }
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATA_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.data_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(REFERENCE_YEAR_ENV) {
            match raw.trim().parse::<i32>() {
                Ok(year) => self.reference_year = year,
                Err(_) => log::warn!(
                    "Ignoring {REFERENCE_YEAR_ENV}={raw:?}; keeping {}",
                    self.reference_year
                ),
            }
        }
    }

    fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator<Item = String>,
    {
        for arg in args {
            match arg.as_str() {
                "--debug" => self.debug = true,
                flag if flag.starts_with("--") => log::warn!("Ignoring unknown flag {flag}"),
                path => self.data_path = PathBuf::from(path),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.reference_year, 2025);
        assert_eq!(config.outlier_quantile, 0.95);
        assert_eq!(config.top_n, 10);
        assert!(config.data_path.ends_with("car_listings.csv"));
    }

    #[test]
    fn test_env_overrides_and_bad_year_fallback() {
        let mut config = DashboardConfig::default();
        config.apply_env(|key| match key {
            DATA_PATH_ENV => Some("/tmp/cars.csv".to_string()),
            REFERENCE_YEAR_ENV => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.data_path, PathBuf::from("/tmp/cars.csv"));
        assert_eq!(config.reference_year, 2025);

        config.apply_env(|key| (key == REFERENCE_YEAR_ENV).then(|| "2030".to_string()));
        assert_eq!(config.reference_year, 2030);
    }

    #[test]
    fn test_args_override_path_and_debug() {
        let mut config = DashboardConfig::default();
        config.apply_args(["--debug".to_string(), "other.parquet".to_string()]);
        assert!(config.debug);
        assert_eq!(config.data_path, PathBuf::from("other.parquet"));
    }
}
