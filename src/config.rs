use crate::i18n::Language;
use log::warn;
use std::str::FromStr;

// Constants
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_EXPRESSION: &str = "sin(x)";
pub const DEFAULT_XMIN: f64 = -10.0;
pub const DEFAULT_XMAX: f64 = 10.0;
pub const DEFAULT_SAMPLES: usize = 400;
pub const MAX_SAMPLES: usize = 100_000;
pub const EXPORT_WIDTH: u32 = 800;
pub const EXPORT_HEIGHT: u32 = 600;

/// Values substituted when a plot field is blank or unusable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotDefaults {
    pub xmin: f64,
    pub xmax: f64,
    pub samples: usize,
    /// Upper bound applied to any requested sample count
    pub max_samples: usize,
}

impl Default for PlotDefaults {
    fn default() -> Self {
        Self {
            xmin: DEFAULT_XMIN,
            xmax: DEFAULT_XMAX,
            samples: DEFAULT_SAMPLES,
            max_samples: MAX_SAMPLES,
        }
    }
}

/// Client configuration
///
/// Built from `FUNCPLOT_*` environment variables, each falling back to the
/// constants above when unset or invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the plot server
    pub server_url: String,

    /// Language selected at startup
    pub language: Language,

    /// Expression placed in the field at startup
    pub initial_expression: String,

    pub defaults: PlotDefaults,

    /// Size of the image sent with a saved plot
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            language: Language::default(),
            initial_expression: DEFAULT_EXPRESSION.to_string(),
            defaults: PlotDefaults::default(),
            export_width: EXPORT_WIDTH,
            export_height: EXPORT_HEIGHT,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Arguments
    /// * `lookup` - Source of variable values (the environment, a map in tests)
    ///
    /// # Returns
    /// * `Config` - Configuration with invalid entries replaced by defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("FUNCPLOT_SERVER_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.server_url = url.to_string();
            }
        }
        if let Some(language) = parsed::<Language>(&lookup, "FUNCPLOT_LANG") {
            config.language = language;
        }
        if let Some(samples) = parsed::<usize>(&lookup, "FUNCPLOT_SAMPLES") {
            if samples > 0 {
                config.defaults.samples = samples.min(config.defaults.max_samples);
            } else {
                warn!("FUNCPLOT_SAMPLES must be positive, keeping {}", config.defaults.samples);
            }
        }
        if let Some(width) = parsed::<u32>(&lookup, "FUNCPLOT_EXPORT_WIDTH").filter(|w| *w > 0) {
            config.export_width = width;
        }
        if let Some(height) = parsed::<u32>(&lookup, "FUNCPLOT_EXPORT_HEIGHT").filter(|h| *h > 0) {
            config.export_height = height;
        }

        config
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring invalid {}='{}'", name, raw);
            None
        }
    }
}
