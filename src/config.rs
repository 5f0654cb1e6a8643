//! Configuration types for the chat client.
//!
//! Settings come from three layers: built-in defaults, an optional YAML file,
//! and command-line arguments parsed with `arrrg`.  Later layers win.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::catalog::Locale;
use crate::error::{Error, Result};

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u32 = 60;

/// Command-line arguments for the chatgate tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat backend.
    #[arrrg(optional, "Backend base URL (default: $CHATGATE_BASE_URL or http://127.0.0.1:8000/)", "URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u32>,

    /// Where the bearer token is kept between runs.
    #[arrrg(optional, "File that keeps the sign-in token between runs", "PATH")]
    pub state_file: Option<String>,

    /// Language of user-facing text.
    #[arrrg(optional, "Language for messages: en or ru (default: en)", "LOCALE")]
    pub locale: Option<String>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log at debug level.
    #[arrrg(flag, "Enable debug logging")]
    pub verbose: bool,
}

/// Settings accepted in a YAML configuration file.  Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Backend base URL.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Token state file.
    pub state_file: Option<PathBuf>,
    /// Message language.
    pub locale: Option<Locale>,
    /// Whether to use ANSI colors.
    pub color: Option<bool>,
}

impl ConfigFile {
    /// Reads a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("cannot read {}", path.display()), e))?;
        Self::parse(&text)
    }

    /// Parses configuration from YAML text.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Resolved configuration for a chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL.  `None` defers to the environment and then the default.
    pub base_url: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// File that keeps the token.  `None` keeps it in memory only.
    pub state_file: Option<PathBuf>,

    /// Message language.
    pub locale: Locale,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log at debug level.
    pub verbose: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: from the environment, then localhost
    /// - Timeout: 60 seconds
    /// - Token storage: in memory
    /// - Locale: English
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS.into()),
            state_file: None,
            locale: Locale::En,
            use_color: true,
            verbose: false,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Keeps the token in `path` between runs.
    pub fn with_state_file(mut self, path: Option<PathBuf>) -> Self {
        self.state_file = path;
        self
    }

    /// Sets the message language.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Overlays the values present in a configuration file.
    pub fn with_file(mut self, file: ConfigFile) -> Self {
        if let Some(base_url) = file.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = file.state_file {
            self.state_file = Some(path);
        }
        if let Some(locale) = file.locale {
            self.locale = locale;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        self
    }

    /// Overlays command-line arguments, loading `--config` first if it was given.
    pub fn with_args(mut self, args: ChatArgs) -> Result<Self> {
        if let Some(path) = &args.config {
            self = self.with_file(ConfigFile::load(path)?);
        }
        if let Some(base_url) = args.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(secs) = args.timeout {
            if secs == 0 {
                return Err(Error::state("--timeout must be at least one second"));
            }
            self.timeout = Duration::from_secs(secs.into());
        }
        if let Some(path) = args.state_file {
            self.state_file = Some(PathBuf::from(path));
        }
        if let Some(locale) = args.locale {
            self.locale = locale.parse::<Locale>().map_err(Error::state)?;
        }
        if args.no_color {
            self.use_color = false;
        }
        self.verbose = args.verbose;
        Ok(self)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        ChatConfig::new().with_args(args)
    }
}
