//! Study configuration: the constants contract and a validated builder.
//!
//! The constants are shared with the rest of the firmware and must keep their
//! values across reimplementations. `StudyConfig` bundles the tunable subset
//! for one study session.
//!
//! ## Example
//!
//! ```
//! use flashcard_core::{StudyConfig, DEEP_SLEEP_TIMEOUT_MS};
//!
//! let config = StudyConfig::builder()
//!     .namespace("flashcards")
//!     .build()
//!     .expect("valid configuration");
//! assert_eq!(config.deep_sleep_timeout_ms, DEEP_SLEEP_TIMEOUT_MS);
//! ```

use crate::store::Namespace;

/// Idle time before the watch enters deep sleep, in milliseconds.
pub const DEEP_SLEEP_TIMEOUT_MS: u32 = 15_000;

/// Completed reviews between two full (flashing) e-paper refreshes.
pub const FULL_REFRESH_THRESHOLD: u8 = 10;

/// Width of the text box card text is wrapped into, in pixels.
pub const MAX_TEXT_WIDTH: u16 = 180;

/// Maximum length of a key-value namespace name, in bytes.
pub const NVS_NAMESPACE_SIZE: usize = 32;

/// Maximum number of cards in one deck.
pub const MAX_CARD_COUNT: usize = 255;

/// Width of one persisted card record: 1 byte box + 4 bytes `due_at`.
pub const RECORD_WIDTH: usize = 5;

/// Review delay per Leitner box, in days. Indexed by `LeitnerBox`.
pub const BOX_DELAYS: [u32; 3] = [0, 1, 3];

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "flashcards";

/// Errors that can occur when building a [`StudyConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// Namespace name is empty or longer than [`NVS_NAMESPACE_SIZE`]
    InvalidNamespace {
        /// Length of the rejected name in bytes
        len: usize,
    },
    /// A full refresh threshold of zero would never trigger
    ZeroRefreshThreshold,
    /// Text width is zero or wider than the panel
    InvalidTextWidth {
        /// Requested width in pixels
        width: u16,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BuilderError::InvalidNamespace { len } => write!(
                f,
                "Invalid namespace length {len} (must be 1..={NVS_NAMESPACE_SIZE} bytes)"
            ),
            BuilderError::ZeroRefreshThreshold => {
                write!(f, "Full refresh threshold must be at least 1")
            }
            BuilderError::InvalidTextWidth { width } => write!(
                f,
                "Invalid text width {width} (max {})",
                crate::DISPLAY_WIDTH
            ),
        }
    }
}

impl core::error::Error for BuilderError {}

/// Study session configuration
///
/// Use [`StudyConfig::builder`] to create one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudyConfig {
    /// Key-value namespace holding the card records
    pub namespace: Namespace,
    /// Idle time before deep sleep, in milliseconds
    pub deep_sleep_timeout_ms: u32,
    /// Completed reviews between two full refreshes
    pub full_refresh_threshold: u8,
    /// Card text box width in pixels
    pub max_text_width: u16,
}

impl StudyConfig {
    /// Start building a configuration from the documented defaults
    pub fn builder() -> StudyConfigBuilder {
        StudyConfigBuilder::default()
    }
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            namespace: Namespace::default(),
            deep_sleep_timeout_ms: DEEP_SLEEP_TIMEOUT_MS,
            full_refresh_threshold: FULL_REFRESH_THRESHOLD,
            max_text_width: MAX_TEXT_WIDTH,
        }
    }
}

/// Builder for [`StudyConfig`]
pub struct StudyConfigBuilder {
    namespace: Option<alloc::string::String>,
    deep_sleep_timeout_ms: u32,
    full_refresh_threshold: u8,
    max_text_width: u16,
}

impl Default for StudyConfigBuilder {
    fn default() -> Self {
        Self {
            namespace: None,
            deep_sleep_timeout_ms: DEEP_SLEEP_TIMEOUT_MS,
            full_refresh_threshold: FULL_REFRESH_THRESHOLD,
            max_text_width: MAX_TEXT_WIDTH,
        }
    }
}

impl StudyConfigBuilder {
    /// Set the key-value namespace name
    pub fn namespace(mut self, name: &str) -> Self {
        self.namespace = Some(alloc::string::String::from(name));
        self
    }

    /// Set the idle timeout before deep sleep
    pub fn deep_sleep_timeout_ms(mut self, value: u32) -> Self {
        self.deep_sleep_timeout_ms = value;
        self
    }

    /// Set how many reviews pass between full refreshes
    pub fn full_refresh_threshold(mut self, value: u8) -> Self {
        self.full_refresh_threshold = value;
        self
    }

    /// Set the card text box width
    pub fn max_text_width(mut self, value: u16) -> Self {
        self.max_text_width = value;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns a [`BuilderError`] if the namespace, refresh threshold or
    /// text width is out of range.
    pub fn build(self) -> Result<StudyConfig, BuilderError> {
        let namespace = match self.namespace {
            Some(name) => Namespace::new(&name)
                .ok_or(BuilderError::InvalidNamespace { len: name.len() })?,
            None => Namespace::default(),
        };
        if self.full_refresh_threshold == 0 {
            return Err(BuilderError::ZeroRefreshThreshold);
        }
        if self.max_text_width == 0 || u32::from(self.max_text_width) > crate::DISPLAY_WIDTH {
            return Err(BuilderError::InvalidTextWidth {
                width: self.max_text_width,
            });
        }
        Ok(StudyConfig {
            namespace,
            deep_sleep_timeout_ms: self.deep_sleep_timeout_ms,
            full_refresh_threshold: self.full_refresh_threshold,
            max_text_width: self.max_text_width,
        })
    }
}
