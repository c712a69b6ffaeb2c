//! Engine configuration
//!
//! TOML-loadable narration settings: which voice narrates each field and at
//! what rate. Original text defaults to a Hindi voice with fallbacks,
//! explanations to Indian English.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::speech::VoiceSelector;

/// Speech rate bounds accepted by the engine
pub const MIN_RATE: f32 = 0.1;
pub const MAX_RATE: f32 = 1.0;

fn default_rate() -> f32 {
    0.4
}

fn default_original_voice() -> VoiceSelector {
    VoiceSelector::new("hi-IN").with_fallbacks(["hi", "en-US"])
}

fn default_explanation_voice() -> VoiceSelector {
    VoiceSelector::new("en-IN").with_fallbacks(["en-US"])
}

/// Playback engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Voice used for the source-language verse text
    pub original_voice: VoiceSelector,
    /// Voice used for the secondary-language explanation
    pub explanation_voice: VoiceSelector,
    /// Speech rate applied to every narration request
    pub rate: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            original_voice: default_original_voice(),
            explanation_voice: default_explanation_voice(),
            rate: default_rate(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig =
            toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Clamp the rate into the accepted range
    pub fn normalized(mut self) -> Self {
        self.rate = self.rate.clamp(MIN_RATE, MAX_RATE);
        self
    }

    /// Voice selector for a narration field
    pub fn voice_for(&self, field: katha_common::Field) -> &VoiceSelector {
        match field {
            katha_common::Field::Original => &self.original_voice,
            katha_common::Field::Explanation => &self.explanation_voice,
        }
    }
}
