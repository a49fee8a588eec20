//! Global configuration.
//!
//! [`InputSettings`] is a resource read by [`InputStatePlugin`] at the start of every
//! update. Changes are pushed into [`InputDevices`] instead of being read from a global,
//! so the registry can also be used and tested without an [`App`].

use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Default value for [`InputSettings::default_press_point`].
pub const DEFAULT_PRESS_POINT: f32 = 0.5;

/// Process-wide input configuration.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
pub struct InputSettings {
    /// Threshold used by buttons whose own press point is not positive.
    ///
    /// See [`ButtonView::press_point`].
    ///
    /// By default set to [`DEFAULT_PRESS_POINT`].
    pub default_press_point: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            default_press_point: DEFAULT_PRESS_POINT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "serialize")]
    #[test]
    fn settings_serde() {
        let settings = InputSettings {
            default_press_point: 0.25,
        };
        let serialized = ron::to_string(&settings).unwrap();
        assert_eq!(serialized, "(default_press_point:0.25)");
        let parsed: InputSettings = ron::from_str(&serialized).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn default_press_point() {
        assert_eq!(
            InputSettings::default().default_press_point,
            DEFAULT_PRESS_POINT
        );
    }
}
