use alloc::string::{String, ToString};
use core::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use crate::prelude::*;

/// Selects devices by layout or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceMatcher {
    /// `<Keyboard>`, any device created from the layout with this name.
    Layout(String),
    /// `Keyboard1`, the device with this exact name.
    Name(String),
}

impl DeviceMatcher {
    /// Parses the leading device segment and returns the rest of the path.
    ///
    /// The leading `/` is optional. The returned remainder has no leading `/`.
    pub fn parse_prefix(path: &str) -> Result<(Self, &str), PathError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        if let Some(layout) = trimmed.strip_prefix('<') {
            let (name, rest) = layout
                .split_once('>')
                .ok_or_else(|| PathError::UnterminatedLayout(path.to_string()))?;
            if name.is_empty() {
                return Err(PathError::Empty);
            }
            let rest = rest.strip_prefix('/').unwrap_or(rest);
            return Ok((Self::Layout(name.to_string()), rest));
        }

        let (name, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));
        Ok((Self::Name(name.to_string()), rest))
    }

    /// Returns `true` if the device satisfies this matcher.
    ///
    /// Comparison ignores ASCII case.
    #[must_use]
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            Self::Layout(layout) => device.layout().name().eq_ignore_ascii_case(layout),
            Self::Name(name) => device.name().eq_ignore_ascii_case(name),
        }
    }
}

impl FromStr for DeviceMatcher {
    type Err = PathError;

    /// Parses a path that only names a device, like `<Gamepad>` or `/Gamepad1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (matcher, _) = Self::parse_prefix(s)?;
        Ok(matcher)
    }
}

impl Display for DeviceMatcher {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DeviceMatcher::Layout(layout) => write!(f, "<{layout}>"),
            DeviceMatcher::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Absolute path to a control, like `/<Keyboard>/space` or `/Gamepad1/leftStick/x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlPath {
    pub device: DeviceMatcher,
    /// `/`-separated path inside the device.
    pub control: String,
}

impl ControlPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let (device, control) = DeviceMatcher::parse_prefix(path)?;
        let control = control.trim_end_matches('/');
        if control.is_empty() {
            return Err(PathError::MissingControl(path.to_string()));
        }

        Ok(Self {
            device,
            control: control.to_string(),
        })
    }

    /// Returns the layout name if the path selects devices by layout.
    #[must_use]
    pub fn layout(&self) -> Option<&str> {
        match &self.device {
            DeviceMatcher::Layout(layout) => Some(layout),
            DeviceMatcher::Name(_) => None,
        }
    }
}

impl FromStr for ControlPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ControlPath {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "/{}/{}", self.device, self.control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let path = ControlPath::parse("/<Keyboard>/a").unwrap();
        assert_eq!(path.device, DeviceMatcher::Layout("Keyboard".into()));
        assert_eq!(path.control, "a");
        assert_eq!(path.layout(), Some("Keyboard"));
        assert_eq!(path.to_string(), "/<Keyboard>/a");

        let path = ControlPath::parse("<Gamepad>/leftStick/x").unwrap();
        assert_eq!(path.device, DeviceMatcher::Layout("Gamepad".into()));
        assert_eq!(path.control, "leftStick/x");
    }

    #[test]
    fn name_paths() {
        let path = ControlPath::parse("/Keyboard1/space").unwrap();
        assert_eq!(path.device, DeviceMatcher::Name("Keyboard1".into()));
        assert_eq!(path.control, "space");
        assert_eq!(path.layout(), None);
    }

    #[test]
    fn device_only() {
        assert_eq!(
            "<Gamepad>".parse::<DeviceMatcher>(),
            Ok(DeviceMatcher::Layout("Gamepad".into()))
        );
        assert_eq!(
            "/Gamepad1".parse::<DeviceMatcher>(),
            Ok(DeviceMatcher::Name("Gamepad1".into()))
        );
    }

    #[test]
    fn invalid() {
        assert_eq!(ControlPath::parse(""), Err(PathError::Empty));
        assert_eq!(ControlPath::parse("/"), Err(PathError::Empty));
        assert_eq!(
            ControlPath::parse("/<Keyboard/a"),
            Err(PathError::UnterminatedLayout("/<Keyboard/a".into()))
        );
        assert_eq!(
            ControlPath::parse("/<Keyboard>"),
            Err(PathError::MissingControl("/<Keyboard>".into()))
        );
        assert_eq!(
            ControlPath::parse("Keyboard1/"),
            Err(PathError::MissingControl("Keyboard1/".into()))
        );
    }
}
