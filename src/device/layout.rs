use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::ops::Range;

use log::trace;
use smallvec::SmallVec;

use crate::prelude::*;

/// Immutable control tree of a device type.
///
/// Controls are stored in a flat arena in declaration order, parents always come before
/// their children. Shared between all devices created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceLayout {
    name: String,
    format: FourCc,
    state_size: u32,
    controls: Vec<ControlLayout>,
}

impl DeviceLayout {
    /// Starts a layout whose state events must use the given format.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bevy_input_state::prelude::*;
    /// let layout = DeviceLayout::builder("Pedal", "PDAL".parse().unwrap())
    ///     .button("press", StateBlock::bit(0, 0))
    ///     .axis("angle", StateBlock::float(4))
    ///     .vector2("tilt", 8)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(layout.state_size(), 16);
    /// assert!(layout.find("tilt/y").is_some());
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>, format: FourCc) -> DeviceLayoutBuilder {
        DeviceLayoutBuilder {
            name: name.into(),
            format,
            state_size: None,
            controls: Vec::new(),
            last_group: 0..0,
            error: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format code expected in state events for this layout.
    #[must_use]
    pub fn format(&self) -> FourCc {
        self.format
    }

    /// Size of the device state in bytes.
    #[must_use]
    pub fn state_size(&self) -> u32 {
        self.state_size
    }

    #[must_use]
    pub fn controls(&self) -> &[ControlLayout] {
        &self.controls
    }

    /// Returns a control by index.
    ///
    /// # Panics
    ///
    /// Panics if the index doesn't belong to this layout.
    #[must_use]
    pub fn control(&self, index: ControlIndex) -> &ControlLayout {
        &self.controls[index.index()]
    }

    #[must_use]
    pub fn get(&self, index: ControlIndex) -> Option<&ControlLayout> {
        self.controls.get(index.index())
    }

    /// Iterates over all controls together with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (ControlIndex, &ControlLayout)> {
        self.controls
            .iter()
            .enumerate()
            .map(|(index, control)| (ControlIndex(index as u32), control))
    }

    /// Iterates over controls without a parent.
    pub fn roots(&self) -> impl Iterator<Item = ControlIndex> + '_ {
        self.iter()
            .filter(|(_, control)| control.parent.is_none())
            .map(|(index, _)| index)
    }

    /// Looks up a control by a `/`-separated path from the root.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<ControlIndex> {
        self.find_from(None, path)
    }

    /// Looks up a control by a `/`-separated path relative to `start`.
    ///
    /// Names are compared ignoring ASCII case. Empty segments are skipped.
    #[must_use]
    pub fn find_from(&self, start: Option<ControlIndex>, path: &str) -> Option<ControlIndex> {
        let mut current = start;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            current = Some(self.find_child(current, segment)?);
        }
        current
    }

    fn find_child(&self, parent: Option<ControlIndex>, name: &str) -> Option<ControlIndex> {
        match parent {
            Some(parent) => self
                .control(parent)
                .children
                .iter()
                .copied()
                .find(|&child| self.control(child).name.eq_ignore_ascii_case(name)),
            None => self
                .roots()
                .find(|&root| self.control(root).name.eq_ignore_ascii_case(name)),
        }
    }

    /// Returns the `/`-separated path of a control inside the layout.
    #[must_use]
    pub fn path_of(&self, index: ControlIndex) -> String {
        path_in(&self.controls, index)
    }
}

/// Builder for [`DeviceLayout`].
///
/// Errors are collected and reported from [`Self::build`].
#[derive(Debug)]
pub struct DeviceLayoutBuilder {
    name: String,
    format: FourCc,
    state_size: Option<u32>,
    controls: Vec<ControlLayout>,
    /// Controls created by the last call, used by [`Self::flags`].
    last_group: Range<usize>,
    error: Option<LayoutError>,
}

impl DeviceLayoutBuilder {
    /// Adds a top-level control.
    ///
    /// Composite kinds automatically get `x`, `y`, `z` and `w` axis children,
    /// each backed by a 32-bit float inside the parent block.
    #[must_use]
    pub fn control(self, name: impl Into<String>, kind: ControlKind, block: StateBlock) -> Self {
        self.push(None, name.into(), kind, block)
    }

    /// Adds a control under an existing one, addressed by its path.
    #[must_use]
    pub fn child(
        mut self,
        parent: &str,
        name: impl Into<String>,
        kind: ControlKind,
        block: StateBlock,
    ) -> Self {
        let Some(parent_index) = find_in(&self.controls, parent) else {
            self.error.get_or_insert(LayoutError::UnknownParent(parent.to_string()));
            return self;
        };
        self.push(Some(parent_index), name.into(), kind, block)
    }

    /// Adds a button that uses the default press point.
    #[must_use]
    pub fn button(self, name: impl Into<String>, block: StateBlock) -> Self {
        self.control(name, ControlKind::button(), block)
    }

    #[must_use]
    pub fn axis(self, name: impl Into<String>, block: StateBlock) -> Self {
        self.control(name, ControlKind::Axis, block)
    }

    #[must_use]
    pub fn integer(self, name: impl Into<String>, block: StateBlock) -> Self {
        self.control(name, ControlKind::Integer, block)
    }

    #[must_use]
    pub fn vector2(self, name: impl Into<String>, byte_offset: u32) -> Self {
        self.control(name, ControlKind::Vector2, StateBlock::vector2(byte_offset))
    }

    #[must_use]
    pub fn vector3(self, name: impl Into<String>, byte_offset: u32) -> Self {
        self.control(name, ControlKind::Vector3, StateBlock::vector3(byte_offset))
    }

    #[must_use]
    pub fn quaternion(self, name: impl Into<String>, byte_offset: u32) -> Self {
        self.control(
            name,
            ControlKind::Quaternion,
            StateBlock::quaternion(byte_offset),
        )
    }

    /// Adds flags to the last added control and its generated children.
    #[must_use]
    pub fn flags(mut self, flags: ControlFlags) -> Self {
        for control in &mut self.controls[self.last_group.clone()] {
            control.flags |= flags;
        }
        self
    }

    /// Overrides the state size, which is otherwise derived from the furthest block.
    #[must_use]
    pub fn state_size(mut self, bytes: u32) -> Self {
        self.state_size = Some(bytes);
        self
    }

    /// Validates all controls and produces the layout.
    pub fn build(self) -> Result<DeviceLayout, LayoutError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.controls.is_empty() {
            return Err(LayoutError::Empty(self.name));
        }

        let state_size = self.state_size.unwrap_or_else(|| {
            self.controls
                .iter()
                .map(|control| control.block.bit_range().end.div_ceil(8) as u32)
                .max()
                .unwrap_or_default()
        });

        for (index, control) in self.controls.iter().enumerate() {
            validate(&self.controls, index, state_size)?;
            trace!(
                "`{}` has `{}` at {:?}",
                self.name,
                path_in(&self.controls, ControlIndex(index as u32)),
                control.block
            );
        }

        Ok(DeviceLayout {
            name: self.name,
            format: self.format,
            state_size,
            controls: self.controls,
        })
    }

    fn push(
        mut self,
        parent: Option<ControlIndex>,
        name: String,
        kind: ControlKind,
        block: StateBlock,
    ) -> Self {
        let start = self.controls.len();
        let index = self.insert(parent, name, kind, block, ControlFlags::empty());

        for (component, &name) in kind.component_names().iter().enumerate() {
            let block = StateBlock::float(block.byte_offset + component as u32 * 4);
            self.insert(
                Some(index),
                name.to_string(),
                ControlKind::Axis,
                block,
                ControlFlags::empty(),
            );
        }

        self.last_group = start..self.controls.len();
        self
    }

    fn insert(
        &mut self,
        parent: Option<ControlIndex>,
        name: String,
        kind: ControlKind,
        block: StateBlock,
        flags: ControlFlags,
    ) -> ControlIndex {
        let index = ControlIndex(self.controls.len() as u32);
        if let Some(parent) = parent {
            self.controls[parent.index()].children.push(index);
        }
        self.controls.push(ControlLayout {
            name,
            kind,
            block,
            flags,
            parent,
            children: SmallVec::new(),
        });
        index
    }
}

fn validate(controls: &[ControlLayout], index: usize, state_size: u32) -> Result<(), LayoutError> {
    let control = &controls[index];
    let block = control.block;
    let path = || path_in(controls, ControlIndex(index as u32));

    let Some(format) = StateFormat::from_code(block.format) else {
        return Err(LayoutError::UnknownFormat {
            control: path(),
            format: block.format,
        });
    };
    if block.bit_offset >= 8 {
        return Err(LayoutError::InvalidBitOffset {
            control: path(),
            bit_offset: block.bit_offset,
        });
    }
    if !format.accepts_size(block.size_in_bits) {
        return Err(LayoutError::InvalidSize {
            control: path(),
            format: block.format,
            size_in_bits: block.size_in_bits,
        });
    }
    if !format.is_bit_field() && block.bit_offset != 0 {
        return Err(LayoutError::UnalignedFormat {
            control: path(),
            format: block.format,
        });
    }
    if !control.kind.accepts(format) {
        return Err(LayoutError::IncompatibleKind {
            control: path(),
            kind: control.kind,
            format: block.format,
        });
    }

    let end_bit = block.bit_range().end;
    if end_bit > state_size as u64 * 8 {
        return Err(LayoutError::OutOfBounds {
            control: path(),
            end_bit,
            state_size,
        });
    }

    if let Some(parent) = control.parent {
        let parent_block = controls[parent.index()].block;
        if !block.is_inside(&parent_block.bit_range()) {
            return Err(LayoutError::OutsideParent {
                control: path(),
                parent: path_in(controls, parent),
            });
        }
    }

    let duplicate = controls[..index].iter().any(|other| {
        other.parent == control.parent && other.name.eq_ignore_ascii_case(&control.name)
    });
    if duplicate {
        return Err(LayoutError::DuplicateControl(path()));
    }

    Ok(())
}

fn find_in(controls: &[ControlLayout], path: &str) -> Option<ControlIndex> {
    let mut current: Option<usize> = None;
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        let found = controls.iter().enumerate().find(|(_, control)| {
            control.parent.map(ControlIndex::index) == current
                && control.name.eq_ignore_ascii_case(segment)
        })?;
        current = Some(found.0);
    }
    current.map(|index| ControlIndex(index as u32))
}

fn path_in(controls: &[ControlLayout], index: ControlIndex) -> String {
    let mut segments = SmallVec::<[&str; 4]>::new();
    let mut current = Some(index);
    while let Some(index) = current {
        let control = &controls[index.index()];
        segments.push(&control.name);
        current = control.parent;
    }
    segments.reverse();
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composites() {
        let layout = DeviceLayout::builder("Test", FourCc::new(b'T', b'E', b'S', b'T'))
            .quaternion("rotation", 4)
            .flags(ControlFlags::NOISY)
            .button("fire", StateBlock::bit(0, 1))
            .build()
            .unwrap();

        assert_eq!(layout.state_size(), 20);
        let rotation = layout.find("rotation").unwrap();
        assert_eq!(layout.control(rotation).children().len(), 4);

        let w = layout.find("Rotation/W").unwrap();
        assert_eq!(layout.path_of(w), "rotation/w");
        assert_eq!(layout.control(w).block(), StateBlock::float(16));
        assert_eq!(layout.control(w).parent(), Some(rotation));
        assert!(layout.control(w).flags().contains(ControlFlags::NOISY));

        let fire = layout.find("fire").unwrap();
        assert!(layout.control(fire).flags().is_empty());
        assert_eq!(layout.roots().collect::<Vec<_>>(), [rotation, fire]);
    }

    #[test]
    fn explicit_children() {
        let layout = DeviceLayout::builder("Test", FourCc::new(b'T', b'E', b'S', b'T'))
            .integer("buttons", StateBlock::new(0, 0, 8, StateFormat::BIT))
            .child("buttons", "north", ControlKind::button(), StateBlock::bit(0, 3))
            .state_size(4)
            .build()
            .unwrap();

        assert_eq!(layout.state_size(), 4);
        assert_eq!(layout.path_of(layout.find("buttons/north").unwrap()), "buttons/north");
    }

    #[test]
    fn invalid() {
        let format = FourCc::new(b'T', b'E', b'S', b'T');
        let unknown = FourCc::new(b'N', b'O', b'P', b'E');

        assert_eq!(
            DeviceLayout::builder("Empty", format).build(),
            Err(LayoutError::Empty("Empty".into()))
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .axis("a", StateBlock::new(0, 0, 32, unknown))
                .build(),
            Err(LayoutError::UnknownFormat {
                control: "a".into(),
                format: unknown
            })
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .button("a", StateBlock::bit(0, 9))
                .build(),
            Err(LayoutError::InvalidBitOffset {
                control: "a".into(),
                bit_offset: 9
            })
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .axis("a", StateBlock::new(0, 0, 16, StateFormat::FLOAT))
                .build(),
            Err(LayoutError::InvalidSize {
                control: "a".into(),
                format: StateFormat::FLOAT,
                size_in_bits: 16
            })
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .axis("a", StateBlock::new(0, 1, 32, StateFormat::FLOAT))
                .build(),
            Err(LayoutError::UnalignedFormat {
                control: "a".into(),
                format: StateFormat::FLOAT
            })
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .integer("a", StateBlock::float(0))
                .build(),
            Err(LayoutError::IncompatibleKind {
                control: "a".into(),
                kind: ControlKind::Integer,
                format: StateFormat::FLOAT
            })
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .axis("a", StateBlock::float(2))
                .state_size(4)
                .build(),
            Err(LayoutError::OutOfBounds {
                control: "a".into(),
                end_bit: 48,
                state_size: 4
            })
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .integer("a", StateBlock::byte(0))
                .child("a", "b", ControlKind::button(), StateBlock::bit(1, 0))
                .build(),
            Err(LayoutError::OutsideParent {
                control: "a/b".into(),
                parent: "a".into()
            })
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .button("a", StateBlock::bit(0, 0))
                .button("A", StateBlock::bit(0, 1))
                .build(),
            Err(LayoutError::DuplicateControl("A".into()))
        );
        assert_eq!(
            DeviceLayout::builder("Test", format)
                .child("missing", "b", ControlKind::button(), StateBlock::bit(0, 0))
                .build(),
            Err(LayoutError::UnknownParent("missing".into()))
        );
    }
}
