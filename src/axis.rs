//! Named axis roles for image and label arrays.
//!
//! Augmentations never take raw axis integers. A [`Layout`] lists the role of
//! every axis of an array (e.g. `bchw`), and each augmentation resolves the
//! roles it needs to concrete indices once, when it is built.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Semantic meaning of one array axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisRole {
    /// Sample index within a batch.
    Batch,
    /// Channels (colour, depth values, feature maps).
    Channel,
    /// Volumetric z axis (written `d` in layouts, as in `dhw`).
    Slice,
    /// Image rows (y).
    Height,
    /// Image columns (x).
    Width,
}

impl AxisRole {
    fn symbol(self) -> char {
        match self {
            AxisRole::Batch => 'b',
            AxisRole::Channel => 'c',
            AxisRole::Slice => 'd',
            AxisRole::Height => 'h',
            AxisRole::Width => 'w',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'b' => Some(AxisRole::Batch),
            'c' => Some(AxisRole::Channel),
            'd' => Some(AxisRole::Slice),
            'h' => Some(AxisRole::Height),
            'w' => Some(AxisRole::Width),
            _ => None,
        }
    }
}

impl fmt::Display for AxisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AxisRole::Batch => "batch",
            AxisRole::Channel => "channel",
            AxisRole::Slice => "slice",
            AxisRole::Height => "height",
            AxisRole::Width => "width",
        };
        f.write_str(name)
    }
}

/// Ordered axis roles of an array, one role per axis, no repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    roles: Vec<AxisRole>,
}

impl Layout {
    /// Create a layout from an ordered list of roles.
    ///
    /// Fails if the list is empty or a role appears twice.
    pub fn new(roles: Vec<AxisRole>) -> Result<Self> {
        if roles.is_empty() {
            return Err(Error::Configuration(
                "layout must name at least one axis".into(),
            ));
        }
        for (i, role) in roles.iter().enumerate() {
            if roles[..i].contains(role) {
                return Err(Error::Configuration(format!(
                    "layout lists the {} axis more than once",
                    role
                )));
            }
        }
        Ok(Self { roles })
    }

    /// Batch, channel, height, width. Default image layout.
    pub fn bchw() -> Self {
        Self::preset(&[
            AxisRole::Batch,
            AxisRole::Channel,
            AxisRole::Height,
            AxisRole::Width,
        ])
    }

    /// Batch, height, width. Default label layout.
    pub fn bhw() -> Self {
        Self::preset(&[AxisRole::Batch, AxisRole::Height, AxisRole::Width])
    }

    /// Channel, height, width (single image, channels first).
    pub fn chw() -> Self {
        Self::preset(&[AxisRole::Channel, AxisRole::Height, AxisRole::Width])
    }

    /// Height, width, channel (single image, channels last).
    pub fn hwc() -> Self {
        Self::preset(&[AxisRole::Height, AxisRole::Width, AxisRole::Channel])
    }

    /// Height, width (single-channel image or label mask).
    pub fn hw() -> Self {
        Self::preset(&[AxisRole::Height, AxisRole::Width])
    }

    fn preset(roles: &[AxisRole]) -> Self {
        Self {
            roles: roles.to_vec(),
        }
    }

    /// Number of axes described.
    pub fn ndim(&self) -> usize {
        self.roles.len()
    }

    /// Roles in axis order.
    pub fn roles(&self) -> &[AxisRole] {
        &self.roles
    }

    /// Whether the layout has an axis with this role.
    pub fn contains(&self, role: AxisRole) -> bool {
        self.roles.contains(&role)
    }

    /// Axis index of `role`.
    pub fn index_of(&self, role: AxisRole) -> Result<usize> {
        self.roles
            .iter()
            .position(|&r| r == role)
            .ok_or_else(|| {
                Error::Configuration(format!("layout '{}' has no {} axis", self, role))
            })
    }

    /// Check that an array of shape `shape` has exactly as many axes as the layout.
    pub fn check_rank(&self, shape: &[usize], what: &str) -> Result<()> {
        if shape.len() != self.ndim() {
            return Err(Error::InvalidDimensions(format!(
                "{} has {} axes {:?} but layout '{}' expects {}",
                what,
                shape.len(),
                shape,
                self,
                self.ndim()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for role in &self.roles {
            write!(f, "{}", role.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for Layout {
    type Err = Error;

    /// Parse a compact layout such as `"bchw"` or `"HWC"`.
    fn from_str(s: &str) -> Result<Self> {
        let roles = s
            .trim()
            .chars()
            .map(|c| {
                AxisRole::from_symbol(c).ok_or_else(|| {
                    Error::Configuration(format!(
                        "unknown axis symbol '{}' in layout '{}' (expected b, c, d, h or w)",
                        c, s
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(roles)
    }
}
