use serde::{Deserialize, Serialize};

use crate::error::{invalid_config, SimError};

/// Domain faces treated as open (outflow) instead of solid walls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OpenBoundary {
    pub neg_x: bool,
    pub pos_x: bool,
    pub neg_y: bool,
    pub pos_y: bool,
    pub neg_z: bool,
    pub pos_z: bool,
}

impl OpenBoundary {
    /// Parse a face string such as `"yY"` (floor and top)
    pub fn parse(faces: &str) -> Result<Self, SimError> {
        let mut open = OpenBoundary::default();
        for c in faces.chars() {
            match c {
                'x' => open.neg_x = true,
                'X' => open.pos_x = true,
                'y' => open.neg_y = true,
                'Y' => open.pos_y = true,
                'z' => open.neg_z = true,
                'Z' => open.pos_z = true,
                other => {
                    return Err(invalid_config("open_bound", format!("unknown face '{}'", other)));
                }
            }
        }
        Ok(open)
    }

    /// Open flag per axis as (lower face, upper face)
    pub fn faces(&self, axis: usize) -> (bool, bool) {
        match axis {
            0 => (self.neg_x, self.pos_x),
            1 => (self.neg_y, self.pos_y),
            _ => (self.neg_z, self.pos_z),
        }
    }
}

impl TryFrom<String> for OpenBoundary {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OpenBoundary::parse(&value)
    }
}

impl From<OpenBoundary> for String {
    fn from(value: OpenBoundary) -> Self {
        let mut faces = String::new();
        for (flag, c) in [
            (value.neg_x, 'x'),
            (value.pos_x, 'X'),
            (value.neg_y, 'y'),
            (value.pos_y, 'Y'),
            (value.neg_z, 'z'),
            (value.pos_z, 'Z'),
        ] {
            if flag {
                faces.push(c);
            }
        }
        faces
    }
}
