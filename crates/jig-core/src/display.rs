//! Display styling for generated parts

use serde::{Deserialize, Serialize};

use crate::constants::{PART_BOTTOM, PART_FAUXKEY, PART_KEY, PART_SHIM, PART_TOP};

/// Named part colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartColor {
    Red,
    Green,
    Yellow,
    Brown,
}

impl PartColor {
    /// Linear RGB components
    pub fn rgb(self) -> [f32; 3] {
        match self {
            PartColor::Red => [1.0, 0.0, 0.0],
            PartColor::Green => [0.0, 0.5, 0.0],
            PartColor::Yellow => [1.0, 1.0, 0.0],
            PartColor::Brown => [0.65, 0.16, 0.16],
        }
    }
}

/// How a part is shown by a viewer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayStyle {
    pub color: PartColor,
    /// Transparency, 0 = opaque
    pub alpha: f32,
    pub visible: bool,
}

impl DisplayStyle {
    pub const fn new(color: PartColor, alpha: f32, visible: bool) -> Self {
        Self {
            color,
            alpha,
            visible,
        }
    }

    /// RGBA with the alpha channel as opacity
    pub fn rgba(&self) -> [f32; 4] {
        let [r, g, b] = self.color.rgb();
        [r, g, b, 1.0 - self.alpha]
    }
}

/// Style of an output part; `None` for intermediate solids
pub fn style_for(part: &str) -> Option<DisplayStyle> {
    match part {
        PART_FAUXKEY => Some(DisplayStyle::new(PartColor::Green, 0.25, true)),
        PART_TOP => Some(DisplayStyle::new(PartColor::Red, 0.0, true)),
        PART_BOTTOM => Some(DisplayStyle::new(PartColor::Yellow, 0.0, true)),
        PART_KEY => Some(DisplayStyle::new(PartColor::Brown, 0.25, false)),
        PART_SHIM => Some(DisplayStyle::new(PartColor::Red, 0.25, false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PART_CASE, PART_CAVITY};

    #[test]
    fn test_output_styles() {
        let top = style_for(PART_TOP).unwrap();
        assert_eq!(top.color, PartColor::Red);
        assert!(top.visible);
        assert_eq!(top.rgba()[3], 1.0);

        let key = style_for(PART_KEY).unwrap();
        assert!(!key.visible);
        assert_eq!(key.rgba()[3], 0.75);

        assert!(style_for(PART_CASE).is_none());
        assert!(style_for(PART_CAVITY).is_none());
    }
}
