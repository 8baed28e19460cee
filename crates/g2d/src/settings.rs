//! Per-context controls.
//!
//! Each control has a fixed range and default. Values are checked here, at
//! the boundary, so the engine never sees an illegal alignment or mode.

use crate::error::{G2dError, G2dResult};
use crate::frame::AlphaBlendMode;
use crate::job::Operation;
use g2d_hw::specs::{fill, frame};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Operation,
    InputAlphaMode,
    OutputAlphaMode,
    InputAlignment,
    OutputAlignment,
    FillColor,
    FillAlpha,
}

/// How a control's value is presented to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Index into a list of names
    Menu(&'static [&'static str]),
    Integer,
    U32,
    U8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlInfo {
    pub control: Control,
    pub name: &'static str,
    pub kind: ControlKind,
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

const OPERATION_MENU: &[&str] = &["Rectfill", "Bitblit"];
const ALPHA_MODE_MENU: &[&str] = &["Pixel alpha", "Plane alpha", "Multi-Plane alpha"];

/// Control table, indexed by [`Control`] discriminant.
pub const CONTROLS: [ControlInfo; 7] = [
    ControlInfo {
        control: Control::Operation,
        name: "G2D Operation",
        kind: ControlKind::Menu(OPERATION_MENU),
        min: 0,
        max: 1,
        default: 0,
    },
    ControlInfo {
        control: Control::InputAlphaMode,
        name: "G2D Input Alpha Blend Mode",
        kind: ControlKind::Menu(ALPHA_MODE_MENU),
        min: 0,
        max: 2,
        default: 0,
    },
    ControlInfo {
        control: Control::OutputAlphaMode,
        name: "G2D Output Alpha Blend Mode",
        kind: ControlKind::Menu(ALPHA_MODE_MENU),
        min: 0,
        max: 2,
        default: 0,
    },
    ControlInfo {
        control: Control::InputAlignment,
        name: "G2D Input Alignment",
        kind: ControlKind::Integer,
        min: frame::MIN_ALIGNMENT,
        max: frame::MAX_ALIGNMENT,
        default: 1,
    },
    ControlInfo {
        control: Control::OutputAlignment,
        name: "G2D Output Alignment",
        kind: ControlKind::Integer,
        min: frame::MIN_ALIGNMENT,
        max: frame::MAX_ALIGNMENT,
        default: 1,
    },
    ControlInfo {
        control: Control::FillColor,
        name: "G2D Rectfill Color",
        kind: ControlKind::U32,
        min: 0,
        max: u32::MAX,
        default: fill::DEFAULT_COLOR,
    },
    ControlInfo {
        control: Control::FillAlpha,
        name: "G2D Rectfill Color Alpha",
        kind: ControlKind::U8,
        min: 0,
        max: 0xFF,
        default: fill::DEFAULT_ALPHA as u32,
    },
];

impl Control {
    pub const ALL: [Control; 7] = [
        Control::Operation,
        Control::InputAlphaMode,
        Control::OutputAlphaMode,
        Control::InputAlignment,
        Control::OutputAlignment,
        Control::FillColor,
        Control::FillAlpha,
    ];

    pub fn info(self) -> &'static ControlInfo {
        &CONTROLS[self as usize]
    }

    /// Check `value` against the control's range. Alignments must also be a
    /// power of two.
    pub fn validate(self, value: u32) -> G2dResult<u32> {
        let info = self.info();
        let aligned = matches!(self, Control::InputAlignment | Control::OutputAlignment);
        if aligned && (!value.is_power_of_two() || value < info.min || value > info.max) {
            return Err(G2dError::InvalidAlignment(value));
        }
        if value < info.min || value > info.max {
            return Err(G2dError::InvalidControlValue {
                control: info.name,
                value,
            });
        }
        Ok(value)
    }
}

/// Current value of every control of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub operation: Operation,
    pub input_alpha_mode: AlphaBlendMode,
    pub output_alpha_mode: AlphaBlendMode,
    pub input_alignment: u32,
    pub output_alignment: u32,
    pub fill_color: u32,
    pub fill_alpha: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            operation: Operation::Fill,
            input_alpha_mode: AlphaBlendMode::PerPixel,
            output_alpha_mode: AlphaBlendMode::PerPixel,
            input_alignment: 1,
            output_alignment: 1,
            fill_color: fill::DEFAULT_COLOR,
            fill_alpha: fill::DEFAULT_ALPHA,
        }
    }
}

impl Settings {
    /// Validate and apply a control value. Settings are untouched on error.
    pub fn set(&mut self, control: Control, value: u32) -> G2dResult<()> {
        let value = control.validate(value)?;
        let invalid = || G2dError::InvalidControlValue {
            control: control.info().name,
            value,
        };

        match control {
            Control::Operation => {
                self.operation = Operation::from_u32(value).ok_or_else(invalid)?;
            }
            Control::InputAlphaMode => {
                self.input_alpha_mode = AlphaBlendMode::from_u32(value).ok_or_else(invalid)?;
            }
            Control::OutputAlphaMode => {
                self.output_alpha_mode = AlphaBlendMode::from_u32(value).ok_or_else(invalid)?;
            }
            Control::InputAlignment => self.input_alignment = value,
            Control::OutputAlignment => self.output_alignment = value,
            Control::FillColor => self.fill_color = value,
            Control::FillAlpha => {
                self.fill_alpha = u8::try_from(value).map_err(|_| invalid())?;
            }
        }

        debug!("Control {:?} = {:#X}", control, value);
        Ok(())
    }

    pub fn get(&self, control: Control) -> u32 {
        match control {
            Control::Operation => self.operation as u32,
            Control::InputAlphaMode => self.input_alpha_mode as u32,
            Control::OutputAlphaMode => self.output_alpha_mode as u32,
            Control::InputAlignment => self.input_alignment,
            Control::OutputAlignment => self.output_alignment,
            Control::FillColor => self.fill_color,
            Control::FillAlpha => u32::from(self.fill_alpha),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_control() {
        for control in Control::ALL {
            assert_eq!(control.info().control, control);
        }
    }

    #[test]
    fn defaults_match_table() {
        let settings = Settings::default();
        for control in Control::ALL {
            assert_eq!(settings.get(control), control.info().default, "{control:?}");
        }
    }

    #[test]
    fn alignment_must_be_power_of_two_in_range() {
        let mut settings = Settings::default();
        for ok in [1, 2, 4, 8, 16, 32, 64] {
            settings.set(Control::OutputAlignment, ok).unwrap();
            assert_eq!(settings.output_alignment, ok);
        }
        for bad in [0, 3, 48, 128] {
            assert_eq!(
                settings.set(Control::InputAlignment, bad),
                Err(G2dError::InvalidAlignment(bad))
            );
        }
        assert_eq!(settings.input_alignment, 1);
    }

    #[test]
    fn menu_values_out_of_range_are_rejected() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set(Control::Operation, 2),
            Err(G2dError::InvalidControlValue { value: 2, .. })
        ));
        assert!(settings.set(Control::InputAlphaMode, 3).is_err());
        assert!(settings.set(Control::FillAlpha, 0x100).is_err());

        settings.set(Control::Operation, 1).unwrap();
        settings.set(Control::OutputAlphaMode, 2).unwrap();
        assert_eq!(settings.operation, Operation::Blit);
        assert_eq!(settings.output_alpha_mode, AlphaBlendMode::PerMixer);
    }

    #[test]
    fn fill_color_takes_any_word() {
        let mut settings = Settings::default();
        settings.set(Control::FillColor, 0x8000_00FF).unwrap();
        settings.set(Control::FillAlpha, 0x40).unwrap();
        assert_eq!(settings.fill_color, 0x8000_00FF);
        assert_eq!(settings.fill_alpha, 0x40);
    }
}
