use crate::EngineConfig;
use crate::settings::Control;
use clap::Parser;
use g2d_hw::specs::{bus, clock, fill, frame};

/// Run a rectangle fill on the simulated G2D
#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// Destination frame width in pixels
    #[arg(long, default_value_t = frame::DEFAULT_WIDTH)]
    pub width: u32,

    /// Destination frame height in pixels
    #[arg(long, default_value_t = frame::DEFAULT_HEIGHT)]
    pub height: u32,

    /// Left edge of the fill rectangle
    #[arg(long, default_value_t = 200, allow_hyphen_values = true)]
    pub left: i32,

    /// Top edge of the fill rectangle
    #[arg(long, default_value_t = 120, allow_hyphen_values = true)]
    pub top: i32,

    /// Width of the fill rectangle
    #[arg(long, default_value_t = 400)]
    pub fill_width: u32,

    /// Height of the fill rectangle
    #[arg(long, default_value_t = 240)]
    pub fill_height: u32,

    /// ARGB fill color (hex: 0xFFFF0100 or decimal)
    #[arg(long, value_parser = parse_u32_hex_or_dec, default_value_t = fill::DEFAULT_COLOR)]
    pub color: u32,

    /// Global alpha of the fill layer
    #[arg(long, default_value_t = fill::DEFAULT_ALPHA)]
    pub alpha: u8,

    /// Pitch alignment in bytes (power of two, 1 to 64)
    #[arg(long, default_value_t = 1)]
    pub alignment: u32,

    /// Physical address of the destination buffer (hex: 0x40000000 or decimal)
    #[arg(long, value_parser = parse_hex_or_dec, default_value_t = 0x4000_0000)]
    pub base: u64,

    /// Leave the high address registers alone (32-bit bus)
    #[arg(long)]
    pub narrow_addressing: bool,

    /// Module clock rate in Hz
    #[arg(long, default_value_t = clock::MODULE_CLOCK_HZ)]
    pub module_clock_hz: u64,

    /// Give up waiting for completion after this many milliseconds
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Never raise the completion interrupt, to exercise the timeout path
    #[arg(long)]
    pub stall: bool,
}

impl Args {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        Control::OutputAlignment
            .validate(self.alignment)
            .map_err(|e| e.to_string())?;

        let bytes = u64::from(self.width) * u64::from(self.height) * 4;
        if self.base.checked_add(bytes).is_none_or(|end| end > 1 << bus::ADDRESS_BITS) {
            return Err(format!(
                "buffer at {:#X} does not fit a {}-bit bus",
                self.base,
                bus::ADDRESS_BITS
            ));
        }
        if self.narrow_addressing && self.base + bytes > 1 << 32 {
            return Err("--narrow-addressing needs a buffer below 4 GiB".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("--timeout-ms must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Convert Args to EngineConfig
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            module_clock_hz: self.module_clock_hz,
            wide_addressing: !self.narrow_addressing,
        }
    }
}

pub fn parse_hex_or_dec(s: &str) -> Result<u64, std::num::ParseIntError> {
    if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    }
}

pub fn parse_u32_hex_or_dec(s: &str) -> Result<u32, String> {
    let value = parse_hex_or_dec(s).map_err(|e| e.to_string())?;
    u32::try_from(value).map_err(|_| format!("{s} does not fit in 32 bits"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_reference_fill() {
        let args = Args::parse_from(["g2d-cli"]);
        assert_eq!((args.width, args.height), (800, 480));
        assert_eq!((args.left, args.top), (200, 120));
        assert_eq!(args.color, 0xFFFF_0100);
        assert!(args.validate().is_ok());
        assert_eq!(args.to_engine_config(), EngineConfig::default());
    }

    #[test]
    fn parses_hex_values() {
        let args = Args::parse_from(["g2d-cli", "--color", "0x80FF0000", "--base", "0x100000000"]);
        assert_eq!(args.color, 0x80FF_0000);
        assert_eq!(args.base, 0x1_0000_0000);
        assert!(parse_u32_hex_or_dec("0x1FFFFFFFF").is_err());
    }

    #[test]
    fn rejects_bad_alignment_and_narrow_high_buffers() {
        let args = Args::parse_from(["g2d-cli", "--alignment", "3"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["g2d-cli", "--base", "0x100000000", "--narrow-addressing"]);
        assert!(args.validate().is_err());
    }
}
