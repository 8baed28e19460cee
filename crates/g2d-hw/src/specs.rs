/// Clock specifications
pub mod clock {
    /// Module clock rate the mixer needs to signal completion.
    ///
    /// Taken from the vendor BSP. At other rates the block finishes the job but
    /// never raises the finish interrupt.
    pub const MODULE_CLOCK_HZ: u64 = 300_000_000;
}

/// Frame geometry limits accepted by the mixer
pub mod frame {
    /// Minimum frame width in pixels
    pub const MIN_WIDTH: u32 = 8;
    /// Minimum frame height in pixels
    pub const MIN_HEIGHT: u32 = 8;
    /// Maximum frame width in pixels
    pub const MAX_WIDTH: u32 = 2048;
    /// Maximum frame height in pixels
    pub const MAX_HEIGHT: u32 = 2048;

    /// Width given to a frame when a context is opened
    pub const DEFAULT_WIDTH: u32 = 800;
    /// Height given to a frame when a context is opened
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Smallest pitch alignment, in bytes
    pub const MIN_ALIGNMENT: u32 = 1;
    /// Largest pitch alignment, in bytes
    pub const MAX_ALIGNMENT: u32 = 1 << 6;
}

/// Fill operation defaults
pub mod fill {
    /// ARGB color used until the fill color control is set
    pub const DEFAULT_COLOR: u32 = 0xFFFF_0100;
    /// Global alpha used until the fill alpha control is set
    pub const DEFAULT_ALPHA: u8 = 0xFF;
}

/// Addressing
pub mod bus {
    /// Width of the physical address bus. The upper byte of a 40-bit address
    /// goes into the `HADDR`/`HADD` registers.
    pub const ADDRESS_BITS: u32 = 40;
}
