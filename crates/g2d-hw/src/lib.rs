//! Register map and hardware constants for the Allwinner G2D mixer block.
//!
//! Everything in this crate is plain data: offsets, masks and the limits the
//! silicon imposes. Behaviour lives in the `g2d` crate.

#![cfg_attr(not(test), no_std)]

pub mod bits;
pub mod mmio;
pub mod specs;
