//! Memory-mapped register blocks.

pub mod g2d;
