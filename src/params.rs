//! Named scalar uniforms shared by the simulation kernels and the renderer.
//!
//! A [`ParamBlock`] is an ordered map of `f32` uniforms. The order defines the
//! layout of the WGSL `Params` struct, so the same block generates both the
//! struct declaration and the bytes uploaded to the GPU.
//!
//! # Example
//!
//! ```ignore
//! let mut params = ParamBlock::from_live(&LiveParams::default(), 1000);
//! params.set("gravity", 0.0);
//! let wgsl = params.to_wgsl_struct("Params");
//! queue.write_buffer(&buffer, 0, &params.to_bytes());
//! ```

use std::collections::HashMap;

use crate::config::LiveParams;

/// Uniform names, in struct order.
pub const GRAVITY: &str = "gravity";
pub const INTERACTION_RATE: &str = "interaction_rate";
pub const TIME_STEP: &str = "time_step";
pub const BLACK_HOLE_FORCE: &str = "black_hole_force";
pub const LUMINOSITY: &str = "luminosity";
pub const MAX_ACCELERATION_COLOR: &str = "max_acceleration_color";
pub const PARTICLE_COUNT: &str = "particle_count";

/// Ordered collection of named `f32` uniforms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamBlock {
    /// Order matters for WGSL struct layout.
    values: Vec<(String, f32)>,
    indices: HashMap<String, usize>,
}

impl ParamBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block holding every live parameter plus the epoch's particle count.
    pub fn from_live(live: &LiveParams, particle_count: u32) -> Self {
        let mut block = Self::new();
        block.set(GRAVITY, live.gravity);
        block.set(INTERACTION_RATE, live.interaction_rate);
        block.set(TIME_STEP, live.time_step);
        block.set(BLACK_HOLE_FORCE, live.black_hole_force);
        block.set(LUMINOSITY, live.luminosity);
        block.set(MAX_ACCELERATION_COLOR, live.max_acceleration_color);
        block.set(PARTICLE_COUNT, particle_count as f32);
        block
    }

    /// Copy the live values into an existing block, keeping its layout.
    ///
    /// Returns `true` if any value changed.
    pub fn update_live(&mut self, live: &LiveParams) -> bool {
        let before = self.values.clone();
        self.set(GRAVITY, live.gravity);
        self.set(INTERACTION_RATE, live.interaction_rate);
        self.set(TIME_STEP, live.time_step);
        self.set(BLACK_HOLE_FORCE, live.black_hole_force);
        self.set(LUMINOSITY, live.luminosity);
        self.set(MAX_ACCELERATION_COLOR, live.max_acceleration_color);
        before != self.values
    }

    /// Add or update a uniform value.
    pub fn set(&mut self, name: &str, value: f32) {
        if let Some(&idx) = self.indices.get(name) {
            self.values[idx].1 = value;
        } else {
            let idx = self.values.len();
            self.values.push((name.to_string(), value));
            self.indices.insert(name.to_string(), idx);
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.indices.get(name).map(|&idx| self.values[idx].1)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// WGSL struct declaration matching [`to_bytes`](Self::to_bytes).
    pub fn to_wgsl_struct(&self, struct_name: &str) -> String {
        let fields = self
            .values
            .iter()
            .map(|(name, _)| format!("    {}: f32,", name))
            .collect::<Vec<_>>()
            .join("\n");
        format!("struct {struct_name} {{\n{fields}\n}};")
    }

    /// Little-endian bytes, padded to a multiple of 16 for uniform buffers.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.byte_size());
        for (_, value) in &self.values {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.resize(self.byte_size(), 0);
        buf
    }

    /// Padded uniform buffer size in bytes (never zero).
    pub fn byte_size(&self) -> usize {
        ((self.values.len() * 4).max(16) + 15) & !15
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_follows_insertion_order() {
        let block = ParamBlock::from_live(&LiveParams::default(), 1000);
        let names: Vec<_> = block.iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            [
                GRAVITY,
                INTERACTION_RATE,
                TIME_STEP,
                BLACK_HOLE_FORCE,
                LUMINOSITY,
                MAX_ACCELERATION_COLOR,
                PARTICLE_COUNT
            ]
        );
        let bytes = block.to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], &20.0f32.to_le_bytes());
        assert_eq!(&bytes[24..28], &1000.0f32.to_le_bytes());
        assert_eq!(&bytes[28..32], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_set_existing_keeps_position() {
        let mut block = ParamBlock::new();
        block.set("a", 1.0);
        block.set("b", 2.0);
        block.set("a", 3.0);
        assert_eq!(block.len(), 2);
        assert_eq!(block.get("a"), Some(3.0));
        assert_eq!(block.iter().next(), Some(("a", 3.0)));
    }

    #[test]
    fn test_wgsl_struct() {
        let mut block = ParamBlock::new();
        block.set("gravity", 1.0);
        block.set("time_step", 0.1);
        assert_eq!(
            block.to_wgsl_struct("Params"),
            "struct Params {\n    gravity: f32,\n    time_step: f32,\n};"
        );
    }

    #[test]
    fn test_update_live_reports_changes() {
        let live = LiveParams::default();
        let mut block = ParamBlock::from_live(&live, 10);
        assert!(!block.update_live(&live));

        let changed = LiveParams {
            gravity: 0.0,
            ..live
        };
        assert!(block.update_live(&changed));
        assert_eq!(block.get(GRAVITY), Some(0.0));
        assert_eq!(block.get(PARTICLE_COUNT), Some(10.0));
        assert!(!block.update_live(&changed));
    }

    #[test]
    fn test_empty_block_has_minimum_size() {
        assert_eq!(ParamBlock::new().to_bytes().len(), 16);
    }
}
