// src/convert/montage.rs
//! Electrode montage for the headband
//!
//! The device has four dry electrodes at fixed scalp positions. Coordinates
//! are in meters in the head frame, matching what analysis tooling expects
//! for digitized montages.

/// Built-in electrode positions, head frame, meters.
pub const ELECTRODE_POSITIONS: [(&str, [f64; 3]); 4] = [
    ("TP9", [-0.085_619_2, -0.046_514_7, -0.045_707_0]),
    ("AF7", [-0.054_839_7, 0.068_572_2, -0.010_590_0]),
    ("AF8", [0.055_743_3, 0.069_656_8, -0.010_755_0]),
    ("TP10", [0.086_161_8, -0.047_035_3, -0.045_869_0]),
];

/// Optional fiducial landmark positions for one recording, head frame,
/// meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fiducials {
    /// Nasion.
    pub nasion: Option<[f64; 3]>,
    /// Left periauricular point.
    pub lpa: Option<[f64; 3]>,
    /// Right periauricular point.
    pub rpa: Option<[f64; 3]>,
}

/// Per-channel electrode positions plus optional fiducials.
#[derive(Debug, Clone, PartialEq)]
pub struct Montage {
    /// `(label, position)` per channel, in the channel order of the
    /// recording that carries this montage.
    pub positions: Vec<(String, [f64; 3])>,
    /// Fiducial landmarks, when digitized.
    pub fiducials: Fiducials,
}

impl Montage {
    /// Montage with the built-in electrode positions arranged in `order`.
    /// Labels without a built-in position are skipped.
    pub fn builtin(order: &[String], fiducials: Fiducials) -> Self {
        let positions = order
            .iter()
            .filter_map(|label| {
                ELECTRODE_POSITIONS
                    .iter()
                    .find(|(name, _)| name == label)
                    .map(|(name, pos)| (name.to_string(), *pos))
            })
            .collect();
        Montage {
            positions,
            fiducials,
        }
    }

    /// Position of `label`, if present.
    pub fn position(&self, label: &str) -> Option<[f64; 3]> {
        self.positions
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, pos)| *pos)
    }
}
