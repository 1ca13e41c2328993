//! Tile attribute types shared by the grid data model.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum Terrain {
    Water,
    Sand,
    Grass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, Encode, Decode)]
pub enum Overlay {
    #[default]
    None,
    Road,
    Park,
    Residential,
    Commercial,
    Industrial,
    School,
    Hospital,
    PoliceStation,
    FireStation,
}

impl Overlay {
    pub fn is_civic(self) -> bool {
        matches!(
            self,
            Overlay::School | Overlay::Hospital | Overlay::PoliceStation | Overlay::FireStation
        )
    }

    pub fn is_zone(self) -> bool {
        matches!(
            self,
            Overlay::Residential | Overlay::Commercial | Overlay::Industrial
        )
    }
}

/// A single tile. `level` is a road class (1..3) when `overlay == Road`,
/// otherwise a zone density level (1..3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Encode, Decode)]
pub struct Tile {
    pub terrain: Terrain,
    pub overlay: Overlay,
    pub level: u8,
    pub occupants: u32,
    pub district: u8,
    pub height: f32,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            terrain: Terrain::Grass,
            overlay: Overlay::None,
            level: 1,
            occupants: 0,
            district: 0,
            height: 0.0,
        }
    }
}

impl Tile {
    pub fn road_level(&self) -> u8 {
        if self.overlay == Overlay::Road {
            self.level.clamp(1, 3)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tile_is_grass_none() {
        let t = Tile::default();
        assert_eq!(t.terrain, Terrain::Grass);
        assert_eq!(t.overlay, Overlay::None);
        assert_eq!(t.road_level(), 0);
    }

    #[test]
    fn road_level_clamped() {
        let mut t = Tile::default();
        t.overlay = Overlay::Road;
        t.level = 9;
        assert_eq!(t.road_level(), 3);
    }
}
