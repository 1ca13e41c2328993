//! Save/load via `bitcode` with a small version header.
//!
//! A fixed magic + version prefix ahead of the payload, so a version bump
//! can be detected before `bitcode::decode` ever runs against incompatible
//! bytes.

use std::path::Path;

use bitcode::{Decode, Encode};

use crate::error::{IsoCityError, Result};
use crate::world::World;

const MAGIC: [u8; 4] = *b"ISOC";
const CURRENT_VERSION: u32 = 1;

#[derive(Encode, Decode)]
struct SaveHeader {
    magic: [u8; 4],
    version: u32,
}

#[derive(Encode, Decode)]
struct SaveFile {
    header: SaveHeader,
    world: World,
}

pub fn save_world_to_bytes(world: &World) -> Result<Vec<u8>> {
    let file = SaveFile {
        header: SaveHeader {
            magic: MAGIC,
            version: CURRENT_VERSION,
        },
        world: world.clone(),
    };
    Ok(bitcode::encode(&file))
}

pub fn load_world_from_bytes(bytes: &[u8]) -> Result<World> {
    let file: SaveFile = bitcode::decode(bytes).map_err(|e| IsoCityError::Decode(e.to_string()))?;

    if file.header.magic != MAGIC {
        return Err(IsoCityError::Decode("bad save file magic".to_string()));
    }
    if file.header.version > CURRENT_VERSION {
        return Err(IsoCityError::VersionMismatch {
            expected_max: CURRENT_VERSION,
            found: file.header.version,
        });
    }

    Ok(file.world)
}

pub fn save_world_to_path(world: &World, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let bytes = save_world_to_bytes(world)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn load_world_from_path(path: &Path) -> Result<World> {
    let bytes = std::fs::read(path)?;
    load_world_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_dimensions_and_seed() {
        let world = World::new(5, 4, 99);
        let bytes = save_world_to_bytes(&world).unwrap();
        let loaded = load_world_from_bytes(&bytes).unwrap();
        assert_eq!(loaded.width(), 5);
        assert_eq!(loaded.height(), 4);
        assert_eq!(loaded.seed(), 99);
    }

    #[test]
    fn future_version_is_rejected() {
        let file = SaveFile {
            header: SaveHeader { magic: MAGIC, version: CURRENT_VERSION + 1 },
            world: World::new(1, 1, 1),
        };
        let bytes = bitcode::encode(&file);
        let result = load_world_from_bytes(&bytes);
        assert!(matches!(result, Err(IsoCityError::VersionMismatch { .. })));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let file = SaveFile {
            header: SaveHeader { magic: *b"NOPE", version: 1 },
            world: World::new(1, 1, 1),
        };
        let bytes = bitcode::encode(&file);
        let result = load_world_from_bytes(&bytes);
        assert!(result.is_err());
    }
}
