//! On-disk world format.
//!
//! A save slot is a directory holding one `save.json` descriptor and a
//! `chunks/` directory of binary chunk files. Chunk files carry a magic
//! number, a format version, the chunk position, the raw cell array, and
//! a CRC32 of the cell bytes. A chunk with no file on disk has simply
//! never been edited and is regenerated from the seed.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tiles::{ChunkData, ChunkPos, TileId, CHUNK_VOLUME};

/// Magic number for chunk files ("TILE" in ASCII)
const MAGIC_NUMBER: [u8; 4] = *b"TILE";

/// Current chunk file format version
const VERSION: u16 = 1;

const SAVE_GAME_FILE: &str = "save.json";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed save descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),
    #[error("not a chunk file")]
    InvalidMagicNumber,
    #[error("unsupported chunk format version {0}")]
    UnsupportedVersion(u16),
    #[error("chunk position mismatch: file says {0:?}")]
    PositionMismatch(ChunkPos),
    #[error("checksum mismatch, file is corrupt")]
    ChecksumMismatch,
    #[error("invalid save slot name {0:?}")]
    InvalidSlotName(String),
}

/// Descriptor of one save slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGame {
    pub name: String,
    /// Atlas cell shown in the slot picker
    pub icon_sprite: [i32; 2],
    /// World generation seed, kept verbatim
    pub seed: String,
}

/// Slot names become directory names, so only a conservative character
/// set is accepted.
pub fn validate_slot_name(name: &str) -> Result<(), SaveError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        && !name.starts_with(' ')
        && !name.ends_with(' ');
    if valid {
        Ok(())
    } else {
        Err(SaveError::InvalidSlotName(name.to_string()))
    }
}

pub fn slot_directory(root: &Path, name: &str) -> Result<PathBuf, SaveError> {
    validate_slot_name(name)?;
    Ok(root.join(name))
}

pub fn chunk_path(slot_dir: &Path, pos: ChunkPos) -> PathBuf {
    slot_dir
        .join("chunks")
        .join(format!("chunk_{}_{}.bin", pos.x, pos.y))
}

pub fn chunk_exists(slot_dir: &Path, pos: ChunkPos) -> bool {
    chunk_path(slot_dir, pos).exists()
}

/// Write the slot descriptor, creating the slot directory if needed
pub fn write_save_game(root: &Path, save: &SaveGame) -> Result<PathBuf, SaveError> {
    let dir = slot_directory(root, &save.name)?;
    fs::create_dir_all(&dir)?;
    let path = dir.join(SAVE_GAME_FILE);
    let json = serde_json::to_string_pretty(save)?;
    fs::write(&path, json)?;
    Ok(dir)
}

pub fn read_save_game(slot_dir: &Path) -> Result<SaveGame, SaveError> {
    let raw = fs::read_to_string(slot_dir.join(SAVE_GAME_FILE))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Enumerate save slots under `root` that carry a readable descriptor.
/// Unreadable entries are skipped rather than failing the listing.
pub fn list_save_games(root: &Path) -> Vec<(PathBuf, SaveGame)> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut slots: Vec<(PathBuf, SaveGame)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let dir = entry.path();
            read_save_game(&dir).ok().map(|save| (dir, save))
        })
        .collect();
    slots.sort_by(|a, b| a.1.name.cmp(&b.1.name));
    slots
}

/// Save a chunk to disk in binary format
pub fn save_chunk(chunk: &ChunkData, path: &Path) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;

    file.write_all(&MAGIC_NUMBER)?;
    file.write_all(&VERSION.to_le_bytes())?;
    file.write_all(&chunk.position.x.to_le_bytes())?;
    file.write_all(&chunk.position.y.to_le_bytes())?;

    let mut cell_bytes = Vec::with_capacity(CHUNK_VOLUME * 4);
    for &cell in chunk.cells() {
        cell_bytes.extend_from_slice(&cell.to_le_bytes());
    }
    file.write_all(&cell_bytes)?;

    let checksum = crc32fast::hash(&cell_bytes);
    file.write_all(&checksum.to_le_bytes())?;

    file.sync_all()?;
    Ok(())
}

/// Load a chunk from disk, verifying format and checksum. `expected`
/// guards against a file that was renamed into the wrong grid slot.
pub fn load_chunk(path: &Path, expected: ChunkPos) -> Result<ChunkData, SaveError> {
    let mut file = File::open(path)?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if magic != MAGIC_NUMBER {
        return Err(SaveError::InvalidMagicNumber);
    }

    let mut version_bytes = [0u8; 2];
    file.read_exact(&mut version_bytes)?;
    let version = u16::from_le_bytes(version_bytes);
    if version != VERSION {
        return Err(SaveError::UnsupportedVersion(version));
    }

    let mut x_bytes = [0u8; 4];
    let mut y_bytes = [0u8; 4];
    file.read_exact(&mut x_bytes)?;
    file.read_exact(&mut y_bytes)?;
    let position = ChunkPos::new(i32::from_le_bytes(x_bytes), i32::from_le_bytes(y_bytes));
    if position != expected {
        return Err(SaveError::PositionMismatch(position));
    }

    let mut cell_bytes = vec![0u8; CHUNK_VOLUME * 4];
    file.read_exact(&mut cell_bytes)?;

    let mut checksum_bytes = [0u8; 4];
    file.read_exact(&mut checksum_bytes)?;
    let expected_checksum = u32::from_le_bytes(checksum_bytes);
    if crc32fast::hash(&cell_bytes) != expected_checksum {
        return Err(SaveError::ChecksumMismatch);
    }

    let cells: Vec<TileId> = cell_bytes
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    // Length is exact by construction
    ChunkData::from_cells(position, &cells).ok_or(SaveError::ChecksumMismatch)
}
