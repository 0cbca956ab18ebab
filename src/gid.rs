//! Tile ids and the flip flags Tiled stores in their top bits.

/// Horizontal flip (bit 31).
pub const FLIP_H: u32 = 0x8000_0000;
/// Vertical flip (bit 30).
pub const FLIP_V: u32 = 0x4000_0000;
/// Anti-diagonal flip (bit 29).
pub const FLIP_D: u32 = 0x2000_0000;
/// Lower 29 bits; bit 28 is free.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// Global tile id as written by the editor, flags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

impl TileId {
    /// Id as stored, flags included.
    #[inline] pub fn raw(self) -> u32 { self.0 }
    /// Id with the flip flags masked off.
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    /// Flipped horizontally.
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    /// Flipped vertically.
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    /// Flipped along the anti-diagonal.
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
    /// Gid 0 marks an empty cell.
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }
}
