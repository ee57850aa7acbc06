//! Tile-region overlay
//!
//! A region binds a rectangle of screen cells to the loaded tile set. Bound
//! cells are drawn from tiles instead of glyphs, and a cell is either fully
//! inside one region or outside all of them.

use std::path::PathBuf;

use crate::error::{UncursedError, UncursedResult};

/// Backend-defined handle to a loaded tile raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub top: u16,
    pub left: u16,
    pub height: u16,
    pub width: u16,
}

impl Rect {
    pub fn new(top: u16, left: u16, height: u16, width: u16) -> Self {
        Self {
            top,
            left,
            height,
            width,
        }
    }

    pub fn contains(&self, y: u16, x: u16) -> bool {
        y >= self.top
            && x >= self.left
            && (y - self.top) < self.height
            && (x - self.left) < self.width
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a_bottom, a_right) = self.end();
        let (b_bottom, b_right) = other.end();
        u32::from(self.top) < b_bottom && u32::from(other.top) < a_bottom && u32::from(self.left) < b_right && u32::from(other.left) < a_right
    }

    fn end(&self) -> (u32, u32) {
        (
            self.top as u32 + self.height as u32,
            self.left as u32 + self.width as u32,
        )
    }

    fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }
}

/// Who holds the raster for the current tile set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileOwner {
    Backend { table: String, handle: TileHandle },
    /// No backend can draw tiles; regions are still tracked.
    Dummy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSet {
    pub path: PathBuf,
    pub tile_width: u16,
    pub tile_height: u16,
    pub owner: TileOwner,
}

/// What a bound cell shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCell {
    pub region: RegionId,
    pub tile: Option<u32>,
}

#[derive(Debug, Clone)]
struct TileRegion {
    id: RegionId,
    rect: Rect,
    tiles: Vec<Option<u32>>,
}

/// Region bookkeeping for one screen
#[derive(Debug, Clone, Default)]
pub struct TileLayer {
    set: Option<TileSet>,
    regions: Vec<TileRegion>,
    height: u16,
    width: u16,
    next_id: u32,
}

impl TileLayer {
    pub fn new(height: u16, width: u16) -> Self {
        Self {
            height,
            width,
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn tile_set(&self) -> Option<&TileSet> {
        self.set.as_ref()
    }

    /// Install a tile set, returning the one it replaces.
    ///
    /// Regions survive a tile set change but lose their tiles.
    pub fn replace_tile_set(&mut self, set: TileSet) -> Option<TileSet> {
        for region in &mut self.regions {
            region.tiles.fill(None);
        }
        self.set.replace(set)
    }

    pub fn create_region(&mut self, rect: Rect) -> UncursedResult<RegionId> {
        if rect.is_empty()
            || rect.top as u32 + rect.height as u32 > self.height as u32
            || rect.left as u32 + rect.width as u32 > self.width as u32
        {
            return Err(UncursedError::RegionBounds(format!(
                "{}x{} at ({}, {}) on a {}x{} screen",
                rect.height, rect.width, rect.top, rect.left, self.height, self.width
            )));
        }
        if let Some(existing) = self.regions.iter().find(|r| r.rect.overlaps(&rect)) {
            return Err(UncursedError::RegionOverlap {
                existing: existing.id.0,
            });
        }

        let id = RegionId(self.next_id);
        self.next_id += 1;
        self.regions.push(TileRegion {
            id,
            rect,
            tiles: vec![None; rect.height as usize * rect.width as usize],
        });
        tracing::debug!(region = id.0, ?rect, "created tile region");
        Ok(id)
    }

    pub fn delete_region(&mut self, id: RegionId) -> Option<Rect> {
        let pos = self.regions.iter().position(|r| r.id == id)?;
        Some(self.regions.remove(pos).rect)
    }

    /// Coordinates are relative to the region. Returns false if either the
    /// region or the position does not exist.
    pub fn set_tile(&mut self, id: RegionId, y: u16, x: u16, tile: Option<u32>) -> bool {
        let Some(region) = self.regions.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if y >= region.rect.height || x >= region.rect.width {
            return false;
        }
        region.tiles[y as usize * region.rect.width as usize + x as usize] = tile;
        true
    }

    pub fn region_rect(&self, id: RegionId) -> Option<Rect> {
        self.regions.iter().find(|r| r.id == id).map(|r| r.rect)
    }

    /// The region binding, if any, of a screen cell.
    pub fn tile_at(&self, y: u16, x: u16) -> Option<TileCell> {
        self.regions
            .iter()
            .find(|r| r.rect.contains(y, x))
            .map(|r| {
                let (ry, rx) = (y - r.rect.top, x - r.rect.left);
                TileCell {
                    region: r.id,
                    tile: r.tiles[ry as usize * r.rect.width as usize + rx as usize],
                }
            })
    }

    /// Drops regions that no longer fit.
    pub(crate) fn resize(&mut self, height: u16, width: u16) {
        self.height = height;
        self.width = width;
        self.regions.retain(|r| {
            let fits = r.rect.top as u32 + r.rect.height as u32 <= height as u32
                && r.rect.left as u32 + r.rect.width as u32 <= width as u32;
            if !fits {
                tracing::warn!(region = r.id.0, "tile region dropped by resize");
            }
            fits
        });
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_rejected() {
        let mut layer = TileLayer::new(24, 80);
        let a = layer.create_region(Rect::new(1, 0, 21, 40)).unwrap();
        let err = layer.create_region(Rect::new(10, 39, 2, 2)).unwrap_err();
        assert!(matches!(err, UncursedError::RegionOverlap { existing } if existing == a.0));

        // Touching edges is fine.
        assert!(layer.create_region(Rect::new(1, 40, 21, 40)).is_ok());
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut layer = TileLayer::new(24, 80);
        assert!(layer.create_region(Rect::new(20, 0, 5, 10)).is_err());
        assert!(layer.create_region(Rect::new(0, 0, 0, 10)).is_err());
    }

    #[test]
    fn test_tile_lookup_is_region_relative() {
        let mut layer = TileLayer::new(24, 80);
        let id = layer.create_region(Rect::new(2, 5, 3, 3)).unwrap();
        assert!(layer.set_tile(id, 1, 2, Some(77)));
        assert!(!layer.set_tile(id, 3, 0, Some(1)));

        assert_eq!(
            layer.tile_at(3, 7),
            Some(TileCell {
                region: id,
                tile: Some(77)
            })
        );
        assert_eq!(layer.tile_at(2, 5).and_then(|t| t.tile), None);
        assert_eq!(layer.tile_at(1, 5), None);
    }

    #[test]
    fn test_delete_unbinds_cells() {
        let mut layer = TileLayer::new(10, 10);
        let id = layer.create_region(Rect::new(0, 0, 2, 2)).unwrap();
        assert_eq!(layer.region_rect(id), Some(Rect::new(0, 0, 2, 2)));
        assert_eq!(layer.delete_region(id), Some(Rect::new(0, 0, 2, 2)));
        assert_eq!(layer.region_rect(id), None);
        assert_eq!(layer.tile_at(0, 0), None);
        assert_eq!(layer.delete_region(id), None);
    }

    #[test]
    fn test_new_tile_set_clears_tiles() {
        let mut layer = TileLayer::new(10, 10);
        let id = layer.create_region(Rect::new(0, 0, 2, 2)).unwrap();
        layer.set_tile(id, 0, 0, Some(3));
        let set = TileSet {
            path: PathBuf::from("tiles.png"),
            tile_width: 16,
            tile_height: 16,
            owner: TileOwner::Dummy,
        };
        assert!(layer.replace_tile_set(set).is_none());
        assert_eq!(layer.tile_at(0, 0).and_then(|t| t.tile), None);
    }

    #[test]
    fn test_resize_drops_regions_that_no_longer_fit() {
        let mut layer = TileLayer::new(24, 80);
        layer.create_region(Rect::new(0, 0, 5, 5)).unwrap();
        layer.create_region(Rect::new(20, 70, 4, 10)).unwrap();
        layer.resize(20, 60);
        assert_eq!(layer.region_count(), 1);
    }
}
