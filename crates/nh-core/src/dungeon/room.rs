//! Rooms and the rectangles they and area effects occupy

use serde::{Deserialize, Serialize};
use strum::FromRepr;

use crate::rng::GameRng;

/// An inclusive map rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub lx: i8,
    pub ly: i8,
    pub hx: i8,
    pub hy: i8,
}

impl Bounds {
    /// Corners may be given in either order.
    pub fn new(x1: i8, y1: i8, x2: i8, y2: i8) -> Self {
        Self {
            lx: x1.min(x2),
            ly: y1.min(y2),
            hx: x1.max(x2),
            hy: y1.max(y2),
        }
    }

    pub fn contains(&self, x: i8, y: i8) -> bool {
        (self.lx..=self.hx).contains(&x) && (self.ly..=self.hy).contains(&y)
    }

    pub fn width(&self) -> u32 {
        (i32::from(self.hx) - i32::from(self.lx) + 1).max(1) as u32
    }

    pub fn height(&self) -> u32 {
        (i32::from(self.hy) - i32::from(self.ly) + 1).max(1) as u32
    }

    pub fn random_spot(&self, rng: &mut GameRng) -> (i8, i8) {
        let x = i32::from(self.lx) + rng.rn2(self.width()) as i32;
        let y = i32::from(self.ly) + rng.rn2(self.height()) as i32;
        (x as i8, y as i8)
    }
}

/// Stored as the discriminant; shop kinds follow `GeneralShop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr)]
#[repr(u8)]
pub enum RoomType {
    #[default]
    Ordinary = 0,
    Court = 2,
    Swamp = 3,
    Vault = 4,
    Beehive = 5,
    Morgue = 6,
    Barracks = 7,
    Zoo = 8,
    Delphi = 9,
    Temple = 10,
    LeprechaunHall = 11,
    CockatriceNest = 12,
    Anthole = 13,
    GeneralShop = 14,
    ArmorShop = 15,
    ScrollShop = 16,
    PotionShop = 17,
    WeaponShop = 18,
    FoodShop = 19,
    RingShop = 20,
    WandShop = 21,
    ToolShop = 22,
    BookShop = 23,
    HealthFoodShop = 24,
    CandleShop = 25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub bounds: Bounds,
    pub room_type: RoomType,
    pub lit: bool,
    /// Index of the first door in the level's door table
    pub first_door: u8,
    pub door_count: u8,
    pub irregular: bool,
    /// Contents not generated yet
    pub needs_fill: bool,
}

impl Room {
    pub fn new(lx: i8, ly: i8, hx: i8, hy: i8, room_type: RoomType) -> Self {
        Self {
            bounds: Bounds::new(lx, ly, hx, hy),
            room_type,
            lit: true,
            first_door: 0,
            door_count: 0,
            irregular: false,
            needs_fill: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_normalize_corners() {
        let b = Bounds::new(10, 7, 5, 3);
        assert_eq!((b.lx, b.ly, b.hx, b.hy), (5, 3, 10, 7));
        assert_eq!((b.width(), b.height()), (6, 5));
        assert!(b.contains(5, 3));
        assert!(b.contains(10, 7));
        assert!(!b.contains(11, 7));
    }

    #[test]
    fn test_random_spot_inside() {
        let b = Bounds::new(2, 2, 4, 3);
        let mut rng = GameRng::new(11);
        for _ in 0..50 {
            let (x, y) = b.random_spot(&mut rng);
            assert!(b.contains(x, y));
        }
    }
}
