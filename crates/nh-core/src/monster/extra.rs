//! Extended monster state: shopkeepers, temple priests, minions
//! (eshk.h, epri.h, emin.h)

use serde::{Deserialize, Serialize};

use crate::dungeon::DLevel;
use crate::object::ObjectId;
use crate::reference::Reference;

/// One line of a shopkeeper's bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillEntry {
    /// Unpaid object (on the level's bill chain when used up)
    pub object: Reference<ObjectId>,
    pub price: i32,
    pub quantity: i32,
    pub used_up: bool,
}

/// Shopkeeper state (eshk)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopkeeperData {
    /// Shopkeeper's name as spoken in dialogue
    pub shk_name: String,
    /// Index into `SHOP_TYPES`
    pub shop_type: u8,
    pub shop_room: u8,
    pub shop_level: DLevel,
    /// Where the shopkeeper stands when the shop is open
    pub shk_pos: (i8, i8),
    /// Inside edge of the shop door
    pub shop_door: (i8, i8),
    pub bill: Vec<BillEntry>,
    pub credit: i64,
    pub debit: i64,
    pub robbed: i64,
    pub following: bool,
    pub surcharge: bool,
}

/// Temple priest state (epri)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriestData {
    pub shrine_align: i8,
    pub shrine_room: u8,
    pub shrine_pos: (i8, i8),
    pub shrine_level: DLevel,
}

/// Role-specific monster extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterExtra {
    #[default]
    None,
    Shopkeeper(ShopkeeperData),
    Priest(PriestData),
    Minion { align: i8 },
}

impl MonsterExtra {
    /// Tag byte used by the save format
    pub const fn tag(&self) -> u8 {
        match self {
            MonsterExtra::None => 0,
            MonsterExtra::Shopkeeper(_) => 1,
            MonsterExtra::Priest(_) => 2,
            MonsterExtra::Minion { .. } => 3,
        }
    }
}

/// Shop types and the shopkeeper names their dialogue tables use
pub const SHOP_TYPES: &[(&str, &[&str])] = &[
    ("general store", &["Hebiwerie", "Izchak", "Asidonhopo", "Njezjin", "Ydna"]),
    ("used armor dealership", &["Demirci", "Kalecik", "Boyabat", "Yildizeli"]),
    ("second-hand bookstore", &["Skibbereen", "Kanturk", "Rath Luirc", "Ennistymon"]),
    ("liquor emporium", &["Njezjin", "Tsjernigof", "Ossipewsk", "Gorlowka"]),
    ("antique weapons outlet", &["Voulgezac", "Rouffiac", "Lerignac", "Touverac"]),
    ("delicatessen", &["Djasinga", "Tjibarusa", "Tjiwidej", "Pengalengan"]),
    ("jewelers", &["Zarnesti", "Slanic", "Nehoiasu", "Ludus"]),
    ("quality apparel and accessories", &["Yr Wyddgrug", "Trallwng", "Mallwyd", "Pontarfynach"]),
    ("hardware store", &["Ymla", "Eed-morra", "Cubask", "Nieb"]),
    ("rare books", &["Eskovo", "Zlatni Pyasatsi", "Svilengrad", "Kazanlak"]),
    ("lighting store", &["Izchak", "Lechaim"]),
];

/// Is `name` one of the names the dialogue table for `shop_type` knows?
pub fn shopkeeper_name_known(shop_type: u8, name: &str) -> bool {
    SHOP_TYPES
        .get(shop_type as usize)
        .is_some_and(|(_, names)| names.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopkeeper_names() {
        assert!(shopkeeper_name_known(0, "Izchak"));
        assert!(shopkeeper_name_known(10, "Izchak"));
        assert!(!shopkeeper_name_known(1, "Izchak"));
        assert!(!shopkeeper_name_known(200, "Izchak"));
    }

    #[test]
    fn test_extra_tags_are_distinct() {
        let tags = [
            MonsterExtra::None.tag(),
            MonsterExtra::Minion { align: 1 }.tag(),
        ];
        assert_ne!(tags[0], tags[1]);
    }
}
