//! User-named fruit table (fruit chain)
//!
//! Slime molds carry the id of their fruit name in `enchantment`. Ids are
//! only meaningful within one game, which is why bones loading has to map
//! them by name.

use serde::{Deserialize, Serialize};

/// One named fruit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fruit {
    pub fid: i32,
    pub name: String,
}

/// Game-wide fruit chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FruitTable {
    fruits: Vec<Fruit>,
}

impl FruitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a restored chain, keeping stored order
    pub fn from_fruits(fruits: Vec<Fruit>) -> Self {
        Self { fruits }
    }

    /// Return the id for `name`, adding it if unknown (fruitadd)
    pub fn add(&mut self, name: &str) -> i32 {
        if let Some(f) = self.fruits.iter().find(|f| f.name == name) {
            return f.fid;
        }
        let fid = self.fruits.iter().map(|f| f.fid).max().unwrap_or(0) + 1;
        self.fruits.push(Fruit {
            fid,
            name: name.to_string(),
        });
        fid
    }

    pub fn name_of(&self, fid: i32) -> Option<&str> {
        self.fruits
            .iter()
            .find(|f| f.fid == fid)
            .map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fruit> {
        self.fruits.iter()
    }

    pub fn len(&self) -> usize {
        self.fruits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fruits.is_empty()
    }
}
