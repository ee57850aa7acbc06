//! Object instances (obj.h)

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

use super::ObjectClass;
use crate::dungeon::DLevel;
use crate::monster::MonsterId;
use crate::reference::EntityId;

/// Unique identifier for object instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub const NONE: ObjectId = ObjectId(0);

    pub fn next(self) -> Self {
        ObjectId(self.0 + 1)
    }
}

impl EntityId for ObjectId {
    fn raw(self) -> u32 {
        self.0
    }

    fn from_raw(raw: u32) -> Self {
        ObjectId(raw)
    }
}

/// Where the object is located
///
/// Exactly one of these holds at a time, and it must agree with the chain
/// that currently owns the object.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    FromRepr,
)]
#[repr(u8)]
pub enum ObjectLocation {
    /// Floating: not on any chain (staging during restore)
    #[default]
    Free = 0,
    /// On the floor
    Floor = 1,
    /// Inside a container
    Contained = 2,
    /// In player inventory
    PlayerInventory = 3,
    /// In monster inventory
    MonsterInventory = 4,
    /// Moving between levels
    Migrating = 5,
    /// Buried in ground
    Buried = 6,
    /// On shopkeeper bill
    OnBill = 7,
}

/// BUC (blessed/uncursed/cursed) status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr)]
#[repr(u8)]
pub enum BucStatus {
    Blessed = 0,
    #[default]
    Uncursed = 1,
    Cursed = 2,
}

bitflags! {
    /// Slots an object occupies while worn or wielded (owornmask)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct WornMask: u32 {
        const ARMOR = 0x0000_0001;
        const CLOAK = 0x0000_0002;
        const HELMET = 0x0000_0004;
        const SHIELD = 0x0000_0008;
        const GLOVES = 0x0000_0010;
        const BOOTS = 0x0000_0020;
        const SHIRT = 0x0000_0040;
        const WEAPON = 0x0000_0100;
        const QUIVER = 0x0000_0200;
        const SWAP_WEAPON = 0x0000_0400;
        const AMULET = 0x0001_0000;
        const RING_LEFT = 0x0002_0000;
        const RING_RIGHT = 0x0004_0000;
        const TOOL = 0x0008_0000;
        const SADDLE = 0x0010_0000;
        const BALL = 0x0020_0000;
        const CHAIN = 0x0040_0000;
    }
}

impl Serialize for WornMask {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WornMask {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(WornMask::from_bits_retain(bits))
    }
}

/// Object instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Unique identifier
    pub id: ObjectId,

    /// Object type index (into the object table)
    pub object_type: i16,

    /// Object class (cached from type)
    pub class: ObjectClass,

    /// Position (when on floor or buried)
    pub x: i8,
    pub y: i8,

    /// Weight (can differ from base for containers)
    pub weight: u32,

    /// Quantity (for stackable items)
    pub quantity: i32,

    /// Enchantment/charges; fruit id for slime molds
    pub enchantment: i8,

    /// Inventory letter
    pub inv_letter: char,

    /// Artifact index (0 = not artifact)
    pub artifact: u8,

    /// Current location
    pub location: ObjectLocation,

    /// Enclosing container when `location == Contained`
    pub container: Option<ObjectId>,

    /// Carrying monster when `location == MonsterInventory`
    pub carrier: Option<MonsterId>,

    /// Level whose chains hold this object
    pub olev: Option<DLevel>,

    /// BUC status
    pub buc: BucStatus,

    pub known: bool,
    pub desc_known: bool,
    pub buc_known: bool,
    pub rust_known: bool,

    /// Erosion level (rust/burn) 0-3
    pub erosion1: u8,

    /// Erosion level (corrode/rot) 0-3
    pub erosion2: u8,

    pub erosion_proof: bool,
    pub locked: bool,
    pub broken: bool,
    pub trapped: bool,

    /// Recharged count
    pub recharged: u8,

    /// Lit (light sources)
    pub lit: bool,

    pub greased: bool,
    pub in_use: bool,

    /// Worn mask (body slots)
    pub worn_mask: WornMask,

    /// Corpse monster type (for corpses, eggs, figurines)
    pub corpse_type: i16,

    /// Creation turn, or remaining fuel for burners
    pub age: i64,

    /// Contents (for containers)
    pub contents: Vec<Object>,

    /// Custom name
    pub name: Option<String>,

    /// Shop price (when unpaid)
    pub shop_price: i32,

    /// Unpaid flag
    pub unpaid: bool,
}

impl Default for Object {
    fn default() -> Self {
        Self {
            id: ObjectId::NONE,
            object_type: 0,
            class: ObjectClass::default(),
            x: 0,
            y: 0,
            weight: 0,
            quantity: 1,
            enchantment: 0,
            inv_letter: '\0',
            artifact: 0,
            location: ObjectLocation::Free,
            container: None,
            carrier: None,
            olev: None,
            buc: BucStatus::Uncursed,
            known: false,
            desc_known: false,
            buc_known: false,
            rust_known: false,
            erosion1: 0,
            erosion2: 0,
            erosion_proof: false,
            locked: false,
            broken: false,
            trapped: false,
            recharged: 0,
            lit: false,
            greased: false,
            in_use: false,
            worn_mask: WornMask::empty(),
            corpse_type: -1,
            age: 0,
            contents: Vec::new(),
            name: None,
            shop_price: 0,
            unpaid: false,
        }
    }
}

impl Object {
    /// Create a new object of the given type
    pub fn new(id: ObjectId, object_type: i16, class: ObjectClass) -> Self {
        Self {
            id,
            object_type,
            class,
            ..Default::default()
        }
    }

    /// Whether this object holds a child chain
    pub fn has_contents(&self) -> bool {
        !self.contents.is_empty()
    }

    /// Is this object wielded?
    pub fn is_wielded(&self) -> bool {
        self.worn_mask.contains(WornMask::WEAPON)
    }

    /// Put `child` inside this container, fixing up its back-reference.
    pub fn add_to_container(&mut self, mut child: Object) {
        child.location = ObjectLocation::Contained;
        child.container = Some(self.id);
        child.carrier = None;
        child.olev = self.olev;
        self.contents.push(child);
    }

    /// Visit this object and all nested contents, depth-first pre-order.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Object)) {
        f(self);
        for child in &self.contents {
            child.walk(f);
        }
    }

    /// Mutable pre-order walk
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Object)) {
        f(self);
        for child in &mut self.contents {
            child.walk_mut(f);
        }
    }

    /// Find `id` in this object or anything nested in it.
    pub fn find(&self, id: ObjectId) -> Option<&Object> {
        if self.id == id {
            return Some(self);
        }
        self.contents.iter().find_map(|child| child.find(id))
    }

    /// Number of objects in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        1 + self.contents.iter().map(Object::subtree_len).sum::<usize>()
    }
}

/// Find `id` anywhere in a chain, including nested containers.
pub fn find_in_chain(chain: &[Object], id: ObjectId) -> Option<&Object> {
    chain.iter().find_map(|obj| obj.find(id))
}
