//! Screen cells
//!
//! A cell holds a glyph of up to [`MAX_CODEPOINTS`] codepoints (a base
//! character and its combining marks), style bits, a pair number and a key
//! per mouse button.

use std::fmt;

use bitflags::bitflags;

use crate::color::{PairTable, Resolved, resolve};
use crate::key::{Key, MOUSE_BUTTONS, MouseButton};

bitflags! {
    /// Style bits stored with each cell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attr: u8 {
        const BOLD = 0x01;
        const UNDERLINE = 0x02;
        const REVERSE = 0x04;
        const INVISIBLE = 0x08;
    }
}

pub const MAX_CODEPOINTS: usize = 5;

/// True for codepoints that attach to the preceding character.
pub fn is_combining(c: char) -> bool {
    matches!(c as u32,
        0x0300..=0x036f
        | 0x1ab0..=0x1aff
        | 0x1dc0..=0x1dff
        | 0x20d0..=0x20ff
        | 0xfe20..=0xfe2f)
}

/// Base character plus combining marks
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Glyph {
    cps: [char; MAX_CODEPOINTS],
    len: u8,
}

impl Glyph {
    pub const BLANK: Glyph = Glyph {
        cps: [' '; MAX_CODEPOINTS],
        len: 1,
    };

    pub fn new(base: char) -> Self {
        let mut cps = [' '; MAX_CODEPOINTS];
        cps[0] = base;
        Self { cps, len: 1 }
    }

    /// Attach a combining mark. Marks past the limit are dropped.
    pub fn push_mark(&mut self, mark: char) -> bool {
        let len = self.len as usize;
        if len >= MAX_CODEPOINTS {
            return false;
        }
        self.cps[len] = mark;
        self.len += 1;
        true
    }

    pub fn base(&self) -> char {
        self.cps[0]
    }

    pub fn codepoints(&self) -> &[char] {
        &self.cps[..self.len as usize]
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::BLANK
    }
}

impl Default for Glyph {
    fn default() -> Self {
        Self::BLANK
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.codepoints() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Glyph({:?})", self.to_string())
    }
}

/// One character position
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    pub glyph: Glyph,
    pub attr: Attr,
    pub pair: u16,
    pub mouse: [Option<Key>; MOUSE_BUTTONS],
    /// Resolution cache, tagged with the color generation it was made in.
    cached: Option<(u64, Resolved)>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            glyph: Glyph::BLANK,
            attr: Attr::empty(),
            pair: 0,
            mouse: [None; MOUSE_BUTTONS],
            cached: None,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.glyph == other.glyph
            && self.attr == other.attr
            && self.pair == other.pair
            && self.mouse == other.mouse
    }
}

impl Eq for Cell {}

impl Cell {
    pub fn new(glyph: Glyph, attr: Attr, pair: u16) -> Self {
        Self {
            glyph,
            attr,
            pair,
            ..Self::default()
        }
    }

    /// Concrete colors, recomputed only when the pair table changed.
    pub fn resolved(&mut self, generation: u64, pairs: &PairTable) -> Resolved {
        match self.cached {
            Some((g, r)) if g == generation => r,
            _ => {
                let r = resolve(self.attr, pairs.get(self.pair));
                self.cached = Some((generation, r));
                r
            }
        }
    }

    pub fn is_cached(&self, generation: u64) -> bool {
        matches!(self.cached, Some((g, _)) if g == generation)
    }

    pub fn mouse_key(&self, button: MouseButton) -> Option<Key> {
        self.mouse[button.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_combining_marks_limit() {
        let mut g = Glyph::new('e');
        for _ in 0..MAX_CODEPOINTS - 1 {
            assert!(g.push_mark('\u{0301}'));
        }
        assert!(!g.push_mark('\u{0301}'));
        assert_eq!(g.codepoints().len(), MAX_CODEPOINTS);
        assert_eq!(g.base(), 'e');
    }

    #[test]
    fn test_is_combining() {
        assert!(is_combining('\u{0301}'));
        assert!(is_combining('\u{20d7}'));
        assert!(!is_combining('a'));
        assert!(!is_combining('@'));
    }

    #[test]
    fn test_resolution_cache_follows_generation() {
        let mut pairs = PairTable::default();
        pairs.set(1, Color::Red, Color::Black);
        let mut cell = Cell::new(Glyph::new('@'), Attr::empty(), 1);

        assert!(!cell.is_cached(0));
        assert_eq!(cell.resolved(0, &pairs).fg, Color::Red);
        assert!(cell.is_cached(0));

        pairs.set(1, Color::Green, Color::Black);
        // Stale generation keeps the old answer.
        assert_eq!(cell.resolved(0, &pairs).fg, Color::Red);
        assert_eq!(cell.resolved(1, &pairs).fg, Color::Green);
    }

    #[test]
    fn test_equality_ignores_cache() {
        let pairs = PairTable::default();
        let mut a = Cell::new(Glyph::new('x'), Attr::BOLD, 0);
        let b = a;
        a.resolved(7, &pairs);
        assert_eq!(a, b);
    }
}
