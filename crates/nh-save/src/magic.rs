//! Section tags
//!
//! Each structured section starts with four ASCII bytes read as a
//! little-endian `u32`. A mismatch means the reader has lost its place in
//! the stream.

/// A section tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magic(pub u32);

impl Magic {
    const fn tag(bytes: &[u8; 4]) -> Self {
        Magic(u32::from_le_bytes(*bytes))
    }

    pub const LEVL: Magic = Magic::tag(b"LEVL");
    pub const STAT: Magic = Magic::tag(b"STAT");
    pub const OBJ: Magic = Magic::tag(b"OBJ\0");
    pub const MON: Magic = Magic::tag(b"MON\0");
    pub const OCHN: Magic = Magic::tag(b"OCHN");
    pub const MCHN: Magic = Magic::tag(b"MCHN");
    pub const FRCH: Magic = Magic::tag(b"FRCH");
    pub const TRPS: Magic = Magic::tag(b"TRPS");
    pub const REGI: Magic = Magic::tag(b"REGI");
    pub const RDAT: Magic = Magic::tag(b"RDAT");
    pub const OCLL: Magic = Magic::tag(b"OCLL");
    pub const ENGR: Magic = Magic::tag(b"ENGR");
    pub const TIMR: Magic = Magic::tag(b"TIMR");
    pub const LITE: Magic = Magic::tag(b"LITE");
    pub const ROOM: Magic = Magic::tag(b"ROOM");
    pub const STRS: Magic = Magic::tag(b"STRS");
    pub const WORM: Magic = Magic::tag(b"WORM");
    pub const DMGE: Magic = Magic::tag(b"DMGE");
    pub const DUNG: Magic = Magic::tag(b"DUNG");
    pub const SPLV: Magic = Magic::tag(b"SPLV");
    pub const PLYR: Magic = Magic::tag(b"PLYR");
    pub const INVT: Magic = Magic::tag(b"INVT");
    pub const MMIG: Magic = Magic::tag(b"MMIG");
    pub const MVIT: Magic = Magic::tag(b"MVIT");
    pub const SPEL: Magic = Magic::tag(b"SPEL");
    pub const ARTI: Magic = Magic::tag(b"ARTI");
    pub const RNGS: Magic = Magic::tag(b"RNGS");
    pub const MSGS: Magic = Magic::tag(b"MSGS");
    pub const BONE: Magic = Magic::tag(b"BONE");

    /// Printable tag, with the trailing NUL of `OBJ\0`/`MON\0` dropped
    pub fn name(self) -> &'static str {
        const ALL: &[(Magic, &str)] = &[
            (Magic::LEVL, "LEVL"),
            (Magic::STAT, "STAT"),
            (Magic::OBJ, "OBJ"),
            (Magic::MON, "MON"),
            (Magic::OCHN, "OCHN"),
            (Magic::MCHN, "MCHN"),
            (Magic::FRCH, "FRCH"),
            (Magic::TRPS, "TRPS"),
            (Magic::REGI, "REGI"),
            (Magic::RDAT, "RDAT"),
            (Magic::OCLL, "OCLL"),
            (Magic::ENGR, "ENGR"),
            (Magic::TIMR, "TIMR"),
            (Magic::LITE, "LITE"),
            (Magic::ROOM, "ROOM"),
            (Magic::STRS, "STRS"),
            (Magic::WORM, "WORM"),
            (Magic::DMGE, "DMGE"),
            (Magic::DUNG, "DUNG"),
            (Magic::SPLV, "SPLV"),
            (Magic::PLYR, "PLYR"),
            (Magic::INVT, "INVT"),
            (Magic::MMIG, "MMIG"),
            (Magic::MVIT, "MVIT"),
            (Magic::SPEL, "SPEL"),
            (Magic::ARTI, "ARTI"),
            (Magic::RNGS, "RNGS"),
            (Magic::MSGS, "MSGS"),
            (Magic::BONE, "BONE"),
        ];
        ALL.iter()
            .find(|(m, _)| *m == self)
            .map(|(_, name)| *name)
            .unwrap_or("????")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_little_endian_ascii() {
        assert_eq!(Magic::LEVL.0.to_le_bytes(), *b"LEVL");
        assert_eq!(Magic::OBJ.0, 0x004a_424f);
        assert_eq!(Magic::MON.name(), "MON");
        assert_eq!(Magic(0).name(), "????");
    }
}
