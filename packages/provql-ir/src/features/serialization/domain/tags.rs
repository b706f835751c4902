//! Vendor semantic tags
//!
//! One tag per refinement category, all inside a private range. The mapping
//! is fixed; changing a value breaks every encoded document.

use std::fmt;

pub const VENDOR_TAG_BASE: u64 = 0x5051_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorTag {
    BoundedNat,
    NonEmptyString,
    Confidence,
    PromptScores,
    ProofBlob,
}

impl VendorTag {
    pub const ALL: [VendorTag; 5] = [
        Self::BoundedNat,
        Self::NonEmptyString,
        Self::Confidence,
        Self::PromptScores,
        Self::ProofBlob,
    ];

    pub fn value(&self) -> u64 {
        VENDOR_TAG_BASE
            + match self {
                Self::BoundedNat => 1,
                Self::NonEmptyString => 2,
                Self::Confidence => 3,
                Self::PromptScores => 4,
                Self::ProofBlob => 5,
            }
    }

    pub fn from_value(tag: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.value() == tag)
    }

    /// Name used as the JSON `category` discriminator
    pub fn name(&self) -> &'static str {
        match self {
            Self::BoundedNat => "bounded_nat",
            Self::NonEmptyString => "non_empty_string",
            Self::Confidence => "confidence",
            Self::PromptScores => "prompt_scores",
            Self::ProofBlob => "proof_blob",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn is_vendor_range(tag: u64) -> bool {
        (VENDOR_TAG_BASE..VENDOR_TAG_BASE + 0x1_0000).contains(&tag)
    }
}

impl fmt::Display for VendorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#x})", self.name(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_tags_are_bijective() {
        let values: FxHashSet<u64> = VendorTag::ALL.iter().map(VendorTag::value).collect();
        let names: FxHashSet<&str> = VendorTag::ALL.iter().map(VendorTag::name).collect();
        assert_eq!(values.len(), 5);
        assert_eq!(names.len(), 5);
        for tag in VendorTag::ALL {
            assert_eq!(VendorTag::from_value(tag.value()), Some(tag));
            assert_eq!(VendorTag::from_name(tag.name()), Some(tag));
            assert!(VendorTag::is_vendor_range(tag.value()));
        }
        assert_eq!(VendorTag::BoundedNat.value(), 0x5051_0001);
        assert_eq!(VendorTag::from_value(0x5051_0006), None);
    }
}
