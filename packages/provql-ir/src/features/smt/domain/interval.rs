//! Intervals over ordered scalars
//!
//! Used to decide bound refinements (`BoundedNat`, `BoundedFloat`,
//! `Confidence`, string length, vector length) and to detect comparisons a
//! refinement makes unsatisfiable.

use std::fmt;

/// Interval `[lower, upper]`; `None` is unbounded, `*_open` excludes the bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    pub lower: Option<T>,
    pub upper: Option<T>,
    pub lower_open: bool,
    pub upper_open: bool,
}

/// Comparison against a constant, as it appears in `column op constant`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn unbounded() -> Self {
        Self {
            lower: None,
            upper: None,
            lower_open: true,
            upper_open: true,
        }
    }

    /// Closed interval `[lower, upper]`
    pub fn bounded(lower: T, upper: T) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
            lower_open: false,
            upper_open: false,
        }
    }

    pub fn exactly(value: T) -> Self {
        Self::bounded(value, value)
    }

    pub fn lower_bounded(lower: T, open: bool) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
            lower_open: open,
            upper_open: true,
        }
    }

    pub fn upper_bounded(upper: T, open: bool) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
            lower_open: true,
            upper_open: open,
        }
    }

    /// Values satisfying `x op value`
    pub fn from_comparison(op: Comparison, value: T) -> Self {
        match op {
            Comparison::Eq => Self::exactly(value),
            Comparison::Lt => Self::upper_bounded(value, true),
            Comparison::Le => Self::upper_bounded(value, false),
            Comparison::Gt => Self::lower_bounded(value, true),
            Comparison::Ge => Self::lower_bounded(value, false),
        }
    }

    /// No value satisfies the interval
    pub fn is_empty(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(l), Some(u)) => {
                if self.lower_open || self.upper_open {
                    l >= u
                } else {
                    l > u
                }
            }
            _ => false,
        }
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let (lower, lower_open) = match (self.lower, other.lower) {
            (None, None) => (None, true),
            (None, Some(l)) => (Some(l), other.lower_open),
            (Some(l), None) => (Some(l), self.lower_open),
            (Some(l1), Some(l2)) => {
                if l1 > l2 {
                    (Some(l1), self.lower_open)
                } else if l1 < l2 {
                    (Some(l2), other.lower_open)
                } else {
                    (Some(l1), self.lower_open || other.lower_open)
                }
            }
        };

        let (upper, upper_open) = match (self.upper, other.upper) {
            (None, None) => (None, true),
            (None, Some(u)) => (Some(u), other.upper_open),
            (Some(u), None) => (Some(u), self.upper_open),
            (Some(u1), Some(u2)) => {
                if u1 < u2 {
                    (Some(u1), self.upper_open)
                } else if u1 > u2 {
                    (Some(u2), other.upper_open)
                } else {
                    (Some(u1), self.upper_open || other.upper_open)
                }
            }
        };

        Self {
            lower,
            upper,
            lower_open,
            upper_open,
        }
    }

    pub fn contains(&self, value: T) -> bool {
        let lower_ok = match self.lower {
            None => true,
            Some(l) if self.lower_open => value > l,
            Some(l) => value >= l,
        };
        let upper_ok = match self.upper {
            None => true,
            Some(u) if self.upper_open => value < u,
            Some(u) => value <= u,
        };
        lower_ok && upper_ok
    }

    /// Whether `value` lies below the interval (as opposed to above it)
    pub fn is_below(&self, value: T) -> bool {
        match self.lower {
            None => false,
            Some(l) if self.lower_open => value <= l,
            Some(l) => value < l,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Some(l) => write!(f, "{}{}", if self.lower_open { "(" } else { "[" }, l)?,
            None => f.write_str("(-inf")?,
        }
        f.write_str(", ")?;
        match &self.upper {
            Some(u) => write!(f, "{}{}", u, if self.upper_open { ")" } else { "]" }),
            None => f.write_str("+inf)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_is_below() {
        let i = Interval::bounded(0u64, 100);
        assert!(i.contains(0) && i.contains(100));
        assert!(!i.contains(150));
        assert!(!i.is_below(150));
        assert!(Interval::bounded(5u64, 9).is_below(3));
    }

    #[test]
    fn test_intersect_detects_contradiction() {
        let refinement = Interval::bounded(0u64, 100);
        let predicate = Interval::from_comparison(Comparison::Gt, 100);
        assert!(refinement.intersect(&predicate).is_empty());
        let predicate = Interval::from_comparison(Comparison::Ge, 100);
        assert!(!refinement.intersect(&predicate).is_empty());
    }

    #[test]
    fn test_empty_when_bounds_cross() {
        assert!(Interval::bounded(10u64, 5).is_empty());
        assert!(Interval::bounded(1.0f64, 1.0).contains(1.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::bounded(0u64, 100).to_string(), "[0, 100]");
        assert_eq!(Interval::lower_bounded(1usize, false).to_string(), "[1, +inf)");
    }
}
