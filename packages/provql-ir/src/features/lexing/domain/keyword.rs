//! Reserved words
//!
//! SQL keywords match case-insensitively; type keywords match exactly.
//! Most SQL keywords are reserved without being used by the grammar, so that
//! later grammar growth never turns a valid column name into a keyword.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::fmt;

macro_rules! keywords {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keywords!(Keyword {
    Actor => "ACTOR",
    Add => "ADD",
    All => "ALL",
    Alter => "ALTER",
    And => "AND",
    Any => "ANY",
    As => "AS",
    Asc => "ASC",
    Begin => "BEGIN",
    Between => "BETWEEN",
    By => "BY",
    Cascade => "CASCADE",
    Case => "CASE",
    Cast => "CAST",
    Check => "CHECK",
    Column => "COLUMN",
    Commit => "COMMIT",
    Constraint => "CONSTRAINT",
    Create => "CREATE",
    Cross => "CROSS",
    Database => "DATABASE",
    Default => "DEFAULT",
    Delete => "DELETE",
    Desc => "DESC",
    Distinct => "DISTINCT",
    Drop => "DROP",
    Else => "ELSE",
    End => "END",
    Except => "EXCEPT",
    Exists => "EXISTS",
    Explain => "EXPLAIN",
    Foreign => "FOREIGN",
    From => "FROM",
    Full => "FULL",
    Grant => "GRANT",
    Group => "GROUP",
    Having => "HAVING",
    If => "IF",
    In => "IN",
    Index => "INDEX",
    Inner => "INNER",
    Insert => "INSERT",
    Intersect => "INTERSECT",
    Into => "INTO",
    Is => "IS",
    Join => "JOIN",
    Key => "KEY",
    Left => "LEFT",
    Like => "LIKE",
    Limit => "LIMIT",
    Natural => "NATURAL",
    Normalize => "NORMALIZE",
    Not => "NOT",
    Offset => "OFFSET",
    On => "ON",
    Or => "OR",
    Order => "ORDER",
    Outer => "OUTER",
    Primary => "PRIMARY",
    Provenance => "PROVENANCE",
    Rationale => "RATIONALE",
    References => "REFERENCES",
    Replace => "REPLACE",
    Returning => "RETURNING",
    Revoke => "REVOKE",
    Right => "RIGHT",
    Role => "ROLE",
    Rollback => "ROLLBACK",
    Schema => "SCHEMA",
    Select => "SELECT",
    Set => "SET",
    Table => "TABLE",
    Then => "THEN",
    To => "TO",
    Transaction => "TRANSACTION",
    Truncate => "TRUNCATE",
    Union => "UNION",
    Unique => "UNIQUE",
    Update => "UPDATE",
    Using => "USING",
    Values => "VALUES",
    Verify => "VERIFY",
    View => "VIEW",
    When => "WHEN",
    Where => "WHERE",
    With => "WITH",
});

keywords!(TypeKeyword {
    Nat => "Nat",
    Int => "Int",
    String => "String",
    Bool => "Bool",
    Float => "Float",
    Uuid => "Uuid",
    Timestamp => "Timestamp",
    BoundedNat => "BoundedNat",
    BoundedFloat => "BoundedFloat",
    NonEmptyString => "NonEmptyString",
    Confidence => "Confidence",
    Vector => "Vector",
    PromptScores => "PromptScores",
});

static KEYWORDS: Lazy<FxHashMap<&'static str, Keyword>> =
    Lazy::new(|| Keyword::ALL.iter().map(|k| (k.as_str(), *k)).collect());

static TYPE_KEYWORDS: Lazy<FxHashMap<&'static str, TypeKeyword>> =
    Lazy::new(|| TypeKeyword::ALL.iter().map(|k| (k.as_str(), *k)).collect());

impl Keyword {
    /// Case-insensitive lookup
    pub fn lookup(word: &str) -> Option<Self> {
        if word.len() > 11 || !word.is_ascii() {
            return None;
        }
        KEYWORDS.get(word.to_ascii_uppercase().as_str()).copied()
    }
}

impl TypeKeyword {
    /// Exact-case lookup
    pub fn lookup(word: &str) -> Option<Self> {
        TYPE_KEYWORDS.get(word).copied()
    }
}
