//! Common fixture types for wirepack integration tests.
//!
//! The `v1`, `v2` and `v3` modules hold successive releases of the same
//! record, each adding a trailing compatible field, so tests can pair any
//! producer with any consumer.

#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]

use std::collections::{BTreeMap, HashSet};

use wirepack::{Compatible, Decode, Encode, Shape};

// ============================================================================
// Versioned records
// ============================================================================

pub mod v1 {
    use super::{Decode, Encode, Shape};

    /// The first release: mandatory fields only.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Shape, Encode, Decode)]
    pub struct Profile {
        pub id: u32,
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Shape, Encode, Decode)]
    pub struct Envelope {
        pub sequence: u64,
        pub profile: Profile,
        pub checksum: u32,
    }
}

pub mod v2 {
    use super::{Compatible, Decode, Encode, Shape};

    /// Adds `email`.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Shape, Encode, Decode)]
    pub struct Profile {
        pub id: u32,
        pub name: String,
        pub email: Compatible<String, 1>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Shape, Encode, Decode)]
    pub struct Envelope {
        pub sequence: u64,
        pub profile: Profile,
        pub checksum: u32,
    }
}

pub mod v3 {
    use super::{Compatible, Decode, Encode, Shape};

    /// Adds `phone` after `email`.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Shape, Encode, Decode)]
    pub struct Profile {
        pub id: u32,
        pub name: String,
        pub email: Compatible<String, 1>,
        pub phone: Compatible<u64, 2>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Shape, Encode, Decode)]
    pub struct Envelope {
        pub sequence: u64,
        pub profile: Profile,
        pub checksum: u32,
    }
}

// ============================================================================
// Scenario records
// ============================================================================

/// Integer first.
#[derive(Debug, Clone, PartialEq, Eq, Shape, Encode, Decode)]
pub struct IdFirst {
    pub id: u32,
    pub name: String,
}

/// Text first.
#[derive(Debug, Clone, PartialEq, Eq, Shape, Encode, Decode)]
pub struct NameFirst {
    pub name: String,
    pub id: u32,
}

// ============================================================================
// Mixed shapes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Shape, Encode, Decode)]
pub enum Figure {
    Empty,
    Circle { radius: f64 },
    Rect(f32, f32),
}

#[derive(Debug, Clone, PartialEq, Eq, Shape, Encode, Decode)]
pub struct Pair<A, B>(pub A, pub B);

#[derive(Debug, Clone, PartialEq, Shape, Encode, Decode)]
pub struct Inventory {
    pub owner: Option<String>,
    pub figures: Vec<Figure>,
    pub counts: BTreeMap<String, u64>,
    pub flags: HashSet<char>,
    pub grid: [[u8; 3]; 2],
    pub ranges: Vec<Pair<i128, u128>>,
    pub outcome: Result<u16, String>,
    #[wirepack(skip)]
    pub cache: Vec<u8>,
    pub note: Compatible<String, 1>,
}

impl Inventory {
    pub fn sample() -> Self {
        Self {
            owner: Some("ops".to_owned()),
            figures: vec![
                Figure::Empty,
                Figure::Circle { radius: 1.5 },
                Figure::Rect(2.0, -3.0),
            ],
            counts: [("bolts".to_owned(), 12), ("nuts".to_owned(), 0)]
                .into_iter()
                .collect(),
            flags: ['x', 'ß', '🦀'].into_iter().collect(),
            grid: [[1, 2, 3], [4, 5, 6]],
            ranges: vec![Pair(i128::MIN, u128::MAX), Pair(0, 1)],
            outcome: Err("pending".to_owned()),
            cache: Vec::new(),
            note: Compatible::new("restocked".to_owned()),
        }
    }
}

/// A large record for concurrency tests.
#[derive(Debug, Clone, PartialEq, Eq, Shape, Encode, Decode)]
pub struct Telemetry {
    pub host: String,
    pub samples: Vec<u32>,
    pub window: (u64, u64),
    pub labels: BTreeMap<String, String>,
    pub region: Compatible<String, 3>,
}

impl Telemetry {
    pub fn new(seed: u32) -> Self {
        Self {
            host: format!("host-{seed}"),
            samples: (0..seed % 17).map(|i| i.wrapping_mul(seed)).collect(),
            window: (u64::from(seed), u64::from(seed) + 60),
            labels: [("rack".to_owned(), (seed % 4).to_string())]
                .into_iter()
                .collect(),
            region: if seed % 2 == 0 {
                Compatible::new("eu".to_owned())
            } else {
                Compatible::absent()
            },
        }
    }
}
