#![allow(missing_docs)]

use std::collections::BTreeMap;

use wirepack::{Compatible, Decode, Encode, Shape};

#[derive(Debug, Clone, PartialEq, Shape, Encode, Decode)]
pub struct Order {
    pub id: u64,
    pub customer: u32,
    pub price: f64,
    pub symbol: String,
    pub fills: Vec<Fill>,
    pub attributes: BTreeMap<String, String>,
    pub venue: Compatible<String, 1>,
}

#[derive(Debug, Clone, Copy, PartialEq, Shape, Encode, Decode)]
pub struct Fill {
    pub quantity: u32,
    pub price: f64,
    pub timestamp: u64,
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_order(fills: usize) -> Order {
    Order {
        id: 1_000_042,
        customer: 7,
        price: 101.25,
        symbol: "WPK".to_owned(),
        fills: (0..fills)
            .map(|i| Fill {
                quantity: 10,
                price: 100.0 + i as f64,
                timestamp: 1_700_000_000 + i as u64,
            })
            .collect(),
        attributes: [("desk".to_owned(), "rates".to_owned())].into_iter().collect(),
        venue: Compatible::new("XLON".to_owned()),
    }
}
