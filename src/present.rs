//! Display projections of the collection
//!
//! Both the iced widgets and the HTML export render from these, so the grid
//! and the detail view look the same wherever they are shown. Projections
//! borrow from the coins and hold no state of their own.

use crate::state::data::{Coin, CoinId, MeshPayload};

/// Shown in place of a blank optional field
pub const UNKNOWN: &str = "Unknown";

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        UNKNOWN
    } else {
        value
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// The image a card leads with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thumbnail<'a> {
    /// Data URL of the coin's first photograph
    Image(&'a str),
    Placeholder,
}

/// One coin's summary in the grid
#[derive(Debug, Clone, PartialEq)]
pub struct Card<'a> {
    pub id: CoinId,
    pub name: &'a str,
    pub date: &'a str,
    pub origin: &'a str,
    pub ruler: &'a str,
    pub thumbnail: Thumbnail<'a>,
    /// Number of photographs, only when there is more than one
    pub image_count: Option<usize>,
    /// Whether the 3D badge is shown
    pub has_model: bool,
}

impl<'a> Card<'a> {
    pub fn project(coin: &'a Coin) -> Self {
        Self {
            id: coin.id,
            name: &coin.name,
            date: &coin.date,
            origin: or_unknown(&coin.origin),
            ruler: or_unknown(&coin.ruler),
            thumbnail: coin
                .thumbnail()
                .map_or(Thumbnail::Placeholder, Thumbnail::Image),
            image_count: (coin.images.len() > 1).then_some(coin.images.len()),
            has_model: coin.model_3d.is_some(),
        }
    }
}

/// The grid, or the empty state when nothing is displayed
#[derive(Debug, Clone, PartialEq)]
pub enum Gallery<'a> {
    Empty,
    Cards(Vec<Card<'a>>),
}

impl<'a> Gallery<'a> {
    pub fn project(coins: &[&'a Coin]) -> Self {
        if coins.is_empty() {
            Gallery::Empty
        } else {
            Gallery::Cards(coins.iter().map(|&coin| Card::project(coin)).collect())
        }
    }
}

/// Everything the detail view shows for one coin
#[derive(Debug, Clone, PartialEq)]
pub struct Detail<'a> {
    pub id: CoinId,
    pub name: &'a str,
    pub date: &'a str,
    pub origin: &'a str,
    pub ruler: &'a str,
    material: &'a str,
    weight: &'a str,
    diameter: &'a str,
    pub description: Option<&'a str>,
    pub obverse: Option<&'a str>,
    pub reverse: Option<&'a str>,
    /// Data URLs of every photograph, in upload order
    pub images: &'a [String],
    /// Where the 3D preview mounts, if a model is attached
    pub model: Option<&'a MeshPayload>,
}

impl<'a> Detail<'a> {
    pub fn project(coin: &'a Coin) -> Self {
        Self {
            id: coin.id,
            name: &coin.name,
            date: &coin.date,
            origin: or_unknown(&coin.origin),
            ruler: or_unknown(&coin.ruler),
            material: or_unknown(&coin.material),
            weight: or_unknown(&coin.weight),
            diameter: or_unknown(&coin.diameter),
            description: non_empty(&coin.description),
            obverse: non_empty(&coin.obverse),
            reverse: non_empty(&coin.reverse),
            images: &coin.images,
            model: coin.model_3d.as_ref(),
        }
    }

    /// Labelled rows for the "Physical details" section
    pub fn physical_details(&self) -> [(&'static str, &'a str); 5] {
        [
            ("Origin", self.origin),
            ("Ruler", self.ruler),
            ("Material", self.material),
            ("Weight", self.weight),
            ("Diameter", self.diameter),
        ]
    }

    /// Obverse and reverse descriptions that were filled in
    pub fn faces(&self) -> Vec<(&'static str, &'a str)> {
        [("Obverse", self.obverse), ("Reverse", self.reverse)]
            .into_iter()
            .filter_map(|(label, text)| text.map(|text| (label, text)))
            .collect()
    }
}
