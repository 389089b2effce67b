//! The collection controller
//!
//! Owns the in-memory list of coins together with the library it is mirrored
//! to. Every mutation persists the whole list before returning, so a restart
//! never loses a committed change.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use tracing::info;

use super::data::{Coin, CoinId, NewCoin};
use super::library::{Library, LibraryError};

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("The coin's {0} is required")]
    MissingField(&'static str),

    #[error("Failed to save collection: {0}")]
    Library(#[from] LibraryError),
}

/// Display orders offered by the sort selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Most recently added first
    #[default]
    Newest,
    /// Earliest added first
    Oldest,
    /// Alphabetical by name
    Name,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Newest, SortOrder::Oldest, SortOrder::Name];
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Newest => "Newest first",
            SortOrder::Oldest => "Oldest first",
            SortOrder::Name => "Name (A-Z)",
        })
    }
}

/// Confirmation token for a pending deletion.
///
/// Only the collection hands these out, and only for coins that exist.
/// Dropping the token declines the deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    id: CoinId,
    name: String,
}

impl DeleteRequest {
    pub fn id(&self) -> CoinId {
        self.id
    }

    /// Name of the coin, for the confirmation prompt
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The in-memory collection, mirrored to its library after every mutation
#[derive(Debug)]
pub struct Collection {
    /// Always in insertion order, which is the order that gets stored
    coins: Vec<Coin>,
    /// Display order picked by the user, if any
    order: Option<SortOrder>,
    library: Library,
    /// Highest id handed out so far
    last_id: CoinId,
}

impl Collection {
    /// Load the stored collection in its stored (insertion) order
    pub fn load(library: Library) -> Result<Self, LibraryError> {
        let coins = library.load()?;
        let last_id = coins.iter().map(|coin| coin.id).max().unwrap_or(0);
        info!("🪙 Collection loaded with {} coins", coins.len());

        Ok(Self {
            coins,
            order: None,
            library,
            last_id,
        })
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Coins in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter()
    }

    pub fn get(&self, id: CoinId) -> Option<&Coin> {
        self.coins.iter().find(|coin| coin.id == id)
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Add a new coin and persist the collection
    pub fn add(&mut self, new_coin: NewCoin) -> Result<&Coin, CollectionError> {
        self.add_at(new_coin, Utc::now())
    }

    fn add_at(&mut self, new_coin: NewCoin, now: DateTime<Utc>) -> Result<&Coin, CollectionError> {
        if let Some(field) = new_coin.missing_field() {
            return Err(CollectionError::MissingField(field));
        }

        let id = self.next_id(now);
        self.coins.push(new_coin.into_coin(id, now));

        if let Err(e) = self.library.save(&self.coins) {
            // Keep memory and storage reconciled
            self.coins.pop();
            return Err(e.into());
        }

        let coin = &self.coins[self.coins.len() - 1];
        info!("Added coin {} ({})", coin.id, coin.name);
        Ok(coin)
    }

    /// Ids are creation timestamps in milliseconds, bumped past the last id
    /// when the clock hasn't moved on
    fn next_id(&mut self, now: DateTime<Utc>) -> CoinId {
        let id = now.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }

    /// Ask to delete a coin. Returns `None` if no coin has that id.
    pub fn request_delete(&self, id: CoinId) -> Option<DeleteRequest> {
        self.get(id).map(|coin| DeleteRequest {
            id: coin.id,
            name: coin.name.clone(),
        })
    }

    /// Delete a confirmed coin and persist the collection.
    ///
    /// Returns the removed coin, or `None` if it was already gone.
    pub fn confirm_delete(&mut self, request: DeleteRequest) -> Result<Option<Coin>, CollectionError> {
        let Some(index) = self.coins.iter().position(|coin| coin.id == request.id) else {
            return Ok(None);
        };

        let coin = self.coins.remove(index);
        if let Err(e) = self.library.save(&self.coins) {
            self.coins.insert(index, coin);
            return Err(e.into());
        }

        info!("Deleted coin {} ({})", coin.id, coin.name);
        Ok(Some(coin))
    }

    /// Coins matching `term`, case-insensitively, in any searchable field,
    /// in display order.
    ///
    /// An empty term matches everything.
    pub fn filter(&self, term: &str) -> Vec<&Coin> {
        let needle = term.to_lowercase();
        let mut matches: Vec<&Coin> = self
            .coins
            .iter()
            .filter(|coin| {
                term.is_empty()
                    || coin
                        .searchable_fields()
                        .iter()
                        .filter(|field| !field.is_empty())
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect();

        if let Some(order) = self.order {
            sort_coins(&mut matches, order);
        }
        matches
    }

    /// Change the display order. Storage keeps insertion order and the
    /// choice is forgotten on restart.
    pub fn sort(&mut self, order: SortOrder) {
        self.order = Some(order);
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.order
    }
}

/// Stable sort, so coins that compare equal keep their insertion order
fn sort_coins(coins: &mut [&Coin], order: SortOrder) {
    match order {
        SortOrder::Newest => coins.sort_by(|a, b| b.added_date.cmp(&a.added_date)),
        SortOrder::Oldest => coins.sort_by(|a, b| a.added_date.cmp(&b.added_date)),
        SortOrder::Name => coins.sort_by(|a, b| compare_names(&a.name, &b.name)),
    }
}

/// Case-folded comparison, falling back to the raw strings so the order is total
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn new_coin(name: &str, date: &str) -> NewCoin {
        NewCoin {
            name: name.to_string(),
            date: date.to_string(),
            ..Default::default()
        }
    }

    fn empty_collection() -> Collection {
        Collection::load(Library::in_memory().unwrap()).unwrap()
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn names(coins: &[&Coin]) -> Vec<String> {
        coins.iter().map(|coin| coin.name.clone()).collect()
    }

    fn reload(collection: &Collection) -> Vec<Coin> {
        collection.library().load().unwrap()
    }

    #[test]
    fn test_denarius_scenario() {
        let mut collection = empty_collection();

        let id = collection.add(new_coin("Denarius", "100 BC")).unwrap().id;
        assert_eq!(collection.len(), 1);
        assert!(collection.get(id).unwrap().images.is_empty());

        let request = collection.request_delete(id).unwrap();
        assert_eq!(request.name(), "Denarius");
        collection.confirm_delete(request).unwrap();

        assert!(collection.is_empty());
        assert!(collection.filter("").is_empty());
        assert!(reload(&collection).is_empty());
    }

    #[test]
    fn test_add_requires_name_and_date() {
        let mut collection = empty_collection();

        let result = collection.add(new_coin("", "100 BC"));
        assert!(matches!(result, Err(CollectionError::MissingField("name"))));

        let result = collection.add(new_coin("As", "  "));
        assert!(matches!(result, Err(CollectionError::MissingField("date"))));

        assert!(collection.is_empty());
    }

    #[test]
    fn test_ids_are_unique_within_the_same_instant() {
        let mut collection = empty_collection();
        let now = epoch();

        let first = collection.add_at(new_coin("A", "1"), now).unwrap().id;
        let second = collection.add_at(new_coin("B", "2"), now).unwrap().id;
        let third = collection.add_at(new_coin("C", "3"), now).unwrap().id;

        assert_eq!(first, now.timestamp_millis());
        assert!(first < second && second < third);
    }

    #[test]
    fn test_ids_continue_after_reload() {
        let library = Library::in_memory().unwrap();
        let stored = new_coin("Stater", "300 BC").into_coin(i64::MAX / 2, epoch());
        library.save(&[stored]).unwrap();

        let mut collection = Collection::load(library).unwrap();
        let id = collection.add_at(new_coin("Obol", "400 BC"), epoch()).unwrap().id;
        assert_eq!(id, i64::MAX / 2 + 1);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let mut collection = empty_collection();
        let a = collection.add_at(new_coin("A", "1"), epoch()).unwrap().id;
        collection.add_at(new_coin("B", "2"), epoch()).unwrap();
        assert_eq!(reload(&collection), collection.iter().cloned().collect::<Vec<_>>());

        let request = collection.request_delete(a).unwrap();
        collection.confirm_delete(request).unwrap();
        let stored = reload(&collection);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "B");
    }

    #[test]
    fn test_replaying_operations_is_deterministic() {
        let now = epoch();
        let run = || {
            let mut collection = empty_collection();
            let a = collection.add_at(new_coin("A", "1"), now).unwrap().id;
            collection.add_at(new_coin("B", "2"), now).unwrap();
            let request = collection.request_delete(a).unwrap();
            collection.confirm_delete(request).unwrap();
            collection.add_at(new_coin("C", "3"), now).unwrap();
            collection.iter().cloned().collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_delete_unknown_id_is_a_no_op() {
        let mut collection = empty_collection();
        let id = collection.add(new_coin("Follis", "300 AD")).unwrap().id;

        assert!(collection.request_delete(id + 1000).is_none());

        // A token for a coin that is already gone changes nothing either
        let request = collection.request_delete(id).unwrap();
        collection.confirm_delete(request.clone()).unwrap();
        assert_eq!(collection.confirm_delete(request).unwrap(), None);
        assert!(collection.is_empty());
    }

    #[test]
    fn test_declining_leaves_collection_unchanged() {
        let mut collection = empty_collection();
        let id = collection.add(new_coin("Siliqua", "360 AD")).unwrap().id;

        let request = collection.request_delete(id);
        drop(request);

        assert_eq!(collection.len(), 1);
        assert_eq!(reload(&collection).len(), 1);
    }

    #[test]
    fn test_filter_matches_searchable_fields() {
        let mut collection = empty_collection();
        let mut roman = new_coin("Denarius", "100 BC");
        roman.origin = "Rome".to_string();
        roman.ruler = "Julius Caesar".to_string();
        roman.material = "Silver".to_string();
        collection.add(roman).unwrap();

        let mut greek = new_coin("Tetradrachm", "450 BC");
        greek.description = "Owl of ATHENA on the reverse".to_string();
        collection.add(greek).unwrap();

        assert_eq!(collection.filter("").len(), 2);
        assert_eq!(names(&collection.filter("rome")), vec!["Denarius"]);
        assert_eq!(names(&collection.filter("CAESAR")), vec!["Denarius"]);
        assert_eq!(names(&collection.filter("athena")), vec!["Tetradrachm"]);
        assert_eq!(collection.filter("bc").len(), 2);

        // Material isn't a searchable field
        assert!(collection.filter("silver").is_empty());

        // Filtering never reorders or removes anything
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_filter_empty_collection() {
        let collection = empty_collection();
        assert!(collection.filter("anything").is_empty());
        assert!(collection.filter("").is_empty());
    }

    #[test]
    fn test_sort_by_added_date() {
        let mut collection = empty_collection();
        let start = epoch();
        collection.add_at(new_coin("Middle", "2"), start + Duration::days(1)).unwrap();
        collection.add_at(new_coin("First", "1"), start).unwrap();
        collection.add_at(new_coin("Last", "3"), start + Duration::days(2)).unwrap();

        collection.sort(SortOrder::Newest);
        assert_eq!(names(&collection.filter("")), vec!["Last", "Middle", "First"]);

        collection.sort(SortOrder::Oldest);
        assert_eq!(names(&collection.filter("")), vec!["First", "Middle", "Last"]);

        // Sorting is display-only: storage keeps insertion order
        let stored: Vec<String> = reload(&collection).into_iter().map(|c| c.name).collect();
        assert_eq!(stored, vec!["Middle", "First", "Last"]);
    }

    #[test]
    fn test_sorting_never_changes_stored_order() {
        let mut collection = empty_collection();
        let start = epoch();
        collection.add_at(new_coin("Zeta", "1"), start).unwrap();
        let alpha = collection.add_at(new_coin("Alpha", "2"), start + Duration::days(1)).unwrap().id;

        collection.sort(SortOrder::Name);
        collection.add_at(new_coin("Mu", "3"), start + Duration::days(2)).unwrap();
        assert_eq!(names(&collection.filter("")), vec!["Alpha", "Mu", "Zeta"]);

        let stored: Vec<String> = reload(&collection).into_iter().map(|c| c.name).collect();
        assert_eq!(stored, vec!["Zeta", "Alpha", "Mu"]);

        let request = collection.request_delete(alpha).unwrap();
        collection.confirm_delete(request).unwrap();
        assert_eq!(names(&collection.filter("")), vec!["Mu", "Zeta"]);

        let stored: Vec<String> = reload(&collection).into_iter().map(|c| c.name).collect();
        assert_eq!(stored, vec!["Zeta", "Mu"]);
    }

    #[test]
    fn test_sort_applies_to_filtered_results() {
        let mut collection = empty_collection();
        for name in ["Tetradrachm", "Drachm", "Denarius"] {
            collection.add(new_coin(name, "x")).unwrap();
        }

        collection.sort(SortOrder::Name);
        assert_eq!(names(&collection.filter("dr")), vec!["Drachm", "Tetradrachm"]);
        assert_eq!(collection.sort_order(), Some(SortOrder::Name));
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let mut collection = empty_collection();
        let now = epoch();
        for name in ["one", "two", "three"] {
            collection.add_at(new_coin(name, "x"), now).unwrap();
        }

        collection.sort(SortOrder::Newest);
        assert_eq!(names(&collection.filter("")), vec!["one", "two", "three"]);
        collection.sort(SortOrder::Oldest);
        assert_eq!(names(&collection.filter("")), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let mut collection = empty_collection();
        for name in ["solidus", "Aureus", "denarius", "As"] {
            collection.add(new_coin(name, "x")).unwrap();
        }

        collection.sort(SortOrder::Name);
        let sorted = names(&collection.filter(""));
        assert_eq!(sorted, vec!["As", "Aureus", "denarius", "solidus"]);

        for pair in sorted.windows(2) {
            assert_ne!(compare_names(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_sort_empty_collection() {
        let mut collection = empty_collection();
        collection.sort(SortOrder::Name);
        assert!(collection.is_empty());
    }

    #[test]
    fn test_sort_order_labels() {
        assert_eq!(SortOrder::ALL.len(), 3);
        assert_eq!(SortOrder::default(), SortOrder::Newest);
        assert_eq!(SortOrder::Name.to_string(), "Name (A-Z)");
    }
}
