//! # Subscription registry
//!
//! Keyed store of subscribed channels (or channel groups) with per-item
//! callback routing and connection state.

use crate::core::ResponseSink;
use spin::RwLock;
use std::collections::BTreeMap;

/// Presence channel suffix.
pub(crate) const PRESENCE_SUFFIX: &str = "-pnpres";

/// Name of presence channel for provided channel.
pub(crate) fn presence_name(name: &str) -> String {
    if is_presence(name) {
        name.to_string()
    } else {
        format!("{name}{PRESENCE_SUFFIX}")
    }
}

/// Whether `name` is presence channel name.
pub(crate) fn is_presence(name: &str) -> bool {
    name.ends_with(PRESENCE_SUFFIX)
}

/// Channel name with presence suffix removed.
pub(crate) fn strip_presence(name: &str) -> &str {
    name.strip_suffix(PRESENCE_SUFFIX).unwrap_or(name)
}

/// Subscribed channel or channel group.
#[derive(Debug, Clone)]
pub(crate) struct SubscriptionItem {
    /// Channel or channel group name.
    pub name: String,

    /// Whether `Connected` event already has been delivered.
    pub connected: bool,

    /// Marked for removal by `abort`, swept by `apply_abort`.
    pub aborted: bool,

    /// Sink for messages and life-cycle events.
    pub success: ResponseSink,

    /// Sink for errors.
    pub error: ResponseSink,
}

/// Thread-safe subscription registry.
///
/// Items marked by [`abort`] are invisible to every read, but stay in the
/// map until the subscribe loop sweeps them at a safe point with
/// [`apply_abort`].
///
/// [`abort`]: SubscriptionRegistry::abort
/// [`apply_abort`]: SubscriptionRegistry::apply_abort
#[derive(Debug, Default)]
pub(crate) struct SubscriptionRegistry {
    items: RwLock<BTreeMap<String, SubscriptionItem>>,
}

impl SubscriptionRegistry {
    /// Add item which still should receive `Connected` event.
    ///
    /// Replaces any previous item with the same name.
    pub fn add(&self, name: &str, success: ResponseSink, error: ResponseSink) {
        self.insert(name, success, error, false)
    }

    /// Add item which is considered connected already.
    ///
    /// Used when subscription resumes from caller provided token.
    pub fn add_connected(&self, name: &str, success: ResponseSink, error: ResponseSink) {
        self.insert(name, success, error, true)
    }

    fn insert(&self, name: &str, success: ResponseSink, error: ResponseSink, connected: bool) {
        self.items.write().insert(
            name.to_string(),
            SubscriptionItem {
                name: name.to_string(),
                connected,
                aborted: false,
                success,
                error,
            },
        );
    }

    /// Remove item.
    ///
    /// Returns removed item unless it was missing or marked for removal.
    pub fn remove(&self, name: &str) -> Option<SubscriptionItem> {
        self.items
            .write()
            .remove(name)
            .filter(|item| !item.aborted)
    }

    /// Whether there is live item with specified name.
    pub fn exists(&self, name: &str) -> bool {
        self.items
            .read()
            .get(name)
            .map_or(false, |item| !item.aborted)
    }

    /// Live item with specified name.
    pub fn get(&self, name: &str) -> Option<SubscriptionItem> {
        self.items
            .read()
            .get(name)
            .filter(|item| !item.aborted)
            .cloned()
    }

    /// Whether there are no live items.
    pub fn is_empty(&self) -> bool {
        self.items.read().values().all(|item| item.aborted)
    }

    /// Number of live items.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.read().values().filter(|item| !item.aborted).count()
    }

    /// Names of live items in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.items
            .read()
            .values()
            .filter(|item| !item.aborted)
            .map(|item| item.name.clone())
            .collect()
    }

    /// Names of live items which already received `Connected` event.
    #[cfg(test)]
    pub fn connected_names(&self) -> Vec<String> {
        self.items
            .read()
            .values()
            .filter(|item| !item.aborted && item.connected)
            .map(|item| item.name.clone())
            .collect()
    }

    /// Snapshot of live items.
    pub fn items(&self) -> Vec<SubscriptionItem> {
        self.items
            .read()
            .values()
            .filter(|item| !item.aborted)
            .cloned()
            .collect()
    }

    /// Mark live items listed in `names` as connected.
    ///
    /// Returns only items which flipped to connected with this call, so
    /// repeated calls never report the same item twice. Items which aren't
    /// listed stay untouched.
    pub fn set_connected_for(&self, names: &[String]) -> Vec<SubscriptionItem> {
        let mut items = self.items.write();

        let mut flipped = Vec::new();
        for name in names {
            if let Some(item) = items.get_mut(name) {
                if !item.aborted && !item.connected {
                    item.connected = true;
                    flipped.push(item.clone());
                }
            }
        }
        flipped
    }

    /// Remove all items.
    ///
    /// Returns removed live items.
    pub fn clear(&self) -> Vec<SubscriptionItem> {
        std::mem::take(&mut *self.items.write())
            .into_values()
            .filter(|item| !item.aborted)
            .collect()
    }

    /// Mark all items for removal.
    pub fn abort(&self) {
        self.items
            .write()
            .values_mut()
            .for_each(|item| item.aborted = true);
    }

    /// Remove items marked by [`abort`].
    ///
    /// Returns removed items.
    ///
    /// [`abort`]: SubscriptionRegistry::abort
    pub fn apply_abort(&self) -> Vec<SubscriptionItem> {
        let mut items = self.items.write();
        let aborted = items
            .iter()
            .filter(|(_, item)| item.aborted)
            .map(|(name, _)| name.clone())
            .collect::<Vec<_>>();

        aborted
            .into_iter()
            .filter_map(|name| items.remove(&name))
            .collect()
    }
}

/// Channels and channel groups registries of single client.
#[derive(Debug, Default)]
pub(crate) struct Subscriptions {
    /// Channels, presence channels and wildcard channels.
    pub channels: SubscriptionRegistry,

    /// Channel groups and channel group presence.
    pub groups: SubscriptionRegistry,
}

impl Subscriptions {
    /// Whether both registries have no live items.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.groups.is_empty()
    }

    /// Whether name is used by either registry.
    pub fn exists(&self, name: &str) -> bool {
        self.channels.exists(name) || self.groups.exists(name)
    }

    /// Live items of both registries.
    pub fn items(&self) -> Vec<SubscriptionItem> {
        let mut items = self.channels.items();
        items.extend(self.groups.items());
        items
    }

    pub fn abort(&self) {
        self.channels.abort();
        self.groups.abort();
    }

    pub fn apply_abort(&self) -> Vec<SubscriptionItem> {
        let mut items = self.channels.apply_abort();
        items.extend(self.groups.apply_abort());
        items
    }

    pub fn clear(&self) -> Vec<SubscriptionItem> {
        let mut items = self.channels.clear();
        items.extend(self.groups.clear());
        items
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use proptest::{collection, prelude::*};

    fn sinks() -> (ResponseSink, ResponseSink) {
        (ResponseSink::unbounded().0, ResponseSink::unbounded().0)
    }

    fn registry_with(names: &[&str]) -> SubscriptionRegistry {
        let registry = SubscriptionRegistry::default();
        names.iter().for_each(|name| {
            let (success, error) = sinks();
            registry.add(name, success, error)
        });
        registry
    }

    fn item_names(items: &[SubscriptionItem]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    #[test]
    fn report_newly_connected_items_once() {
        let registry = registry_with(&["a", "b"]);
        let round = registry.names();

        let first = registry.set_connected_for(&round);
        let second = registry.set_connected_for(&round);

        assert_eq!(item_names(&first), vec!["a", "b"]);
        assert!(second.is_empty());
    }

    #[test]
    fn report_only_items_added_after_connect() {
        let registry = registry_with(&["a"]);
        registry.set_connected_for(&registry.names());
        let (success, error) = sinks();
        registry.add("b", success, error);

        let delta = registry.set_connected_for(&registry.names());

        assert_eq!(item_names(&delta), vec!["b"]);
    }

    #[test]
    fn connect_only_listed_items() {
        let registry = registry_with(&["a", "b"]);

        let delta = registry.set_connected_for(&["a".into(), "missing".into()]);

        assert_eq!(item_names(&delta), vec!["a"]);
        assert_eq!(registry.connected_names(), vec!["a".to_string()]);
    }

    #[test]
    fn keep_resumed_items_connected() {
        let registry = SubscriptionRegistry::default();
        let (success, error) = sinks();
        registry.add_connected("a", success, error);

        assert_eq!(registry.connected_names(), vec!["a".to_string()]);
        assert!(registry.set_connected_for(&["a".into()]).is_empty());
    }

    #[test]
    fn remove_only_existing_items() {
        let registry = registry_with(&["a"]);

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn hide_aborted_items_until_swept() {
        let registry = registry_with(&["a", "b"]);

        registry.abort();

        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
        assert!(!registry.exists("a"));
        assert_eq!(registry.len(), 0);
        assert!(registry.set_connected_for(&["a".into()]).is_empty());
        assert_eq!(registry.apply_abort().len(), 2);
        assert!(registry.apply_abort().is_empty());
    }

    #[test]
    fn replace_aborted_item_with_new_subscription() {
        let registry = registry_with(&["a"]);
        registry.abort();
        let (success, error) = sinks();

        registry.add("a", success, error);

        assert!(registry.exists("a"));
        assert!(registry.apply_abort().is_empty());
    }

    #[test]
    fn handle_presence_names() {
        assert_eq!(presence_name("demo"), "demo-pnpres");
        assert_eq!(presence_name("demo-pnpres"), "demo-pnpres");
        assert_eq!(strip_presence("demo-pnpres"), "demo");
        assert_eq!(strip_presence("demo"), "demo");
        assert!(is_presence("demo-pnpres"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(&'static str),
        AddConnected(&'static str),
        Remove(&'static str),
        Connect(Vec<&'static str>),
        Abort,
        Sweep,
    }

    fn name() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["a", "b", "c", "d", "e"])
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            name().prop_map(Op::Add),
            name().prop_map(Op::AddConnected),
            name().prop_map(Op::Remove),
            collection::vec(name(), 0..5).prop_map(Op::Connect),
            Just(Op::Abort),
            Just(Op::Sweep),
        ]
    }

    fn apply(registry: &SubscriptionRegistry, op: Op) {
        let (success, error) = sinks();
        match op {
            Op::Add(name) => registry.add(name, success, error),
            Op::AddConnected(name) => registry.add_connected(name, success, error),
            Op::Remove(name) => {
                registry.remove(name);
            }
            Op::Connect(names) => {
                let names = names.into_iter().map(String::from).collect::<Vec<_>>();
                registry.set_connected_for(&names);
            }
            Op::Abort => registry.abort(),
            Op::Sweep => {
                registry.apply_abort();
            }
        }
    }

    proptest! {
        #[test]
        fn keep_connected_names_subset_of_names(ops in collection::vec(op(), 0..64)) {
            let registry = SubscriptionRegistry::default();

            for op in ops {
                apply(&registry, op);

                let names = registry.names();
                prop_assert!(registry
                    .connected_names()
                    .iter()
                    .all(|connected| names.contains(connected)));
                prop_assert_eq!(names.len(), registry.len());
            }
        }
    }
}
