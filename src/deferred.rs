//! Deferred actions: one-shot instructions carried across a navigation.
//!
//! An instruction travels as a plain-text query marker on the route
//! (`/disease?camera=true`). The destination view consumes it once while
//! mounting. Consumption is keyed by the route's navigation id, so a
//! remount of the same route without a fresh navigation yields nothing.

use std::collections::BTreeMap;

use crate::model::{Route, ViewId};

/// A one-shot instruction for the destination view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Open the capture device as soon as the view mounts.
    AutoOpenCapture,
}

impl Instruction {
    /// The query marker this instruction travels as.
    fn marker(self) -> (&'static str, &'static str) {
        match self {
            Self::AutoOpenCapture => ("camera", "true"),
        }
    }

    /// Decode a marker. Unknown keys or values decode to nothing.
    fn from_query(query: &BTreeMap<String, String>) -> Option<Self> {
        match query.get("camera").map(String::as_str) {
            Some("true") => Some(Self::AutoOpenCapture),
            Some(other) => {
                tracing::debug!(value = other, "ignoring unknown camera marker");
                None
            }
            None => None,
        }
    }
}

/// Issues navigation routes and tracks which markers were consumed.
#[derive(Debug, Default)]
pub struct DeferredActionChannel {
    next_navigation: u64,
    consumed_through: Option<u64>,
}

impl DeferredActionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plain route to a view, with no instruction attached.
    pub fn route(&mut self, target: ViewId) -> Route {
        Route {
            view: target,
            query: BTreeMap::new(),
            navigation: self.next_id(),
        }
    }

    /// A route to a view carrying a one-shot instruction.
    pub fn encode(&mut self, target: ViewId, instruction: Instruction) -> Route {
        let mut route = self.route(target);
        let (key, value) = instruction.marker();
        route.query.insert(key.to_string(), value.to_string());
        route
    }

    /// Adopt a route built elsewhere (e.g. parsed from a URL) as a fresh navigation.
    pub fn renavigate(&mut self, mut route: Route) -> Route {
        route.navigation = self.next_id();
        route
    }

    /// Take the instruction carried by `route`, at most once per navigation.
    pub fn consume(&mut self, route: &Route) -> Option<Instruction> {
        if self
            .consumed_through
            .is_some_and(|seen| route.navigation <= seen)
        {
            return None;
        }
        self.consumed_through = Some(route.navigation);
        let instruction = Instruction::from_query(&route.query)?;
        tracing::debug!(
            view = %route.view,
            navigation = route.navigation,
            ?instruction,
            "consumed deferred action"
        );
        Some(instruction)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_navigation;
        self.next_navigation += 1;
        id
    }
}
