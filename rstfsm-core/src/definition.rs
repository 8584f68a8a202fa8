//! State machine configuration types.
//!
//! Configurations use a JSON (or YAML) document keyed by state name:
//!
//! ```json
//! {
//!   "initial": "green",
//!   "states": {
//!     "green":  { "transitions": { "timer": "yellow" } },
//!     "yellow": { "transitions": { "timer": "red" } },
//!     "red":    { "transitions": { "timer": "green" } }
//!   }
//! }
//! ```
//!
//! State and event order follows the document.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// A state in the machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(pub String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for State {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for State {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for State {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Serializes `Vec<(String, V)>` as a map, keeping entry order in both directions.
mod ordered_map {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, V>(entries: &Vec<(String, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V> Visitor<'de> for OrderedMapVisitor<V>
        where
            V: Deserialize<'de>,
        {
            type Value = Vec<(String, V)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Raw state entry as written in a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfigRaw {
    /// Event name -> target state, in document order.
    #[serde(default, with = "ordered_map")]
    pub transitions: Vec<(String, String)>,
}

/// Raw machine configuration as stored/transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfigRaw {
    /// Initial state for new machines and for `reset`.
    pub initial: String,

    /// State name -> state entry, in document order.
    #[serde(with = "ordered_map")]
    pub states: Vec<(String, StateConfigRaw)>,
}

impl MachineConfigRaw {
    /// Starts an empty configuration with the given initial state.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            initial: initial.into(),
            states: Vec::new(),
        }
    }

    /// Declares a state with no transitions. No-op if already declared.
    pub fn with_state(mut self, name: impl Into<String>) -> Self {
        self.entry(name.into());
        self
    }

    /// Adds a transition, declaring the source state if needed.
    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        event: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.entry(from.into())
            .transitions
            .push((event.into(), to.into()));
        self
    }

    fn entry(&mut self, name: String) -> &mut StateConfigRaw {
        let pos = match self.states.iter().position(|(n, _)| *n == name) {
            Some(pos) => pos,
            None => {
                self.states.push((name, StateConfigRaw::default()));
                self.states.len() - 1
            }
        };
        &mut self.states[pos].1
    }
}

/// A validated state and its outgoing transitions.
#[derive(Debug, Clone)]
pub struct StateDefinition {
    name: State,
    transitions: Vec<(String, State)>,
    /// Event name -> position in `transitions`.
    by_event: HashMap<String, usize>,
}

impl StateDefinition {
    pub fn name(&self) -> &State {
        &self.name
    }

    /// Outgoing transitions as `(event, target)`, in document order.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &State)> {
        self.transitions.iter().map(|(e, s)| (e.as_str(), s))
    }

    /// Returns true if this state declares the event.
    pub fn has_event(&self, event: &str) -> bool {
        self.by_event.contains_key(event)
    }

    /// Returns the target of `event`, if declared.
    pub fn target(&self, event: &str) -> Option<&State> {
        self.by_event.get(event).map(|&pos| &self.transitions[pos].1)
    }
}

/// Validated and indexed machine configuration.
///
/// Immutable once built; machines share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Initial state.
    initial: State,

    /// States in document order.
    states: Vec<StateDefinition>,

    /// State name -> position in `states`.
    index: HashMap<State, usize>,

    /// Original raw configuration.
    raw: MachineConfigRaw,

    /// Hash of the configuration for integrity checks.
    checksum: String,
}

impl MachineConfig {
    /// Parses and validates a configuration from JSON.
    ///
    /// `null` is treated as an absent configuration.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoreError> {
        if json.is_null() {
            return Err(CoreError::invalid("configuration is required"));
        }
        let raw: MachineConfigRaw = serde_json::from_value(json.clone())
            .map_err(|e| CoreError::invalid(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, CoreError> {
        let raw: Option<MachineConfigRaw> =
            serde_json::from_str(s).map_err(|e| CoreError::invalid(e.to_string()))?;
        let raw = raw.ok_or_else(|| CoreError::invalid("configuration is required"))?;
        Self::from_raw(raw)
    }

    /// Validates a raw configuration.
    pub fn from_raw(raw: MachineConfigRaw) -> Result<Self, CoreError> {
        if raw.states.is_empty() {
            return Err(CoreError::invalid("no states defined"));
        }

        // Build state index
        let mut index = HashMap::with_capacity(raw.states.len());
        for (pos, (name, _)) in raw.states.iter().enumerate() {
            if index.insert(State(name.clone()), pos).is_some() {
                return Err(CoreError::invalid(format!("duplicate state '{}'", name)));
            }
        }

        // Validate initial state
        let initial = State(raw.initial.clone());
        if !index.contains_key(&initial) {
            return Err(CoreError::invalid(format!(
                "initial state '{}' not in states",
                initial
            )));
        }

        // Build and validate transitions
        let mut states = Vec::with_capacity(raw.states.len());
        for (name, entry) in &raw.states {
            let mut by_event = HashMap::with_capacity(entry.transitions.len());
            let mut outgoing = Vec::with_capacity(entry.transitions.len());

            for (event, target) in &entry.transitions {
                if by_event.insert(event.clone(), outgoing.len()).is_some() {
                    return Err(CoreError::invalid(format!(
                        "duplicate event '{}' in state '{}'",
                        event, name
                    )));
                }

                let to = State(target.clone());
                if !index.contains_key(&to) {
                    return Err(CoreError::invalid(format!(
                        "transition target '{}' (state '{}', event '{}') not in states",
                        target, name, event
                    )));
                }

                outgoing.push((event.clone(), to));
            }

            states.push(StateDefinition {
                name: State(name.clone()),
                transitions: outgoing,
                by_event,
            });
        }

        // Compute checksum
        let json_bytes = serde_json::to_vec(&raw)?;
        let checksum = format!("{:08x}", crc32c::crc32c(&json_bytes));

        Ok(Self {
            initial,
            states,
            index,
            raw,
            checksum,
        })
    }

    pub fn initial(&self) -> &State {
        &self.initial
    }

    /// The raw configuration this was built from.
    pub fn raw(&self) -> &MachineConfigRaw {
        &self.raw
    }

    /// crc32c of the canonical JSON encoding, 8 hex digits.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Number of declared states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns true if the given state is declared.
    pub fn has_state(&self, state: &str) -> bool {
        self.index.contains_key(state)
    }

    /// Looks up a state definition.
    pub fn state(&self, state: &State) -> Option<&StateDefinition> {
        self.index.get(state).map(|&pos| &self.states[pos])
    }

    /// All state definitions, in document order.
    pub fn definitions(&self) -> &[StateDefinition] {
        &self.states
    }

    /// All state names, in document order.
    pub fn state_names(&self) -> Vec<&State> {
        self.states.iter().map(|s| &s.name).collect()
    }

    /// States that declare the given event, in document order.
    pub fn states_with_event(&self, event: &str) -> Vec<&State> {
        self.states
            .iter()
            .filter(|s| s.has_event(event))
            .map(|s| &s.name)
            .collect()
    }

    /// Looks up the target of a transition.
    pub fn get_transition(&self, state: &State, event: &str) -> Option<&State> {
        self.state(state).and_then(|s| s.target(event))
    }

    /// Returns all events declared by the given state, in document order.
    pub fn events_from(&self, state: &State) -> Vec<&str> {
        self.state(state)
            .map(|s| s.transitions().map(|(e, _)| e).collect())
            .unwrap_or_default()
    }

    /// Returns the raw configuration as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        Ok(serde_json::to_value(&self.raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traffic_light() -> serde_json::Value {
        serde_json::json!({
            "initial": "green",
            "states": {
                "green": {"transitions": {"timer": "yellow", "emergency": "red"}},
                "yellow": {"transitions": {"timer": "red"}},
                "red": {"transitions": {"timer": "green"}},
                "off": {}
            }
        })
    }

    #[test]
    fn test_parse_config() {
        let config = MachineConfig::from_json(&traffic_light()).unwrap();

        assert_eq!(config.initial().as_str(), "green");
        assert_eq!(config.len(), 4);
        assert!(config.has_state("off"));
        assert!(!config.has_state("blue"));
        assert_eq!(config.checksum().len(), 8);
    }

    #[test]
    fn test_document_order_preserved() {
        let config = MachineConfig::from_json(&traffic_light()).unwrap();

        assert_eq!(config.state_names(), vec!["green", "yellow", "red", "off"]);
        assert_eq!(
            config.events_from(&State::from("green")),
            vec!["timer", "emergency"]
        );
    }

    #[test]
    fn test_transition_lookup() {
        let config = MachineConfig::from_json(&traffic_light()).unwrap();

        let to = config.get_transition(&State::from("green"), "timer").unwrap();
        assert_eq!(to.as_str(), "yellow");

        assert!(config
            .get_transition(&State::from("yellow"), "emergency")
            .is_none());
        assert!(config.get_transition(&State::from("off"), "timer").is_none());
    }

    #[test]
    fn test_state_definition_lookup() {
        let config = MachineConfig::from_json(&traffic_light()).unwrap();
        let green = config.state(&State::from("green")).unwrap();

        assert!(green.has_event("emergency"));
        assert!(!green.has_event("reset"));
        assert_eq!(green.target("emergency").unwrap().as_str(), "red");
        assert!(green.target("reset").is_none());
        assert!(config.state(&State::from("blue")).is_none());
        assert!(config.get_transition(&State::from("blue"), "timer").is_none());
    }

    #[test]
    fn test_validated_fields_read_only() {
        let config = MachineConfig::from_json(&traffic_light()).unwrap();

        assert_eq!(config.initial().as_str(), config.raw().initial);
        assert!(config.has_state(config.initial().as_str()));
        assert_eq!(config.raw().states.len(), config.len());
        assert!(config.checksum().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_states_with_event() {
        let config = MachineConfig::from_json(&traffic_light()).unwrap();

        assert_eq!(
            config.states_with_event("timer"),
            vec!["green", "yellow", "red"]
        );
        assert_eq!(config.states_with_event("emergency"), vec!["green"]);
        assert!(config.states_with_event("nope").is_empty());
    }

    #[test]
    fn test_null_config() {
        let result = MachineConfig::from_json(&serde_json::Value::Null);
        assert!(matches!(
            result,
            Err(CoreError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_malformed_config() {
        let json = serde_json::json!({"initial": "a", "states": ["a", "b"]});
        let result = MachineConfig::from_json(&json);
        assert!(matches!(
            result,
            Err(CoreError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_invalid_initial_state() {
        let json = serde_json::json!({
            "initial": "c",
            "states": {"a": {}, "b": {}}
        });

        let result = MachineConfig::from_json(&json);
        assert!(matches!(
            result,
            Err(CoreError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_invalid_transition_target() {
        let json = serde_json::json!({
            "initial": "a",
            "states": {"a": {"transitions": {"go": "c"}}}
        });

        let err = MachineConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("'c'"));
    }

    #[test]
    fn test_empty_states() {
        let raw = MachineConfigRaw::new("a");
        assert!(matches!(
            MachineConfig::from_raw(raw),
            Err(CoreError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_duplicate_state_and_event() {
        let mut raw = MachineConfigRaw::new("a").with_state("a");
        raw.states.push(("a".to_string(), StateConfigRaw::default()));
        assert!(MachineConfig::from_raw(raw).is_err());

        let raw = MachineConfigRaw::new("a")
            .with_transition("a", "go", "a")
            .with_transition("a", "go", "a");
        let err = MachineConfig::from_raw(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate event"));
    }

    #[test]
    fn test_builder_matches_json() {
        let raw = MachineConfigRaw::new("green")
            .with_transition("green", "timer", "yellow")
            .with_transition("green", "emergency", "red")
            .with_transition("yellow", "timer", "red")
            .with_transition("red", "timer", "green")
            .with_state("off");

        let built = MachineConfig::from_raw(raw).unwrap();
        let parsed = MachineConfig::from_json(&traffic_light()).unwrap();

        assert_eq!(built.raw(), parsed.raw());
        assert_eq!(built.checksum(), parsed.checksum());
    }

    #[test]
    fn test_to_json_keeps_shape() {
        let config = MachineConfig::from_json(&traffic_light()).unwrap();
        let json = config.to_json().unwrap();

        assert_eq!(json["initial"], "green");
        assert_eq!(json["states"]["yellow"]["transitions"]["timer"], "red");
        assert_eq!(json["states"]["off"]["transitions"], serde_json::json!({}));
    }
}
