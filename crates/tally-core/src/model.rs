use crate::error::{Result, TallyError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level key reserved for bookkeeping; never a system name.
pub const META_KEY: &str = "_meta";

/// Kind given to activities added without an explicit one.
pub const DEFAULT_KIND: &str = "NUESTRA";

/// Kind shown for stored activities that carry no usable `tipo`.
pub const UNKNOWN_KIND: &str = "N/A";

/// Canonical form of a system, activity or kind key.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub name: String,
    pub hecho: u32,
    pub total: u32,
    pub tipo: String,
}

impl Activity {
    pub fn is_complete(&self) -> bool {
        self.hecho >= self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct System {
    pub name: String,
    pub activities: Vec<Activity>,
}

impl System {
    fn new(name: String) -> Self {
        Self {
            name,
            activities: Vec::new(),
        }
    }

    pub fn activity(&self, name: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.name == name)
    }

    fn activity_mut(&mut self, name: &str) -> Option<&mut Activity> {
        self.activities.iter_mut().find(|a| a.name == name)
    }
}

/// On-disk shape of one activity. Field order is the serialized key order.
#[derive(Serialize)]
struct ActivityRecord<'a> {
    hecho: u32,
    total: u32,
    tipo: &'a str,
}

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decrement {
    /// How much progress was actually taken away after clamping at zero.
    pub removed: u32,
    pub hecho: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub system_removed: bool,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The whole tracked state: systems in their natural order plus the
/// per-channel board registrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    boards: BTreeMap<String, String>,
    systems: Vec<System>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    pub fn system(&self, name: &str) -> Option<&System> {
        let name = normalize_key(name);
        self.systems.iter().find(|s| s.name == name)
    }

    pub fn activity(&self, system: &str, activity: &str) -> Option<&Activity> {
        self.system(system)?.activity(&normalize_key(activity))
    }

    pub fn activity_count(&self) -> usize {
        self.systems.iter().map(|s| s.activities.len()).sum()
    }

    pub fn boards(&self) -> &BTreeMap<String, String> {
        &self.boards
    }

    pub fn board(&self, channel: &str) -> Option<&str> {
        self.boards.get(channel).map(String::as_str)
    }

    pub fn set_board(&mut self, channel: impl Into<String>, message: impl Into<String>) {
        self.boards.insert(channel.into(), message.into());
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Create the activity, or update `total` and `tipo` of an existing one
    /// while keeping its progress.
    pub fn add_or_update(
        &mut self,
        system: &str,
        activity: &str,
        total: u32,
        kind: &str,
    ) -> &Activity {
        let system = normalize_key(system);
        let activity = normalize_key(activity);
        let tipo = normalize_key(kind);

        let idx = match self.systems.iter().position(|s| s.name == system) {
            Some(idx) => idx,
            None => {
                self.systems.push(System::new(system));
                self.systems.len() - 1
            }
        };
        let sys = &mut self.systems[idx];

        let pos = match sys.activities.iter().position(|a| a.name == activity) {
            Some(pos) => {
                let existing = &mut sys.activities[pos];
                existing.total = total;
                existing.tipo = tipo;
                pos
            }
            None => {
                sys.activities.push(Activity {
                    name: activity,
                    hecho: 0,
                    total,
                    tipo,
                });
                sys.activities.len() - 1
            }
        };
        &sys.activities[pos]
    }

    /// Add one unit of progress unless the activity is already complete.
    pub fn increment(&mut self, system: &str, activity: &str) -> Result<&Activity> {
        let act = self.find_mut(system, activity)?;
        if act.hecho >= act.total {
            return Err(TallyError::AlreadyComplete {
                system: normalize_key(system),
                activity: act.name.clone(),
                hecho: act.hecho,
                total: act.total,
            });
        }
        act.hecho += 1;
        Ok(&*act)
    }

    /// Take `amount` away from progress, never going below zero.
    pub fn decrement(&mut self, system: &str, activity: &str, amount: i64) -> Result<Decrement> {
        let act = self.find_mut(system, activity)?;
        if amount < 1 {
            return Err(TallyError::InvalidAmount(amount));
        }
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);
        let removed = amount.min(act.hecho);
        act.hecho -= removed;
        Ok(Decrement {
            removed,
            hecho: act.hecho,
            total: act.total,
        })
    }

    /// Delete the activity, and its system if that leaves it empty.
    pub fn remove(&mut self, system: &str, activity: &str) -> Result<Removal> {
        let sys_name = normalize_key(system);
        let act_name = normalize_key(activity);
        let not_found = || TallyError::NotFound {
            system: sys_name.clone(),
            activity: act_name.clone(),
        };

        let idx = self
            .systems
            .iter()
            .position(|s| s.name == sys_name)
            .ok_or_else(not_found)?;
        let sys = &mut self.systems[idx];
        let pos = sys
            .activities
            .iter()
            .position(|a| a.name == act_name)
            .ok_or_else(not_found)?;
        sys.activities.remove(pos);

        let system_removed = sys.activities.is_empty();
        if system_removed {
            self.systems.remove(idx);
        }
        Ok(Removal { system_removed })
    }

    /// Zero every progress counter. Returns how many activities were touched.
    pub fn reset_all(&mut self) -> usize {
        let mut count = 0;
        for act in self.systems.iter_mut().flat_map(|s| s.activities.iter_mut()) {
            act.hecho = 0;
            count += 1;
        }
        count
    }

    fn find_mut(&mut self, system: &str, activity: &str) -> Result<&mut Activity> {
        let sys_name = normalize_key(system);
        let act_name = normalize_key(activity);
        let found = self
            .systems
            .iter_mut()
            .find(|s| s.name == sys_name)
            .and_then(|s| s.activity_mut(&act_name));
        match found {
            Some(act) => Ok(act),
            None => Err(TallyError::NotFound {
                system: sys_name,
                activity: act_name,
            }),
        }
    }

    // ---------------------------------------------------------------------------
    // JSON conversion
    // ---------------------------------------------------------------------------

    /// Build a document from parsed JSON, repairing what can be repaired.
    ///
    /// A missing or malformed `_meta` section becomes an empty board map.
    /// Entries that are not usable systems or activities are dropped, as are
    /// systems left without activities. Only a non-object root is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(TallyError::MalformedDocument(
                "top-level value is not an object".to_string(),
            ));
        };

        let mut doc = Document::new();
        for (key, entry) in root {
            if key == META_KEY {
                doc.boards = parse_boards(entry);
                continue;
            }
            let name = normalize_key(&key);
            if doc.systems.iter().any(|s| s.name == name) {
                tracing::warn!(system = %key, "dropping duplicate system entry");
                continue;
            }
            let Value::Object(acts) = entry else {
                tracing::warn!(system = %key, "dropping system entry that is not an object");
                continue;
            };
            let mut sys = System::new(name);
            for (act_key, act_value) in acts {
                let act_name = normalize_key(&act_key);
                if sys.activity(&act_name).is_some() {
                    tracing::warn!(system = %key, activity = %act_key, "dropping duplicate activity");
                    continue;
                }
                match parse_activity(act_name, &act_value) {
                    Some(act) => sys.activities.push(act),
                    None => {
                        tracing::warn!(system = %key, activity = %act_key, "dropping malformed activity")
                    }
                }
            }
            if sys.activities.is_empty() {
                tracing::warn!(system = %key, "dropping system with no valid activities");
                continue;
            }
            doc.systems.push(sys);
        }
        Ok(doc)
    }

    pub fn to_value(&self) -> Result<Value> {
        let mut root = Map::new();
        root.insert(
            META_KEY.to_string(),
            serde_json::json!({ "boards": self.boards }),
        );
        for sys in &self.systems {
            let mut acts = Map::new();
            for act in &sys.activities {
                let record = ActivityRecord {
                    hecho: act.hecho,
                    total: act.total,
                    tipo: &act.tipo,
                };
                acts.insert(act.name.clone(), serde_json::to_value(record)?);
            }
            root.insert(sys.name.clone(), Value::Object(acts));
        }
        Ok(Value::Object(root))
    }
}

fn parse_boards(meta: Value) -> BTreeMap<String, String> {
    let Some(Value::Object(boards)) = meta.get("boards").cloned() else {
        tracing::warn!("repairing missing or malformed board registrations");
        return BTreeMap::new();
    };
    boards
        .into_iter()
        .filter_map(|(channel, message)| match message {
            Value::String(id) => Some((channel, id)),
            Value::Number(n) => Some((channel, n.to_string())),
            _ => {
                tracing::warn!(%channel, "dropping malformed board registration");
                None
            }
        })
        .collect()
}

fn parse_activity(name: String, value: &Value) -> Option<Activity> {
    let obj = value.as_object()?;
    let hecho = parse_count(obj.get("hecho")?)?;
    let total = parse_count(obj.get("total")?)?;
    let tipo = match obj.get("tipo") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_KIND.to_string(),
        Some(other) => other.to_string(),
    };
    Some(Activity {
        name,
        hecho,
        total,
        tipo,
    })
}

fn parse_count(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return Some(u32::try_from(n).unwrap_or(u32::MAX));
    }
    // Negative counters are clamped rather than dropped.
    value.as_i64().map(|_| 0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
