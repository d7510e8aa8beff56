//! Graph record types: nodes, edges and the closed node-kind set.
//!
//! DESIGN
//! ======
//! The model streams node objects shaped `{"id","type","data":{...}}`. On the
//! way in, the kind-specific `data` fields are merged with `id`/`type` into a
//! typed [`NodePayload`] variant; anything the variant does not know lands in
//! its `extra` map so new fields survive untouched. On the way out, a [`Node`]
//! serializes as one flat record: `{"id","type",...fields,"position"?}`.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tracing::trace;

use crate::error::NormalizeError;

/// Free-form extension fields carried alongside the known ones.
pub type Extra = Map<String, Value>;

/// Keys owned by the record envelope, never merged into a payload.
const ENVELOPE_KEYS: [&str; 4] = ["id", "type", "data", "position"];

// =============================================================================
// NODE KIND
// =============================================================================

/// The closed set of entity types a flow graph may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "action")]
    Action,
    #[serde(rename = "tool")]
    Tool,
    #[serde(rename = "malware")]
    Malware,
    #[serde(rename = "asset")]
    Asset,
    #[serde(rename = "infrastructure")]
    Infrastructure,
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "vulnerability")]
    Vulnerability,
    #[serde(rename = "AND_operator")]
    AndGate,
    #[serde(rename = "OR_operator")]
    OrGate,
}

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        Self::Action,
        Self::Tool,
        Self::Malware,
        Self::Asset,
        Self::Infrastructure,
        Self::Url,
        Self::Vulnerability,
        Self::AndGate,
        Self::OrGate,
    ];

    /// Wire name as emitted in the flat node record.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Tool => "tool",
            Self::Malware => "malware",
            Self::Asset => "asset",
            Self::Infrastructure => "infrastructure",
            Self::Url => "url",
            Self::Vulnerability => "vulnerability",
            Self::AndGate => "AND_operator",
            Self::OrGate => "OR_operator",
        }
    }

    /// Backbone kinds form the sequential technique chain of a flow.
    ///
    /// Gates sit inside that chain, joining or splitting technique paths.
    #[must_use]
    pub fn is_backbone(self) -> bool {
        matches!(self, Self::Action | Self::AndGate | Self::OrGate)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = NormalizeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let lower = raw.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "action" => Self::Action,
            "tool" => Self::Tool,
            "malware" => Self::Malware,
            "asset" => Self::Asset,
            "infrastructure" => Self::Infrastructure,
            "url" => Self::Url,
            "vulnerability" => Self::Vulnerability,
            "and_operator" | "and" | "and-gate" | "and_gate" => Self::AndGate,
            "or_operator" | "or" | "or-gate" | "or_gate" => Self::OrGate,
            _ => return Err(NormalizeError::UnknownKind(raw.to_owned())),
        };
        Ok(kind)
    }
}

// =============================================================================
// KIND PAYLOADS
// =============================================================================

/// An ATT&CK technique step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "techniqueId", skip_serializing_if = "Option::is_none")]
    pub technique_id: Option<String>,
    #[serde(default, alias = "techniqueName", skip_serializing_if = "Option::is_none")]
    pub technique_name: Option<String>,
    #[serde(default, alias = "tacticId", skip_serializing_if = "Option::is_none")]
    pub tactic_id: Option<String>,
    #[serde(default, alias = "tacticName", skip_serializing_if = "Option::is_none")]
    pub tactic_name: Option<String>,
    /// Models emit this as either a label ("high") or a number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "commandLine", skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MalwareData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "malwareTypes", skip_serializing_if = "Vec::is_empty")]
    pub malware_types: Vec<String>,
    #[serde(default, alias = "isFamily", skip_serializing_if = "Option::is_none")]
    pub is_family: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Shared shape for kinds that only carry a name and description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "infrastructureTypes", skip_serializing_if = "Vec::is_empty")]
    pub infrastructure_types: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlData {
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "cveId", alias = "cve", skip_serializing_if = "Option::is_none")]
    pub cve_id: Option<String>,
    /// Number or numeric string, whichever the model produced.
    #[serde(default, alias = "cvssScore", alias = "cvss", skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// AND/OR gates: the operator is the kind itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Kind-specific node fields, tagged by the node kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NodePayload {
    #[serde(rename = "action")]
    Action(ActionData),
    #[serde(rename = "tool")]
    Tool(ToolData),
    #[serde(rename = "malware")]
    Malware(MalwareData),
    #[serde(rename = "asset")]
    Asset(AssetData),
    #[serde(rename = "infrastructure")]
    Infrastructure(InfrastructureData),
    #[serde(rename = "url")]
    Url(UrlData),
    #[serde(rename = "vulnerability")]
    Vulnerability(VulnerabilityData),
    #[serde(rename = "AND_operator")]
    AndGate(GateData),
    #[serde(rename = "OR_operator")]
    OrGate(GateData),
}

impl NodePayload {
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Action(_) => NodeKind::Action,
            Self::Tool(_) => NodeKind::Tool,
            Self::Malware(_) => NodeKind::Malware,
            Self::Asset(_) => NodeKind::Asset,
            Self::Infrastructure(_) => NodeKind::Infrastructure,
            Self::Url(_) => NodeKind::Url,
            Self::Vulnerability(_) => NodeKind::Vulnerability,
            Self::AndGate(_) => NodeKind::AndGate,
            Self::OrGate(_) => NodeKind::OrGate,
        }
    }

    /// Decode merged payload fields into the variant for `kind`. A known
    /// field with the wrong JSON type is kept verbatim in `extra` instead.
    #[must_use]
    pub fn from_fields(kind: NodeKind, fields: Extra) -> Self {
        let (mut payload, rejected) = match kind {
            NodeKind::Action => decode_lenient(kind, fields, Self::Action),
            NodeKind::Tool => decode_lenient(kind, fields, Self::Tool),
            NodeKind::Malware => decode_lenient(kind, fields, Self::Malware),
            NodeKind::Asset => decode_lenient(kind, fields, Self::Asset),
            NodeKind::Infrastructure => decode_lenient(kind, fields, Self::Infrastructure),
            NodeKind::Url => decode_lenient(kind, fields, Self::Url),
            NodeKind::Vulnerability => decode_lenient(kind, fields, Self::Vulnerability),
            NodeKind::AndGate => decode_lenient(kind, fields, Self::AndGate),
            NodeKind::OrGate => decode_lenient(kind, fields, Self::OrGate),
        };
        payload.extra_mut().extend(rejected);
        payload
    }

    fn extra_mut(&mut self) -> &mut Extra {
        match self {
            Self::Action(d) => &mut d.extra,
            Self::Tool(d) => &mut d.extra,
            Self::Malware(d) => &mut d.extra,
            Self::Asset(d) => &mut d.extra,
            Self::Infrastructure(d) => &mut d.extra,
            Self::Url(d) => &mut d.extra,
            Self::Vulnerability(d) => &mut d.extra,
            Self::AndGate(d) | Self::OrGate(d) => &mut d.extra,
        }
    }

    /// Human-readable caption: the name, the URL value, or the gate operator.
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        match self {
            Self::Action(d) => d.name.as_deref(),
            Self::Tool(d) => d.name.as_deref(),
            Self::Malware(d) => d.name.as_deref(),
            Self::Asset(d) => d.name.as_deref(),
            Self::Infrastructure(d) => d.name.as_deref(),
            Self::Url(d) => d.value.as_deref(),
            Self::Vulnerability(d) => d.cve_id.as_deref().or(d.name.as_deref()),
            Self::AndGate(_) => Some("AND"),
            Self::OrGate(_) => Some("OR"),
        }
    }
}

/// Decode `fields` one key at a time, in order. A key whose value does not fit
/// the typed field (or collides with an alias already taken) is handed back
/// untouched so the caller can keep it as an extension field.
fn decode_lenient<T, P>(kind: NodeKind, fields: Extra, wrap: impl FnOnce(T) -> P) -> (P, Extra)
where
    T: DeserializeOwned + Default,
{
    let mut accepted = Extra::new();
    let mut rejected = Extra::new();
    let mut decoded = T::default();
    for (key, value) in fields {
        accepted.insert(key.clone(), value.clone());
        match serde_json::from_value::<T>(Value::Object(accepted.clone())) {
            Ok(next) => decoded = next,
            Err(e) => {
                trace!(kind = kind.as_str(), key = %key, error = %e, "graph: mistyped field kept as extra");
                accepted.remove(&key);
                rejected.insert(key, value);
            }
        }
    }
    (wrap(decoded), rejected)
}

// =============================================================================
// NODE / EDGE
// =============================================================================

/// Top-left corner of a node box, in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A graph entity. `position` is only ever set by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub payload: NodePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    #[must_use]
    pub fn new(id: impl Into<String>, payload: NodePayload) -> Self {
        Self { id: id.into(), payload, position: None }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    /// Normalize a decoded JSON record into a typed node.
    ///
    /// Accepts the nested wire shape `{"id","type","data":{...}}` as well as an
    /// already-flat record. Fields under `data` win over top-level duplicates.
    ///
    /// # Errors
    ///
    /// Fails when the record is not an object, looks like an edge, lacks a
    /// string `id`/`type`, or names an unknown kind. Mistyped payload fields
    /// are kept verbatim in `extra`.
    pub fn from_value(value: &Value) -> Result<Self, NormalizeError> {
        let obj = value.as_object().ok_or(NormalizeError::NotAnObject)?;
        if looks_like_edge(obj) {
            return Err(NormalizeError::LooksLikeEdge);
        }
        let id = string_field(obj, "id")?;
        let kind: NodeKind = string_field(obj, "type")?.parse()?;

        let mut fields = Extra::new();
        for (key, v) in obj {
            if !ENVELOPE_KEYS.contains(&key.as_str()) {
                fields.insert(key.clone(), v.clone());
            }
        }
        if let Some(Value::Object(data)) = obj.get("data") {
            for (key, v) in data {
                // An inner id/type would collide with the envelope on output.
                if key != "id" && key != "type" {
                    fields.insert(key.clone(), v.clone());
                }
            }
        }

        let payload = NodePayload::from_fields(kind, fields);
        Ok(Self::new(id, payload))
    }
}

/// A directed, labeled relation between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Rendering hint for the connection line.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub connection_kind: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Edge {
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
            connection_kind: None,
            extra: Extra::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Decode an edge record.
    ///
    /// `type` wins over `connectionKind`; the loser, like any non-string
    /// `label` or `type`, stays in `extra` as sent.
    ///
    /// # Errors
    ///
    /// Fails when the record is not an object or lacks string `id`, `source`
    /// or `target`.
    pub fn from_value(value: &Value) -> Result<Self, NormalizeError> {
        let obj = value.as_object().ok_or(NormalizeError::NotAnObject)?;
        let mut edge = Self::new(string_field(obj, "id")?, string_field(obj, "source")?, string_field(obj, "target")?);
        for (key, v) in obj {
            match (key.as_str(), v) {
                ("id" | "source" | "target", _) => {}
                ("label", Value::String(label)) => edge.label = Some(label.clone()),
                ("type", Value::String(kind)) => edge.connection_kind = Some(kind.clone()),
                _ => {
                    edge.extra.insert(key.clone(), v.clone());
                }
            }
        }
        if edge.connection_kind.is_none()
            && !edge.extra.contains_key("type")
            && let Some(kind) = edge.extra.remove("connectionKind")
        {
            match kind {
                Value::String(kind) => edge.connection_kind = Some(kind),
                other => {
                    edge.extra.insert("connectionKind".to_owned(), other);
                }
            }
        }
        Ok(edge)
    }
}

/// A record carrying both endpoints is an edge, whatever else it claims.
#[must_use]
pub fn looks_like_edge(obj: &Map<String, Value>) -> bool {
    obj.contains_key("source") && obj.contains_key("target")
}

fn string_field<'a>(obj: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, NormalizeError> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or(NormalizeError::MissingField(key))
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
