//! Wire messages exchanged with the page.
//!
//! Outgoing messages are JSON objects tagged by `t`:
//!
//! ```json
//! {"t":"param","id":3,"v":0.5}
//! {"t":"params","params":[{"id":0,"v":1.0},{"id":1,"v":0.25}]}
//! {"t":"noteOn","ch":0,"k":60,"vel":0.8}
//! {"t":"noteOff","ch":0,"k":60}
//! {"t":"midiCC","ch":0,"cc":74,"v":100}
//! {"t":"ready"}
//! {"t":"reply","id":7,"result":{"ok":true}}
//! {"t":"reply","id":8,"error":"unknown function: nope"}
//! ```
//!
//! Incoming messages arrive as the argument array of the `__clasp` binding,
//! whose first element is the message JSON as a string.

use serde::Serialize;
use serde_json::Value;

use crate::queue::{MidiCcEvent, NoteEvent, ParamUpdate, PendingUpdates};

/// `{id, v}` pair inside a `params` message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamEntry {
    /// Parameter id.
    pub id: u32,
    /// Plain value.
    pub v: f32,
}

impl From<ParamUpdate> for ParamEntry {
    fn from(p: ParamUpdate) -> Self {
        Self {
            id: p.id,
            v: p.value,
        }
    }
}

/// Event pushed from native code to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "t")]
pub enum Outgoing {
    /// Single parameter update.
    #[serde(rename = "param")]
    Param {
        /// Parameter id.
        id: u32,
        /// Plain value.
        v: f32,
    },
    /// Batch of parameter values.
    #[serde(rename = "params")]
    Params {
        /// Entries in arrival order.
        params: Vec<ParamEntry>,
    },
    /// Note on.
    #[serde(rename = "noteOn")]
    NoteOn {
        /// Channel.
        ch: i16,
        /// Key.
        k: i16,
        /// Velocity.
        vel: f32,
    },
    /// Note off.
    #[serde(rename = "noteOff")]
    NoteOff {
        /// Channel.
        ch: i16,
        /// Key.
        k: i16,
    },
    /// MIDI control change.
    #[serde(rename = "midiCC")]
    MidiCc {
        /// Channel.
        ch: i16,
        /// Controller.
        cc: u8,
        /// Value.
        v: u8,
    },
    /// Native side is ready.
    #[serde(rename = "ready")]
    Ready,
}

impl From<NoteEvent> for Outgoing {
    fn from(n: NoteEvent) -> Self {
        if n.is_note_on {
            Self::NoteOn {
                ch: n.channel,
                k: n.key,
                vel: n.velocity,
            }
        } else {
            Self::NoteOff {
                ch: n.channel,
                k: n.key,
            }
        }
    }
}

impl From<MidiCcEvent> for Outgoing {
    fn from(c: MidiCcEvent) -> Self {
        Self::MidiCc {
            ch: c.channel,
            cc: c.cc,
            v: c.value,
        }
    }
}

/// Render drained updates as outgoing messages in delivery order:
/// single params, one `params` batch (if any), notes, then control changes.
pub fn outgoing_from_pending(pending: PendingUpdates) -> Vec<Outgoing> {
    let PendingUpdates {
        params,
        bulk_params,
        notes,
        ccs,
    } = pending;

    let mut out = Vec::with_capacity(params.len() + notes.len() + ccs.len() + 1);
    out.extend(params.into_iter().map(|p| Outgoing::Param {
        id: p.id,
        v: p.value,
    }));
    if !bulk_params.is_empty() {
        out.push(Outgoing::Params {
            params: bulk_params.into_iter().map(ParamEntry::from).collect(),
        });
    }
    out.extend(notes.into_iter().map(Outgoing::from));
    out.extend(ccs.into_iter().map(Outgoing::from));
    out
}

/// JSON number for an `f32`, printed with its shortest representation.
///
/// `Value::from(f32)` widens to `f64` first, which turns `0.1` into
/// `0.10000000149011612`. Non-finite values become `null`.
pub fn json_f32(v: f32) -> Value {
    v.to_string().parse::<f64>().map_or(Value::Null, Value::from)
}

/// Reply to a `call` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply<'a> {
    t: &'static str,
    /// Call id echoed from the request.
    pub id: i64,
    /// Handler result; `null` when the handler returned nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a Value>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> Reply<'a> {
    /// Successful reply.
    pub fn ok(id: i64, result: &'a Value) -> Self {
        Self {
            t: "reply",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Failed reply.
    pub fn err(id: i64, error: &'a str) -> Self {
        Self {
            t: "reply",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A `call` request from the page.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    /// Function name (`fn`); empty when missing.
    pub name: String,
    /// Call id; `0` when missing or not a number.
    pub id: i64,
    /// Positional arguments; empty when missing or not an array.
    pub args: Vec<Value>,
}

impl CallRequest {
    /// Extract a call from a parsed message, tolerating missing fields.
    pub fn from_value(msg: &Value) -> Self {
        let name = msg
            .get("fn")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let id = msg
            .get("id")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(0);
        let args = msg
            .get("args")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self { name, id, args }
    }
}

/// A decoded message from the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Remote procedure call expecting a reply.
    Call(CallRequest),
    /// Fire-and-forget message: `{"t":"msg","type":..., "payload":...}`.
    Message {
        /// Application-defined type (`type` field, empty when missing).
        kind: String,
        /// Payload (`payload` field, `null` when missing).
        payload: Value,
    },
    /// Any other `t` (or none); ignored by the router.
    Other(String),
}

impl Incoming {
    /// Decode the argument array of the `__clasp` binding.
    ///
    /// Returns `None` when the array has no leading string, the string is
    /// empty, or it is not valid JSON.
    pub fn from_binding_args(args_json: &str) -> Option<Self> {
        let args: Value = serde_json::from_str(args_json).ok()?;
        let text = args.as_array()?.first()?.as_str()?;
        if text.is_empty() {
            return None;
        }
        let msg: Value = serde_json::from_str(text).ok()?;
        Some(Self::from_value(&msg))
    }

    /// Classify a parsed message object by its `t` field.
    pub fn from_value(msg: &Value) -> Self {
        match msg.get("t").and_then(Value::as_str).unwrap_or_default() {
            "call" => Self::Call(CallRequest::from_value(msg)),
            "msg" => Self::Message {
                kind: msg
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                payload: msg.get("payload").cloned().unwrap_or(Value::Null),
            },
            other => Self::Other(other.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::UpdateQueue;
    use serde_json::json;

    fn to_value<T: Serialize>(v: &T) -> Value {
        serde_json::to_value(v).unwrap()
    }

    #[test]
    fn outgoing_shapes() {
        assert_eq!(
            to_value(&Outgoing::Param { id: 3, v: 0.5 }),
            json!({"t": "param", "id": 3, "v": 0.5})
        );
        assert_eq!(
            to_value(&Outgoing::NoteOff { ch: 1, k: 64 }),
            json!({"t": "noteOff", "ch": 1, "k": 64})
        );
        assert_eq!(
            to_value(&Outgoing::MidiCc { ch: 0, cc: 7, v: 127 }),
            json!({"t": "midiCC", "ch": 0, "cc": 7, "v": 127})
        );
        assert_eq!(to_value(&Outgoing::Ready), json!({"t": "ready"}));
    }

    #[test]
    fn f32_numbers_print_shortest() {
        assert_eq!(json_f32(0.1).to_string(), "0.1");
        assert_eq!(json_f32(0.3).to_string(), "0.3");
        assert_eq!(json_f32(-6.0).to_string(), "-6.0");
        assert_eq!(json_f32(f32::NAN), Value::Null);
        assert_eq!(json_f32(f32::INFINITY), Value::Null);
        // Same text the protocol path produces for the value.
        let wire = serde_json::to_string(&Outgoing::Param { id: 1, v: 0.1 }).unwrap();
        assert!(wire.contains(&format!("\"v\":{}", json_f32(0.1))));
    }

    #[test]
    fn reply_shapes() {
        let result = Value::Null;
        assert_eq!(
            to_value(&Reply::ok(4, &result)),
            json!({"t": "reply", "id": 4, "result": null})
        );
        assert_eq!(
            to_value(&Reply::err(5, "boom")),
            json!({"t": "reply", "id": 5, "error": "boom"})
        );
    }

    #[test]
    fn pending_renders_in_delivery_order() {
        let q = UpdateQueue::new();
        q.queue_midi_cc(0, 1, 2);
        q.queue_note_on(0, 60, 1.0);
        q.queue_bulk(&[(1, 0.5), (2, 0.25)]);
        q.queue_param(0, 0.75);

        let kinds: Vec<Value> = outgoing_from_pending(q.drain())
            .iter()
            .map(|m| to_value(m)["t"].clone())
            .collect();
        assert_eq!(kinds, vec![json!("param"), json!("params"), json!("noteOn"), json!("midiCC")]);
    }

    #[test]
    fn no_params_message_without_bulk_updates() {
        let q = UpdateQueue::new();
        q.queue_note_off(2, 40);
        let out = outgoing_from_pending(q.drain());
        assert_eq!(out, vec![Outgoing::NoteOff { ch: 2, k: 40 }]);
    }

    #[test]
    fn call_fields_are_lenient() {
        let call = CallRequest::from_value(&json!({"t": "call", "fn": "f", "id": 9, "args": [1, "a"]}));
        assert_eq!(call.name, "f");
        assert_eq!(call.id, 9);
        assert_eq!(call.args, vec![json!(1), json!("a")]);

        let bare = CallRequest::from_value(&json!({"t": "call"}));
        assert_eq!(bare.name, "");
        assert_eq!(bare.id, 0);
        assert!(bare.args.is_empty());

        let odd = CallRequest::from_value(&json!({"fn": "g", "id": "x", "args": {"a": 1}}));
        assert_eq!(odd.id, 0);
        assert!(odd.args.is_empty());
    }

    #[test]
    fn binding_args_decoding() {
        let args = json!([r#"{"t":"call","fn":"ping","args":[],"id":1}"#]).to_string();
        assert!(matches!(
            Incoming::from_binding_args(&args),
            Some(Incoming::Call(CallRequest { ref name, id: 1, .. })) if name == "ping"
        ));

        let msg = json!([r#"{"t":"msg","type":"hello","payload":{"x":1}}"#]).to_string();
        assert_eq!(
            Incoming::from_binding_args(&msg),
            Some(Incoming::Message {
                kind: "hello".into(),
                payload: json!({"x": 1})
            })
        );

        assert_eq!(Incoming::from_binding_args("[]"), None);
        assert_eq!(Incoming::from_binding_args(r#"[""]"#), None);
        assert_eq!(Incoming::from_binding_args("[42]"), None);
        assert_eq!(Incoming::from_binding_args(r#"["not json"]"#), None);
        assert_eq!(Incoming::from_binding_args("garbage"), None);
        assert_eq!(
            Incoming::from_binding_args(r#"["{\"t\":\"other\"}"]"#),
            Some(Incoming::Other("other".into()))
        );
    }
}
