//! Shared board model and JSON codec for the realtime WS transport.
//!
//! This crate owns the wire representation used by both the relay server and
//! the `client` crate. Every message is a JSON text frame shaped as
//! `{"event": <name>, "data": <payload>}`, so event names read the same on
//! the wire as they do in logs.
//!
//! DESIGN
//! ======
//! - `BoardObject` is a closed sum over object kinds. Geometry and color are
//!   common; kind payloads live in `ObjectBody`, tagged on the wire by `type`.
//! - `ObjectPatch` is a sparse, shallow update. Absent fields are untouched.
//! - The server never inspects object payloads; it relays them verbatim.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned by [`encode_frame`] and [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame could not be serialized to JSON.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
    /// The text is not a well-formed frame for the expected direction.
    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),
}

// =============================================================================
// BOARD OBJECTS
// =============================================================================

/// A point in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Outline of a `shape` object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rect,
    Circle,
    Triangle,
    Square,
    Arrow,
    Hexagon,
    Pentagon,
    Star,
    Diamond,
    Parallelogram,
    Trapezium,
}

/// Discriminant of [`ObjectBody`], handy for logging and dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Sticky,
    Text,
    Path,
    Shape,
    Image,
}

impl ObjectKind {
    /// Wire name of the kind, as carried in the `type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sticky => "sticky",
            Self::Text => "text",
            Self::Path => "path",
            Self::Shape => "shape",
            Self::Image => "image",
        }
    }
}

/// Kind-specific payload of a board object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectBody {
    /// Sticky note with a title line and body text.
    Sticky {
        #[serde(default)]
        title: String,
        #[serde(default)]
        text: String,
    },
    /// Free-standing text block.
    Text {
        #[serde(default)]
        text: String,
    },
    /// Freehand stroke. Points are appended while the stroke is being drawn.
    Path {
        #[serde(default)]
        points: Vec<Point>,
    },
    /// Geometric shape.
    Shape {
        #[serde(rename = "shapeType")]
        shape_type: ShapeType,
    },
    /// Embedded image referenced by URL (or data URL).
    Image {
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
}

impl ObjectBody {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Sticky { .. } => ObjectKind::Sticky,
            Self::Text { .. } => ObjectKind::Text,
            Self::Path { .. } => ObjectKind::Path,
            Self::Shape { .. } => ObjectKind::Shape,
            Self::Image { .. } => ObjectKind::Image,
        }
    }
}

/// One shared canvas entity. `id` is generated by the creating client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardObject {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Clockwise rotation in degrees. Absent means unrotated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// CSS color string.
    pub color: String,
    /// Resize mode toggled from the object menu. Synced like any other field.
    #[serde(rename = "showHandles", default, skip_serializing_if = "Option::is_none")]
    pub show_handles: Option<bool>,
    #[serde(flatten)]
    pub body: ObjectBody,
}

impl BoardObject {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.body.kind()
    }

    /// Shallow-merge `patch` into this object.
    ///
    /// Common fields always apply. Kind-specific fields apply only when they
    /// belong to this object's kind; a `points` patch on a sticky note, for
    /// example, is ignored. The object's kind never changes.
    pub fn apply_patch(&mut self, patch: &ObjectPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = Some(rotation);
        }
        if let Some(color) = &patch.color {
            self.color.clone_from(color);
        }
        if let Some(show) = patch.show_handles {
            self.show_handles = Some(show);
        }

        match &mut self.body {
            ObjectBody::Sticky { title, text } => {
                if let Some(t) = &patch.title {
                    title.clone_from(t);
                }
                if let Some(t) = &patch.text {
                    text.clone_from(t);
                }
            }
            ObjectBody::Text { text } => {
                if let Some(t) = &patch.text {
                    text.clone_from(t);
                }
            }
            ObjectBody::Path { points } => {
                if let Some(p) = &patch.points {
                    points.clone_from(p);
                }
            }
            ObjectBody::Shape { shape_type } => {
                if let Some(s) = patch.shape_type {
                    *shape_type = s;
                }
            }
            ObjectBody::Image { image_url } => {
                if let Some(u) = &patch.image_url {
                    image_url.clone_from(u);
                }
            }
        }
    }
}

/// Sparse update for a board object. Only present fields are applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_handles: Option<bool>,
    /// Sticky notes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sticky notes and text blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Paths only. Replaces the whole point list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    /// Shapes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<ShapeType>,
    /// Images only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ObjectPatch {
    /// Move to an absolute position.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    /// Replace body text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    /// Replace a path's point list.
    #[must_use]
    pub fn points(points: Vec<Point>) -> Self {
        Self { points: Some(points), ..Self::default() }
    }
}

// =============================================================================
// PRESENCE
// =============================================================================

/// Ephemeral per-connection record held by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    /// Connection identity assigned by the server.
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// Display color assigned at connect time.
    pub color: String,
}

// =============================================================================
// FRAMES
// =============================================================================

/// Pointer position in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

/// Payload of `object-update` and `remote-object-update`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectUpdate {
    pub id: String,
    pub updates: ObjectPatch,
}

/// Messages a client sends to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientFrame {
    CursorMove(CursorPosition),
    ObjectAdd(BoardObject),
    ObjectUpdate(ObjectUpdate),
    ObjectDelete(String),
}

impl ClientFrame {
    /// Wire event name.
    #[must_use]
    pub fn event(&self) -> &'static str {
        match self {
            Self::CursorMove(_) => "cursor-move",
            Self::ObjectAdd(_) => "object-add",
            Self::ObjectUpdate(_) => "object-update",
            Self::ObjectDelete(_) => "object-delete",
        }
    }

    /// Cursor traffic is high-volume and excluded from info-level logs.
    #[must_use]
    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::CursorMove(_))
    }
}

/// Messages the server sends to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// First frame on every connection: the identity the server assigned.
    Connected { id: String },
    /// Full roster, including the receiving connection.
    UsersUpdate(Vec<Presence>),
    /// A single peer moved its cursor.
    CursorUpdate(Presence),
    RemoteObjectAdd(BoardObject),
    RemoteObjectUpdate(ObjectUpdate),
    RemoteObjectDelete(String),
}

impl ServerFrame {
    /// Wire event name.
    #[must_use]
    pub fn event(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::UsersUpdate(_) => "users-update",
            Self::CursorUpdate(_) => "cursor-update",
            Self::RemoteObjectAdd(_) => "remote-object-add",
            Self::RemoteObjectUpdate(_) => "remote-object-update",
            Self::RemoteObjectDelete(_) => "remote-object-delete",
        }
    }

    #[must_use]
    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::CursorUpdate(_))
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode a frame as a JSON text message.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails (non-finite floats
/// serialize as `null`, so in practice this only fails for custom payloads).
pub fn encode_frame<T: Serialize>(frame: &T) -> Result<String, CodecError> {
    serde_json::to_string(frame).map_err(CodecError::Encode)
}

/// Decode a JSON text message into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed JSON, unknown event names,
/// or payloads that do not match the event's schema.
pub fn decode_frame<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
