//! View labels and the serialisable payload types.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::core::LabelScheme;
use crate::interop::LayerMatrix;
use crate::slicing::Segment;

/// Which part of the attention matrix a view exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    All,
    AA,
    AB,
    BA,
    BB,
}

impl ViewKind {
    /// Directional views in `aa`, `ab`, `ba`, `bb` order.
    pub const DIRECTIONAL: [ViewKind; 4] = [ViewKind::AA, ViewKind::AB, ViewKind::BA, ViewKind::BB];

    /// Short key under `scheme`.
    pub fn label(self, scheme: LabelScheme) -> &'static str {
        match (self, scheme) {
            (ViewKind::All, _) => "all",
            (ViewKind::AA, LabelScheme::Directional) => "aa",
            (ViewKind::AA, LabelScheme::Legacy) => "a",
            (ViewKind::BB, LabelScheme::Directional) => "bb",
            (ViewKind::BB, LabelScheme::Legacy) => "b",
            (ViewKind::AB, _) => "ab",
            (ViewKind::BA, _) => "ba",
        }
    }

    /// Human-readable name shown by the visualisation.
    pub fn display_name(self) -> &'static str {
        match self {
            ViewKind::All => "All",
            ViewKind::AA => "Sentence A -> Sentence A",
            ViewKind::AB => "Sentence A -> Sentence B",
            ViewKind::BA => "Sentence B -> Sentence A",
            ViewKind::BB => "Sentence B -> Sentence B",
        }
    }

    /// Query-side and key-side segments, `None` for the unsliced view.
    pub fn sides(self) -> Option<(Segment, Segment)> {
        match self {
            ViewKind::All => None,
            ViewKind::AA => Some((Segment::A, Segment::A)),
            ViewKind::AB => Some((Segment::A, Segment::B)),
            ViewKind::BA => Some((Segment::B, Segment::A)),
            ViewKind::BB => Some((Segment::B, Segment::B)),
        }
    }

    /// Position of the view in payloads keyed with `scheme`.
    pub(crate) fn order(self, scheme: LabelScheme) -> usize {
        match scheme {
            LabelScheme::Directional => match self {
                ViewKind::All => 0,
                ViewKind::AA => 1,
                ViewKind::AB => 2,
                ViewKind::BA => 3,
                ViewKind::BB => 4,
            },
            LabelScheme::Legacy => match self {
                ViewKind::All => 0,
                ViewKind::AA => 1,
                ViewKind::BB => 2,
                ViewKind::AB => 3,
                ViewKind::BA => 4,
            },
        }
    }
}

/// One view of the model-facing payload.
///
/// `attn` is indexed `[layer][head][left position][right position]`;
/// `queries` and `keys`, when present, `[layer][head][position][feature]`
/// over the left and right tokens respectively.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AttentionView {
    pub attn: Vec<LayerMatrix>,
    pub left_text: Vec<String>,
    pub right_text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<LayerMatrix>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<LayerMatrix>>,
}

impl AttentionView {
    pub fn num_layers(&self) -> usize {
        self.attn.len()
    }

    pub fn num_heads(&self) -> usize {
        self.attn.first().map_or(0, Vec::len)
    }
}

/// One entry of the visualisation-facing ordered view list.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NamedView {
    pub name: String,
    pub attn: Vec<LayerMatrix>,
    pub left_text: Vec<String>,
    pub right_text: Vec<String>,
}

/// Ordered mapping from view label to view.
///
/// Serialises as a JSON object whose keys follow the view order of the label
/// scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionPayload {
    labels: LabelScheme,
    views: Vec<(ViewKind, AttentionView)>,
}

impl AttentionPayload {
    pub(crate) fn new(labels: LabelScheme, mut views: Vec<(ViewKind, AttentionView)>) -> Self {
        views.sort_by_key(|(kind, _)| kind.order(labels));
        Self { labels, views }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Keys in payload order.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.views.iter().map(|(kind, _)| kind.label(self.labels))
    }

    pub fn get(&self, label: &str) -> Option<&AttentionView> {
        self.views
            .iter()
            .find(|(kind, _)| kind.label(self.labels) == label)
            .map(|(_, view)| view)
    }

    pub fn view(&self, kind: ViewKind) -> Option<&AttentionView> {
        self.views
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, view)| view)
    }

    pub fn num_layers(&self) -> usize {
        self.view(ViewKind::All).map_or(0, AttentionView::num_layers)
    }

    pub fn num_heads(&self) -> usize {
        self.view(ViewKind::All).map_or(0, AttentionView::num_heads)
    }

    /// Convert into the visualisation-facing list, keeping view order and
    /// dropping query/key vectors.
    pub fn into_named_views(self) -> Vec<NamedView> {
        self.views
            .into_iter()
            .map(|(kind, view)| NamedView {
                name: kind.display_name().to_string(),
                attn: view.attn,
                left_text: view.left_text,
                right_text: view.right_text,
            })
            .collect()
    }
}

impl Serialize for AttentionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.views.len()))?;
        for (kind, view) in &self.views {
            map.serialize_entry(kind.label(self.labels), view)?;
        }
        map.end()
    }
}
