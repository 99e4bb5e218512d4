//! Blend modes, and how modes PDF has no equivalent for are decomposed into
//! soft-masked form XObjects.
//!
//! PDF only knows the separable and non-separable blend modes. The Porter-Duff
//! modes are built out of snapshots instead: the destination drawn so far, the
//! source drawn on its own, and optionally the coverage shape of the source.
//! Each snapshot is a form XObject, and a [`CompositeStep`] draws one of them,
//! optionally through the alpha of another as a soft mask.

/// A blend mode.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, Default)]
pub enum BlendMode {
    /// The composite mode 'Clear'.
    Clear,
    /// The composite mode 'Source'.
    Source,
    /// The composite mode 'Destination'.
    Destination,
    /// The composite mode 'SourceOver'.
    #[default]
    SourceOver,
    /// The composite mode 'DestinationOver'.
    DestinationOver,
    /// The composite mode 'SourceIn'.
    SourceIn,
    /// The composite mode 'DestinationIn'.
    DestinationIn,
    /// The composite mode 'SourceOut'.
    SourceOut,
    /// The composite mode 'DestinationOut'.
    DestinationOut,
    /// The composite mode 'SourceAtop'.
    SourceAtop,
    /// The composite mode 'DestinationAtop'.
    DestinationAtop,
    /// The composite mode 'Xor'.
    Xor,
    /// The composite mode 'Plus'.
    Plus,
    /// The composite mode 'Modulate'.
    Modulate,
    /// The composite mode 'Screen'.
    Screen,
    /// The composite mode 'Overlay'.
    Overlay,
    /// The composite mode 'Darken'.
    Darken,
    /// The composite mode 'Lighten'.
    Lighten,
    /// The composite mode 'ColorDodge'.
    ColorDodge,
    /// The composite mode 'ColorBurn'.
    ColorBurn,
    /// The composite mode 'HardLight'.
    HardLight,
    /// The composite mode 'SoftLight'.
    SoftLight,
    /// The composite mode 'Difference'.
    Difference,
    /// The composite mode 'Exclusion'.
    Exclusion,
    /// The composite mode 'Multiply'.
    Multiply,
    /// The composite mode 'Hue'.
    Hue,
    /// The composite mode 'Saturation'.
    Saturation,
    /// The composite mode 'Color'.
    Color,
    /// The composite mode 'Luminosity'.
    Luminosity,
}

/// How a draw with a given blend mode ends up in the content stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Treatment {
    /// Written directly, with the mode in the graphics state.
    Native,
    /// Written directly, but behind everything drawn so far.
    DrawBehind,
    /// The draw has no visible effect.
    Skip,
    /// The source is isolated and recombined with the destination.
    Isolate,
    /// No faithful representation exists. The draw falls back to normal
    /// compositing.
    Unsupported,
}

impl BlendMode {
    /// The name of the mode in an ExtGState. Modes without a PDF
    /// equivalent are drawn with `Normal` and emulated around it.
    pub(crate) fn pdf_name(self) -> &'static str {
        match self {
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Multiply => "Multiply",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
            _ => "Normal",
        }
    }

    /// A source that is opaque wherever it draws makes `Source` identical to
    /// `SourceOver`.
    pub(crate) fn normalized(self, opaque: bool) -> BlendMode {
        match self {
            BlendMode::Source if opaque => BlendMode::SourceOver,
            mode => mode,
        }
    }

    pub(crate) fn treatment(self, opaque: bool) -> Treatment {
        match self.normalized(opaque) {
            BlendMode::Destination => Treatment::Skip,
            BlendMode::DestinationIn if opaque => Treatment::Skip,
            BlendMode::DestinationOver => Treatment::DrawBehind,
            BlendMode::Xor | BlendMode::Plus => Treatment::Unsupported,
            BlendMode::Clear
            | BlendMode::Source
            | BlendMode::SourceIn
            | BlendMode::DestinationIn
            | BlendMode::SourceOut
            | BlendMode::DestinationOut
            | BlendMode::SourceAtop
            | BlendMode::DestinationAtop
            | BlendMode::Modulate => Treatment::Isolate,
            _ => Treatment::Native,
        }
    }

    /// Whether an isolated draw onto an empty destination leaves anything
    /// visible. If it does, the source can be drawn directly.
    pub(crate) fn draws_on_empty_destination(self) -> bool {
        matches!(
            self,
            BlendMode::Source | BlendMode::SourceOut | BlendMode::DestinationAtop
        )
    }
}

/// A snapshot taken while decomposing a draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Layer {
    /// Everything that was drawn before the draw.
    Destination,
    /// The draw on its own.
    Source,
    /// The coverage of the draw, filled opaque black.
    Shape,
}

/// A soft mask made from the alpha of a layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct LayerMask {
    pub(crate) layer: Layer,
    pub(crate) inverted: bool,
}

/// One draw of a layer during recombination.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CompositeStep {
    pub(crate) layer: Layer,
    pub(crate) mask: Option<LayerMask>,
    pub(crate) multiply: bool,
}

impl CompositeStep {
    const fn plain(layer: Layer) -> Self {
        Self {
            layer,
            mask: None,
            multiply: false,
        }
    }

    const fn masked(layer: Layer, mask: Layer, inverted: bool) -> Self {
        Self {
            layer,
            mask: Some(LayerMask {
                layer: mask,
                inverted,
            }),
            multiply: false,
        }
    }

    const fn multiplied(self) -> Self {
        Self {
            multiply: true,
            ..self
        }
    }

    /// Use the alpha of the source where no shape is available. This is
    /// exact for opaque sources only.
    pub(crate) fn without_shape(self) -> Self {
        let replace = |layer| match layer {
            Layer::Shape => Layer::Source,
            layer => layer,
        };

        Self {
            layer: replace(self.layer),
            mask: self.mask.map(|mask| LayerMask {
                layer: replace(mask.layer),
                ..mask
            }),
            ..self
        }
    }

    pub(crate) fn uses(&self, layer: Layer) -> bool {
        self.layer == layer || self.mask.is_some_and(|mask| mask.layer == layer)
    }
}

use CompositeStep as Step;
use Layer::{Destination as D, Shape as K, Source as S};

const CLEAR: &[Step] = &[Step::masked(D, K, true)];
const REDRAW_DESTINATION: &[Step] = &[Step::plain(D)];
const SOURCE: &[Step] = &[Step::masked(D, K, true), Step::plain(S)];
const SOURCE_IN_OPAQUE: &[Step] = &[Step::plain(D), Step::masked(S, D, false)];
const SOURCE_IN: &[Step] = &[Step::masked(D, K, true), Step::masked(S, D, false)];
const SOURCE_OUT: &[Step] = &[Step::masked(D, K, true), Step::masked(S, D, true)];
const DESTINATION_IN: &[Step] = &[Step::masked(D, K, true), Step::masked(D, S, false)];
const DESTINATION_OUT: &[Step] = &[Step::masked(D, S, true)];
const SOURCE_ATOP: &[Step] = &[Step::plain(D), Step::masked(S, D, false)];
const DESTINATION_ATOP_OPAQUE: &[Step] = &[Step::plain(S), Step::plain(D)];
const DESTINATION_ATOP: &[Step] = &[
    Step::masked(D, K, true),
    Step::masked(S, D, true),
    Step::masked(D, S, false),
];
const MODULATE_OPAQUE: &[Step] = &[Step::plain(D), Step::masked(S, D, false).multiplied()];
// Only exact when the source is opaque.
const MODULATE: &[Step] = &[
    Step::masked(D, K, true),
    Step::masked(S, D, false),
    Step::masked(D, S, false).multiplied(),
];

/// The steps that recombine the destination with an isolated source.
///
/// The plans are exact as long as the destination alpha is either 0 or 1 at
/// every point, with the exception of `Modulate` with a translucent source.
/// `source_empty` is set when the source left nothing visible in its
/// snapshot, and `has_shape` when a coverage shape was recorded.
pub(crate) fn composite_plan(
    mode: BlendMode,
    opaque: bool,
    source_empty: bool,
    has_shape: bool,
) -> &'static [CompositeStep] {
    if source_empty {
        return if !has_shape
            || matches!(mode, BlendMode::DestinationOut | BlendMode::SourceAtop)
        {
            REDRAW_DESTINATION
        } else {
            CLEAR
        };
    }

    match (mode, opaque) {
        (BlendMode::Clear, _) => CLEAR,
        (BlendMode::Source, _) => SOURCE,
        (BlendMode::SourceIn, true) => SOURCE_IN_OPAQUE,
        (BlendMode::SourceIn, false) => SOURCE_IN,
        (BlendMode::SourceOut, _) => SOURCE_OUT,
        (BlendMode::DestinationIn, _) => DESTINATION_IN,
        (BlendMode::DestinationOut, _) => DESTINATION_OUT,
        (BlendMode::SourceAtop, _) => SOURCE_ATOP,
        (BlendMode::DestinationAtop, true) => DESTINATION_ATOP_OPAQUE,
        (BlendMode::DestinationAtop, false) => DESTINATION_ATOP,
        (BlendMode::Modulate, true) => MODULATE_OPAQUE,
        (BlendMode::Modulate, false) => MODULATE,
        _ => REDRAW_DESTINATION,
    }
}
