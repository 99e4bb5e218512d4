//! Paints that can be used for filling and stroking text or paths.

use crate::blend_mode::BlendMode;
use crate::path::Stroke;
use tiny_skia_path::{NormalizedF32, Transform};

/// An opaque RGB color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Create a new RGB color.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a black RGB color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Create a white RGB color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub(crate) fn to_pdf_components(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// A color stop of a gradient.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stop {
    /// The offset of the stop, between 0 and 1.
    pub offset: NormalizedF32,
    /// The color of the stop.
    pub color: Color,
}

impl Stop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self {
            offset: NormalizedF32::new_clamped(offset),
            color,
        }
    }
}

/// A linear gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    /// The x coordinate of the first point.
    pub x1: f32,
    /// The y coordinate of the first point.
    pub y1: f32,
    /// The x coordinate of the second point.
    pub x2: f32,
    /// The y coordinate of the second point.
    pub y2: f32,
    /// A transform that should be applied to the linear gradient.
    pub transform: Transform,
    /// The color stops of the linear gradient.
    pub stops: Vec<Stop>,
}

/// A two-point conical gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    /// The x coordinate of the start circle.
    pub fx: f32,
    /// The y coordinate of the start circle.
    pub fy: f32,
    /// The radius of the start circle.
    pub fr: f32,
    /// The x coordinate of the end circle.
    pub cx: f32,
    /// The y coordinate of the end circle.
    pub cy: f32,
    /// The radius of the end circle.
    pub cr: f32,
    /// A transform that should be applied to the radial gradient.
    pub transform: Transform,
    /// The color stops of the radial gradient.
    pub stops: Vec<Stop>,
}

/// A shader, which determines the color of every point that is painted.
#[derive(Debug, Clone, PartialEq)]
pub enum Shader {
    LinearGradient(LinearGradient),
    RadialGradient(RadialGradient),
}

impl Shader {
    pub(crate) fn stops(&self) -> &[Stop] {
        match self {
            Shader::LinearGradient(lg) => &lg.stops,
            Shader::RadialGradient(rg) => &rg.stops,
        }
    }

    pub(crate) fn transform(&self) -> Transform {
        match self {
            Shader::LinearGradient(lg) => lg.transform,
            Shader::RadialGradient(rg) => rg.transform,
        }
    }

    /// The color of a shader that paints a single color everywhere.
    pub(crate) fn as_color(&self) -> Option<Color> {
        let (first, rest) = self.stops().split_first()?;
        rest.iter()
            .all(|stop| stop.color == first.color)
            .then_some(first.color)
    }
}

/// How the geometry of a draw is painted.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PaintStyle {
    #[default]
    Fill,
    Stroke(Stroke),
    FillAndStroke(Stroke),
}

impl PaintStyle {
    pub(crate) fn stroke(&self) -> Option<&Stroke> {
        match self {
            PaintStyle::Fill => None,
            PaintStyle::Stroke(stroke) | PaintStyle::FillAndStroke(stroke) => Some(stroke),
        }
    }
}

/// A paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    /// The color that is used when there is no shader.
    pub color: Color,
    /// An optional shader that replaces the color.
    pub shader: Option<Shader>,
    /// The opacity that is applied on top of the color or shader.
    pub opacity: NormalizedF32,
    /// How the paint is composited with what is already drawn.
    pub blend_mode: BlendMode,
    /// Whether the geometry is filled, stroked, or both.
    pub style: PaintStyle,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::black(),
            shader: None,
            opacity: NormalizedF32::ONE,
            blend_mode: BlendMode::default(),
            style: PaintStyle::Fill,
        }
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

impl Paint {
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = NormalizedF32::new_clamped(opacity);
        self
    }

    #[must_use]
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    #[must_use]
    pub fn with_shader(mut self, shader: Shader) -> Self {
        self.shader = Some(shader);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: PaintStyle) -> Self {
        self.style = style;
        self
    }

    /// Whether everything this paint covers is painted fully opaque.
    pub(crate) fn is_opaque(&self) -> bool {
        // Gradient stops are always opaque.
        self.opacity == NormalizedF32::ONE
    }

    /// Replace a shader that only paints one color with that color.
    pub(crate) fn simplified(&self) -> Paint {
        match self.shader.as_ref().and_then(Shader::as_color) {
            Some(color) => Paint {
                color,
                shader: None,
                ..self.clone()
            },
            None => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(colors: &[Color]) -> Shader {
        Shader::LinearGradient(LinearGradient {
            x1: 0.0,
            y1: 0.0,
            x2: 100.0,
            y2: 0.0,
            transform: Transform::identity(),
            stops: colors
                .iter()
                .enumerate()
                .map(|(i, c)| Stop::new(i as f32 / (colors.len() - 1).max(1) as f32, *c))
                .collect(),
        })
    }

    #[test]
    fn single_color_shader_becomes_color() {
        let red = Color::new(255, 0, 0);
        let paint = Paint::default().with_shader(gradient(&[red, red, red]));
        let simplified = paint.simplified();

        assert_eq!(simplified.shader, None);
        assert_eq!(simplified.color, red);
    }

    #[test]
    fn multi_color_shader_is_kept() {
        let paint =
            Paint::default().with_shader(gradient(&[Color::black(), Color::white()]));
        assert!(paint.simplified().shader.is_some());
    }

    #[test]
    fn opacity_controls_opaqueness() {
        assert!(Paint::default().is_opaque());
        assert!(!Paint::default().with_opacity(0.5).is_opaque());
    }
}
