//! Gradients as shading patterns.

use crate::graph::ObjRef;
use crate::paint::{Color, Shader, Stop};
use crate::primitive::{Dict, Object};
use crate::serialize::SerializeContext;
use crate::util::{HashExt, TransformExt};
use siphasher::sip128::{Hasher128, SipHasher13};
use std::hash::Hash;
use tiny_skia_path::Transform;

/// The pattern that paints `shader`, where `transform` maps the shader
/// coordinates to the default coordinate space of the content stream.
///
/// Returns `None` for a shader without any stops.
pub(crate) fn register_shader(
    sc: &mut SerializeContext,
    shader: &Shader,
    transform: Transform,
) -> Option<ObjRef> {
    let stops = padded_stops(shader.stops())?;
    let key = shading_key(shader, transform);
    if let Some(r) = sc.canon.patterns.get(&key) {
        return Some(*r);
    }

    let mut shading = Dict::new();
    match shader {
        Shader::LinearGradient(lg) => {
            shading.insert("ShadingType", 2i64);
            shading.insert("Coords", Object::reals([lg.x1, lg.y1, lg.x2, lg.y2]));
        }
        Shader::RadialGradient(rg) => {
            shading.insert("ShadingType", 3i64);
            shading.insert(
                "Coords",
                Object::reals([rg.fx, rg.fy, rg.fr, rg.cx, rg.cy, rg.cr]),
            );
        }
    }
    shading.insert("ColorSpace", Object::name("DeviceRGB"));
    shading.insert("Function", function(&stops));
    shading.insert("Extend", Object::Array(vec![true.into(), true.into()]));

    let mut pattern = Dict::typed("Pattern");
    pattern.insert("PatternType", 2i64);
    pattern.insert("Matrix", transform.to_pdf_array());
    pattern.insert("Shading", shading);

    let r = sc.graph.alloc(pattern);
    sc.canon.patterns.insert(key, r);
    Some(r)
}

/// Make sure the stops cover the whole range from 0 to 1.
fn padded_stops(stops: &[Stop]) -> Option<Vec<Stop>> {
    let first = stops.first()?;
    let last = stops.last()?;

    let mut padded = Vec::with_capacity(stops.len() + 2);
    if first.offset.get() > 0.0 {
        padded.push(Stop::new(0.0, first.color));
    }
    padded.extend_from_slice(stops);
    if last.offset.get() < 1.0 || padded.len() == 1 {
        padded.push(Stop::new(1.0, last.color));
    }

    Some(padded)
}

fn function(stops: &[Stop]) -> Object {
    if let [a, b] = stops {
        return interpolation(a.color, b.color).into();
    }

    let pairs = stops.windows(2);
    let mut functions = vec![];
    let mut bounds = vec![];
    let mut encode = vec![];

    for pair in pairs {
        functions.push(interpolation(pair[0].color, pair[1].color).into());
        encode.extend([0.0, 1.0]);
    }

    for stop in &stops[1..stops.len() - 1] {
        bounds.push(stop.offset.get());
    }

    let mut dict = Dict::new();
    dict.insert("FunctionType", 3i64);
    dict.insert("Domain", Object::reals([0.0, 1.0]));
    dict.insert("Functions", Object::Array(functions));
    dict.insert("Bounds", Object::reals(bounds));
    dict.insert("Encode", Object::reals(encode));
    dict.into()
}

fn interpolation(c0: Color, c1: Color) -> Dict {
    let mut dict = Dict::new();
    dict.insert("FunctionType", 2i64);
    dict.insert("Domain", Object::reals([0.0, 1.0]));
    dict.insert("C0", Object::reals(c0.to_pdf_components()));
    dict.insert("C1", Object::reals(c1.to_pdf_components()));
    dict.insert("N", 1i64);
    dict
}

fn shading_key(shader: &Shader, transform: Transform) -> u128 {
    let mut state = SipHasher13::new();

    match shader {
        Shader::LinearGradient(lg) => {
            0u8.hash(&mut state);
            for value in [lg.x1, lg.y1, lg.x2, lg.y2] {
                value.to_bits().hash(&mut state);
            }
        }
        Shader::RadialGradient(rg) => {
            1u8.hash(&mut state);
            for value in [rg.fx, rg.fy, rg.fr, rg.cx, rg.cy, rg.cr] {
                value.to_bits().hash(&mut state);
            }
        }
    }

    for stop in shader.stops() {
        stop.offset.get().to_bits().hash(&mut state);
        stop.color.hash(&mut state);
    }

    HashExt::hash(&transform, &mut state);
    state.finish128().as_u128()
}
