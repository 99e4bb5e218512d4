//! Soft masks.
//!
//! A soft mask turns a form XObject into per-point opacity: either from the
//! alpha of the form, or from its luminosity. Masks can optionally be inverted
//! with a transfer function.

use crate::graph::ObjRef;
use crate::primitive::{Dict, Object};

/// The source of the opacity values of a mask.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub(crate) enum MaskType {
    Luminosity,
    Alpha,
}

impl MaskType {
    pub(crate) fn to_name(self) -> &'static str {
        match self {
            MaskType::Alpha => "Alpha",
            MaskType::Luminosity => "Luminosity",
        }
    }
}

/// A soft mask that is derived from a transparency group.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub(crate) struct Mask {
    group: ObjRef,
    mask_type: MaskType,
    inverted: bool,
}

impl Mask {
    pub(crate) fn new(group: ObjRef, mask_type: MaskType, inverted: bool) -> Self {
        Self {
            group,
            mask_type,
            inverted,
        }
    }

    pub(crate) fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// The mask dictionary. `invert_function` must be given for inverted
    /// masks.
    pub(crate) fn to_dict(&self, invert_function: Option<ObjRef>) -> Dict {
        let mut dict = Dict::typed("Mask");
        dict.insert("S", Object::name(self.mask_type.to_name()));
        dict.insert("G", self.group);

        if self.inverted {
            if let Some(function) = invert_function {
                dict.insert("TR", function);
            }
        }

        dict
    }
}

/// A PostScript calculator function that maps `x` to `1 - x`.
pub(crate) fn invert_function() -> (Dict, Vec<u8>) {
    let mut dict = Dict::new();
    dict.insert("FunctionType", Object::Int(4));
    dict.insert("Domain", Object::reals([0.0, 1.0]));
    dict.insert("Range", Object::reals([0.0, 1.0]));

    (dict, b"{1 exch sub}".to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ObjectGraph;

    #[test]
    fn inverted_mask_has_transfer_function() {
        let mut graph = ObjectGraph::new();
        let group = graph.reserve();
        let function = graph.reserve();

        let dict = Mask::new(group, MaskType::Alpha, true).to_dict(Some(function));
        assert_eq!(dict.get("S"), Some(&Object::name("Alpha")));
        assert_eq!(dict.get("G"), Some(&Object::Ref(group)));
        assert_eq!(dict.get("TR"), Some(&Object::Ref(function)));

        let dict = Mask::new(group, MaskType::Luminosity, false).to_dict(Some(function));
        assert_eq!(dict.get("TR"), None);
    }
}
