use crate::graph::ObjRef;
use crate::primitive::{Dict, Object};
use std::collections::HashMap;

/// The resources a content stream refers to by name.
///
/// Resources are keyed by object identity: registering the same object twice
/// yields the same name, while two distinct objects always get two names.
#[derive(Debug, Clone)]
pub(crate) struct ResourceDictionary {
    pub(crate) ext_g_states: ResourceMapper,
    pub(crate) patterns: ResourceMapper,
    pub(crate) x_objects: ResourceMapper,
    pub(crate) fonts: ResourceMapper,
}

impl Default for ResourceDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceDictionary {
    pub(crate) fn new() -> Self {
        Self {
            ext_g_states: ResourceMapper::new(ResourceKind::ExtGState),
            patterns: ResourceMapper::new(ResourceKind::Pattern),
            x_objects: ResourceMapper::new(ResourceKind::XObject),
            fonts: ResourceMapper::new(ResourceKind::Font),
        }
    }

    pub(crate) fn register_ext_g_state(&mut self, r: ObjRef) -> String {
        self.ext_g_states.remap_with_name(r)
    }

    pub(crate) fn register_pattern(&mut self, r: ObjRef) -> String {
        self.patterns.remap_with_name(r)
    }

    pub(crate) fn register_x_object(&mut self, r: ObjRef) -> String {
        self.x_objects.remap_with_name(r)
    }

    pub(crate) fn register_font(&mut self, r: ObjRef) -> String {
        self.fonts.remap_with_name(r)
    }

    pub(crate) fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        dict.insert(
            "ProcSet",
            Object::Array(
                ["PDF", "Text", "ImageB", "ImageC", "ImageI"]
                    .into_iter()
                    .map(Object::name)
                    .collect(),
            ),
        );

        for mapper in [
            &self.ext_g_states,
            &self.patterns,
            &self.x_objects,
            &self.fonts,
        ] {
            if !mapper.is_empty() {
                dict.insert(mapper.kind.dict_name(), mapper.to_dict());
            }
        }

        dict
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    ExtGState,
    Pattern,
    XObject,
    Font,
}

impl ResourceKind {
    fn prefix(self) -> &'static str {
        match self {
            ResourceKind::ExtGState => "G",
            ResourceKind::Pattern => "P",
            ResourceKind::XObject => "X",
            ResourceKind::Font => "F",
        }
    }

    fn dict_name(self) -> &'static str {
        match self {
            ResourceKind::ExtGState => "ExtGState",
            ResourceKind::Pattern => "Pattern",
            ResourceKind::XObject => "XObject",
            ResourceKind::Font => "Font",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResourceMapper {
    kind: ResourceKind,
    forward: Vec<ObjRef>,
    backward: HashMap<ObjRef, ResourceNumber>,
}

impl ResourceMapper {
    pub(crate) fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            forward: Vec::new(),
            backward: HashMap::new(),
        }
    }

    pub(crate) fn remap(&mut self, resource: ObjRef) -> ResourceNumber {
        let forward = &mut self.forward;

        *self.backward.entry(resource).or_insert_with(|| {
            let old = forward.len();
            forward.push(resource);
            old as ResourceNumber
        })
    }

    pub(crate) fn remap_with_name(&mut self, resource: ObjRef) -> String {
        let num = self.remap(resource);
        self.name_from_number(num)
    }

    fn name_from_number(&self, num: ResourceNumber) -> String {
        format!("{}{}", self.kind.prefix(), num)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub(crate) fn get_entries(&self) -> impl Iterator<Item = (String, ObjRef)> + '_ {
        self.forward
            .iter()
            .enumerate()
            .map(|(i, r)| (self.name_from_number(i as ResourceNumber), *r))
    }

    fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        for (name, r) in self.get_entries() {
            dict.insert(&name, r);
        }
        dict
    }
}

pub(crate) type ResourceNumber = u32;
