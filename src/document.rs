//! Documents, the entry point for creating a PDF.
//!
//! A [`Document`] owns everything that is shared between pages: the object
//! graph, the serializer and the per-document caches. Pages are started one
//! at a time and their content is written out as soon as they are finished,
//! so only the page objects and fonts are held until [`Document::finish`].

use crate::error::FolioResult;
use crate::graph::{ObjRef, ObjectGraph};
use crate::metadata::Metadata;
use crate::object::page::{Page, PageSettings};
use crate::path::PathOps;
use crate::primitive::{Dict, Object};
use crate::serialize::{SerializeContext, SerializeSettings};
use crate::util::{format_uuid, hash128};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, debug_span, warn};

/// The maximum number of kids of a node in the page tree.
const PAGE_TREE_FAN_OUT: usize = 8;

/// A PDF document.
pub struct Document {
    sc: SerializeContext,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new document with default settings.
    pub fn new() -> Self {
        Self::new_with(SerializeSettings::default())
    }

    /// Create a new document with specific settings.
    pub fn new_with(settings: SerializeSettings) -> Self {
        Self {
            sc: SerializeContext::new(settings),
        }
    }

    /// Set the metadata of the document.
    ///
    /// The metadata is written when the first page is started, later calls
    /// have no effect.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        if self.sc.info.is_some() {
            warn!("metadata was set after the first page, ignoring it");
            return;
        }

        self.sc.metadata = metadata;
    }

    /// Replace the boolean path operations used for clips and inverse fills.
    pub fn set_path_ops(&mut self, path_ops: Box<dyn PathOps>) {
        self.sc.path_ops = path_ops;
    }

    /// Start a new page with default settings.
    pub fn start_page(&mut self) -> Page<'_> {
        self.start_page_with(PageSettings::default())
    }

    /// Start a new page with specific settings.
    pub fn start_page_with(&mut self, page_settings: PageSettings) -> Page<'_> {
        if self.sc.info.is_none() {
            if let Err(error) = self.start_document() {
                self.sc.poison(error);
            }
        }

        Page::new(&mut self.sc, page_settings)
    }

    /// Write everything that comes before the first page.
    ///
    /// Images are written as soon as they are drawn, so the document
    /// information has to be in place before any page content exists.
    fn start_document(&mut self) -> FolioResult<()> {
        debug!("starting document");

        let info = self.sc.graph.alloc(self.sc.metadata.document_info());
        self.sc
            .serializer
            .add_document_info(&mut self.sc.graph, info)?;
        self.sc.info = Some(info);

        if self.sc.settings.pdfa {
            let (document_id, instance_id) = document_ids(&self.sc.metadata);
            let xmp = self.sc.metadata.xmp_metadata(
                &format!("uuid:{}", format_uuid(document_id)),
                &format!("uuid:{}", format_uuid(instance_id)),
            );
            let stream = self.sc.raw_stream(
                Dict::typed("Metadata").with("Subtype", Object::name("XML")),
                xmp.into_bytes(),
            );
            let xmp = self.sc.graph.alloc(stream);
            self.sc.add_and_write(xmp)?;

            self.sc.xmp = Some(xmp);
            self.sc.file_id = Some((document_id.to_vec(), instance_id.to_vec()));
        }

        Ok(())
    }

    /// Discard everything drawn so far, including the pages that were
    /// already finished.
    ///
    /// The document starts over afterwards. Its settings, metadata and path
    /// operations are kept.
    pub fn abort(&mut self) {
        debug!("aborting document with {} pages", self.sc.pages.len());
        self.sc.reset();
    }

    /// Write the remaining objects and the trailer, and return the bytes of
    /// the PDF.
    ///
    /// A document without pages produces no output.
    pub fn finish(mut self) -> FolioResult<Vec<u8>> {
        let _span = debug_span!("finish_document").entered();
        self.sc.check()?;

        let (Some(_), Some(page_tree)) = (
            self.sc.info,
            build_page_tree(&mut self.sc.graph, &self.sc.pages)?,
        ) else {
            debug!("document has no pages, producing no output");
            return Ok(vec![]);
        };

        self.sc.canon.write_fonts(&mut self.sc.graph)?;

        let mut catalog = Dict::typed("Catalog");
        catalog.insert("Pages", page_tree);

        if !self.sc.named_destinations.is_empty() {
            let mut dests = Dict::new();
            for (name, destination) in std::mem::take(&mut self.sc.named_destinations) {
                dests.insert(&name, destination);
            }
            catalog.insert("Dests", dests);
        }

        if let Some(xmp) = self.sc.xmp {
            catalog.insert("Metadata", xmp);
            catalog.insert("OutputIntents", Object::Array(vec![output_intent().into()]));
        }

        let catalog = self.sc.graph.alloc(catalog);
        let file_id = self.sc.file_id.take();
        self.sc
            .serializer
            .serialize_footer(&mut self.sc.graph, catalog, file_id)?;

        debug!("finished document with {} pages", self.sc.pages.len());
        Ok(self.sc.serializer.into_bytes())
    }
}

/// Group the pages into a tree of `Pages` nodes, bottom-up, and return the
/// root of the tree.
fn build_page_tree(graph: &mut ObjectGraph, pages: &[ObjRef]) -> FolioResult<Option<ObjRef>> {
    // The root of the tree must be a `Pages` node, even for one page.
    if let [page] = pages {
        return pages_node(graph, &[(*page, 1)], 1).map(Some);
    }

    // Each node together with the number of pages below it.
    let mut level = pages.iter().map(|page| (*page, 1)).collect::<Vec<_>>();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(PAGE_TREE_FAN_OUT));

        for kids in level.chunks(PAGE_TREE_FAN_OUT) {
            // A lone node moves up a level instead of getting a parent of
            // its own.
            if let [kid] = kids {
                next.push(*kid);
                continue;
            }

            let count = kids.iter().map(|(_, count)| count).sum();
            let node = pages_node(graph, kids, count)?;
            next.push((node, count));
        }

        level = next;
    }

    Ok(level.first().map(|(root, _)| *root))
}

fn pages_node(graph: &mut ObjectGraph, kids: &[(ObjRef, i64)], count: i64) -> FolioResult<ObjRef> {
    let node = graph.alloc(
        Dict::typed("Pages")
            .with("Kids", kids.iter().map(|(kid, _)| Object::Ref(*kid)).collect::<Vec<_>>())
            .with("Count", Object::Int(count)),
    );

    for (kid, _) in kids {
        if let Some(kid) = graph.get_mut(*kid)?.as_dict_mut() {
            kid.insert("Parent", node);
        }
    }

    Ok(node)
}

/// The document and instance id of a PDF/A document.
fn document_ids(metadata: &Metadata) -> ([u8; 16], [u8; 16]) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or_default();

    let document_id = hash128(&(metadata, now)).to_be_bytes();
    let instance_id = hash128(&(document_id, "instance")).to_be_bytes();

    (document_id, instance_id)
}

fn output_intent() -> Dict {
    const PROFILE: &str = "sRGB IEC61966-2.1";

    Dict::typed("OutputIntent")
        .with("S", Object::name("GTS_PDFA1"))
        .with("OutputConditionIdentifier", Object::text(PROFILE))
        .with("RegistryName", Object::text("http://www.color.org"))
        .with("Info", Object::text(PROFILE))
}
