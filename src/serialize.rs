use crate::canon::Canon;
use crate::error::{FolioError, FolioResult};
use crate::graph::{ObjRef, ObjectGraph, ObjectNumbering};
use crate::metadata::Metadata;
use crate::path::{BasicPathOps, PathOps};
use crate::primitive::{to_pdf_ref, Dict, Object, Stream};
use pdf_writer::Pdf;
use tracing::{debug_span, trace};

/// Settings that should be applied when creating a PDF document.
#[derive(Copy, Clone, Debug)]
pub struct SerializeSettings {
    /// Whether content streams, form XObjects and image data should be
    /// compressed with deflate.
    pub compress_content_streams: bool,
    /// The resolution of the drawing device, in dots per inch. Drawing
    /// happens in device units and the page content is scaled back to PDF
    /// points by the initial transform.
    pub raster_dpi: f32,
    /// Whether to emit the identification PDF/A-2b requires.
    ///
    /// This is the only setting that makes the output non-deterministic, since
    /// the document id is derived from the current time.
    pub pdfa: bool,
}

impl SerializeSettings {
    #[cfg(test)]
    pub(crate) fn default_test() -> Self {
        Self {
            compress_content_streams: false,
            raster_dpi: 72.0,
            pdfa: false,
        }
    }
}

impl Default for SerializeSettings {
    fn default() -> Self {
        Self {
            compress_content_streams: true,
            raster_dpi: 72.0,
            pdfa: false,
        }
    }
}

/// Writes numbered objects into a [`Pdf`], which also takes care of the
/// header and the cross-reference table.
pub(crate) struct Serializer {
    pdf: Pdf,
    numbering: ObjectNumbering,
    /// How many entries of the numbering order have been looked at.
    visited: usize,
    /// Numbered objects that were still reserved when their turn came.
    deferred: Vec<ObjRef>,
    info: Option<ObjRef>,
    catalog: Option<ObjRef>,
}

impl Serializer {
    pub(crate) fn new() -> Self {
        let mut pdf = Pdf::new();
        pdf.set_version(1, 4);
        pdf.set_binary_marker(b"\xD3\xEB\xE9\xE1");

        Self {
            pdf,
            numbering: ObjectNumbering::default(),
            visited: 0,
            deferred: vec![],
            info: None,
            catalog: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn numbering(&self) -> &ObjectNumbering {
        &self.numbering
    }

    /// Number the object and everything reachable from it, then write all
    /// objects that have been numbered but not written yet.
    pub(crate) fn add_and_write(
        &mut self,
        graph: &mut ObjectGraph,
        root: ObjRef,
    ) -> FolioResult<()> {
        self.numbering.add_recursively(graph, root)?;
        self.serialize_objects(graph)
    }

    /// Like [`Serializer::add_and_write`], for the document information
    /// dictionary the trailer points to.
    pub(crate) fn add_document_info(
        &mut self,
        graph: &mut ObjectGraph,
        info: ObjRef,
    ) -> FolioResult<()> {
        self.info = Some(info);
        self.add_and_write(graph, info)
    }

    /// Write all pending objects in the order of their numbers. Written objects
    /// are dropped from the graph. Reserved objects are skipped until they have
    /// been filled.
    pub(crate) fn serialize_objects(&mut self, graph: &mut ObjectGraph) -> FolioResult<()> {
        for r in std::mem::take(&mut self.deferred) {
            if graph.is_reserved(r) {
                self.deferred.push(r);
            } else {
                self.write_object(graph, r)?;
            }
        }

        while self.visited < self.numbering.len() {
            let r = self.numbering.order()[self.visited];
            self.visited += 1;

            if graph.is_reserved(r) {
                self.deferred.push(r);
            } else {
                self.write_object(graph, r)?;
            }
        }

        Ok(())
    }

    fn write_object(&mut self, graph: &mut ObjectGraph, r: ObjRef) -> FolioResult<()> {
        let object = graph.take(r)?;

        // A filled placeholder can point at objects nobody has seen yet.
        let mut children = vec![];
        object.for_each_ref(&mut |child| children.push(child));
        for child in children {
            self.numbering.add_recursively(graph, child)?;
        }

        let numbering = &self.numbering;
        let number = |r| numbering.number(r);
        let id = to_pdf_ref(r, &number)?;
        trace!("writing object {}", id.get());

        match object {
            Object::Stream(stream) => {
                let mut writer = self.pdf.stream(id, &stream.data);
                stream.dict.write_entries(&mut writer, &number)?;
            }
            Object::Dict(mut dict) if Some(r) == self.catalog => {
                // The catalog writer adds the type itself.
                dict.remove("Type");
                dict.write_entries(&mut self.pdf.catalog(id), &number)?;
            }
            Object::Dict(dict) if Some(r) == self.info => {
                dict.write_entries(&mut self.pdf.document_info(id), &number)?;
            }
            object => object.write(self.pdf.indirect(id), &number)?,
        }

        Ok(())
    }

    /// Write everything that is still pending, ending with the catalog.
    ///
    /// No new object may be discovered afterwards. The cross-reference table
    /// and the trailer are written by [`Serializer::into_bytes`].
    pub(crate) fn serialize_footer(
        &mut self,
        graph: &mut ObjectGraph,
        catalog: ObjRef,
        file_id: Option<(Vec<u8>, Vec<u8>)>,
    ) -> FolioResult<()> {
        let _span = debug_span!("serialize_footer").entered();

        self.catalog = Some(catalog);
        self.numbering.add_recursively(graph, catalog)?;
        self.serialize_objects(graph)?;
        if let Some(r) = self.deferred.first() {
            return Err(FolioError::UnresolvedObject(*r));
        }
        self.numbering.start_footer();

        if let Some(file_id) = file_id {
            self.pdf.set_file_id(file_id);
        }

        Ok(())
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.pdf.finish()
    }
}

/// Everything that is shared by all pages of a document.
pub(crate) struct SerializeContext {
    pub(crate) graph: ObjectGraph,
    pub(crate) serializer: Serializer,
    pub(crate) canon: Canon,
    pub(crate) settings: SerializeSettings,
    pub(crate) path_ops: Box<dyn PathOps>,
    pub(crate) metadata: Metadata,
    pub(crate) pages: Vec<ObjRef>,
    pub(crate) named_destinations: Vec<(String, Object)>,
    pub(crate) info: Option<ObjRef>,
    pub(crate) xmp: Option<ObjRef>,
    pub(crate) file_id: Option<(Vec<u8>, Vec<u8>)>,
    error: Option<FolioError>,
}

impl SerializeContext {
    pub(crate) fn new(settings: SerializeSettings) -> Self {
        Self {
            graph: ObjectGraph::new(),
            serializer: Serializer::new(),
            canon: Canon::default(),
            settings,
            path_ops: Box::new(BasicPathOps),
            metadata: Metadata::default(),
            pages: vec![],
            named_destinations: vec![],
            info: None,
            xmp: None,
            file_id: None,
            error: None,
        }
    }

    /// Drop all accumulated state, keeping the settings, the metadata and the
    /// path operations.
    pub(crate) fn reset(&mut self) {
        let mut fresh = Self::new(self.settings);
        std::mem::swap(&mut fresh.path_ops, &mut self.path_ops);
        fresh.metadata = std::mem::take(&mut self.metadata);
        *self = fresh;
    }

    /// Remember the first fatal error. Every later attempt to produce output
    /// returns it.
    pub(crate) fn poison(&mut self, error: FolioError) {
        if self.error.is_none() {
            tracing::debug!("document poisoned: {error}");
            self.error = Some(error);
        }
    }

    pub(crate) fn check(&self) -> FolioResult<()> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    pub(crate) fn add_and_write(&mut self, root: ObjRef) -> FolioResult<()> {
        self.serializer.add_and_write(&mut self.graph, root)
    }

    /// Create a stream, compressing the data if the settings ask for it.
    pub(crate) fn stream(&self, dict: Dict, data: Vec<u8>) -> Stream {
        self.maybe_compress(dict, data, self.settings.compress_content_streams)
    }

    /// Create a stream that is never compressed.
    pub(crate) fn raw_stream(&self, dict: Dict, data: Vec<u8>) -> Stream {
        self.maybe_compress(dict, data, false)
    }

    fn maybe_compress(&self, mut dict: Dict, data: Vec<u8>, compress: bool) -> Stream {
        if compress {
            dict.insert("Filter", Object::name("FlateDecode"));
            Stream::new(dict, deflate(&data))
        } else {
            Stream::new(dict, data)
        }
    }
}

pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    const COMPRESSION_LEVEL: u8 = 6;
    miniz_oxide::deflate::compress_to_vec_zlib(data, COMPRESSION_LEVEL)
}
