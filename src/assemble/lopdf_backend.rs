//! Primary assembly strategy, built on lopdf.
//!
//! The output is a fresh document with a single flat page tree. Each PDF
//! source is loaded from disk, its pages get their inherited attributes
//! copied down, its objects are renumbered past everything already in the
//! output, and its pages are re-parented onto the new root. The source's own
//! catalog and page-tree nodes are left behind.

use lopdf::{Document, Object, ObjectId, dictionary};
use std::path::Path;
use tracing::debug;

use crate::assemble::AssemblyStrategy;
use crate::assemble::image_page::append_image_page;
use crate::error::Result;
use crate::io::reader::PdfReader;
use crate::io::writer::PdfWriter;
use crate::io::{SourceFile, SourceKind};
use crate::utils::flatten_inherited_attributes;

/// Combines sources with lopdf.
#[derive(Debug, Clone, Default)]
pub struct LopdfStrategy {
    reader: PdfReader,
    writer: PdfWriter,
}

impl LopdfStrategy {
    /// Strategy with default reader and writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the combined document in memory.
    ///
    /// # Errors
    ///
    /// Returns the first source that fails to load.
    pub fn build(&self, sources: &[SourceFile]) -> Result<Document> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<ObjectId> = Vec::new();

        for source in sources {
            match source.kind {
                SourceKind::Pdf => self.append_pdf(&mut doc, pages_id, &source.path, &mut kids)?,
                SourceKind::Image(_) => {
                    kids.push(append_image_page(&mut doc, pages_id, &source.path)?);
                }
            }
            debug!(source = %source.path.display(), pages = kids.len(), "appended source");
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
                "Count" => Object::Integer(kids.len() as i64),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc.prune_objects();
        doc.renumber_objects();

        Ok(doc)
    }

    fn append_pdf(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        path: &Path,
        kids: &mut Vec<ObjectId>,
    ) -> Result<()> {
        let mut source = self.reader.load_blocking(path)?.document;

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &page_id in &page_ids {
            flatten_inherited_attributes(&mut source, page_id)?;
        }

        source.renumber_objects_with(doc.max_id + 1);
        doc.max_id = source.max_id;

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

        for (object_id, object) in source.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" => {}
                _ => {
                    doc.objects.insert(object_id, object);
                }
            }
        }

        for page_id in page_ids {
            if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
                page.set("Parent", pages_id);
                kids.push(page_id);
            }
        }

        Ok(())
    }
}

impl AssemblyStrategy for LopdfStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn assemble(&self, sources: &[SourceFile], output: &Path) -> Result<usize> {
        let mut doc = self.build(sources)?;
        let page_count = doc.get_pages().len();
        self.writer.save_blocking(&mut doc, output)?;
        Ok(page_count)
    }
}
