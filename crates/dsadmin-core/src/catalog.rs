//! # Dataset Catalog Manager
//!
//! Mutations over an ERDDAP-style `datasets.xml`: a single root element
//! with repeated `<dataset>` children carrying `datasetID`, `type`, and
//! `active` attributes plus an opaque configuration body that this tool
//! does not interpret.
//!
//! ## Round-trip guarantee
//!
//! The catalog file is routinely edited by other tools and by hand, so
//! the parser keeps everything it does not understand. The document is
//! split into raw text segments and dataset entries; untouched entries
//! and all non-dataset content (comments, processing instructions,
//! unknown elements, whitespace) are re-emitted byte-for-byte. Only the
//! records an operation touches are re-rendered.
//!
//! ## Ordering
//!
//! Records keep append order, except that `update` removes the record
//! and re-appends it at the end. Callers must not rely on ordering, but
//! the move is reproduced for compatibility with the files the previous
//! tooling wrote. `set_active` patches in place.
//!
//! Every mutation holds the file's [`FileLock`] for its whole
//! read-modify-write span. The file is the only durable state; nothing
//! is cached between calls.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::lock::{FileLock, LockError};
use crate::record::{decode_latin1, encode_latin1};

const DATASET_TAG: &[u8] = b"dataset";
const ID_ATTR: &str = "datasetID";
const KIND_ATTR: &str = "type";
const ACTIVE_ATTR: &str = "active";

/// Catalog mutation failure.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A record with this id already exists.
    #[error("dataset {0} already exists")]
    DuplicateId(String),

    /// No record with this id exists.
    #[error("no such dataset {0}")]
    NotFound(String),

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// The catalog lock could not be obtained.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Reading or writing the catalog file failed.
    #[error("catalog file error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog document is not well-formed.
    #[error("catalog parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// One managed record, as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    /// Unique identifier, immutable once created.
    pub id: String,
    /// Dataset type tag, set at creation and never altered by update.
    pub kind: String,
    /// Whether the dataset is served.
    pub active: bool,
    /// Opaque configuration fragment.
    pub body: String,
}

/// The catalog: one XML file plus its advisory lock.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    lock: FileLock,
}

impl Catalog {
    /// Catalog over `path`, mutations guarded by a lock with the given
    /// attempt budget.
    pub fn new(path: impl Into<PathBuf>, lock: FileLock) -> Self {
        Self {
            path: path.into(),
            lock,
        }
    }

    /// Convenience constructor building the lock from the target path.
    pub fn open(path: impl Into<PathBuf>, max_attempts: u32, retry_delay: Duration) -> Self {
        let path = path.into();
        let lock = FileLock::new(&path, max_attempts, retry_delay);
        Self { path, lock }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a new record. Fails with [`CatalogError::DuplicateId`] if a
    /// record with `id` already exists, and rejects ill-formed or empty
    /// bodies before touching the file.
    pub fn add(
        &self,
        kind: &str,
        id: &str,
        body: &str,
        active: bool,
        actor: &str,
    ) -> Result<(), CatalogError> {
        validate_fragment(body)?;
        self.mutate(|doc| {
            if doc.find(id).is_some() {
                return Err(CatalogError::DuplicateId(id.to_string()));
            }
            doc.items.push(Item::Dataset(DatasetEntry::build(
                kind,
                id,
                active,
                body.to_string(),
            )));
            Ok(())
        })?;
        tracing::info!(dataset_id = %id, actor = %actor, "dataset added");
        Ok(())
    }

    /// Replace a record's body. `kind` and `id` are preserved no matter
    /// what the new payload contains; `active` is preserved when `None`.
    /// The record moves to the end of the persisted ordering.
    pub fn update(
        &self,
        id: &str,
        body: &str,
        active: Option<bool>,
        actor: &str,
    ) -> Result<(), CatalogError> {
        validate_fragment(body)?;
        self.mutate(|doc| {
            let position = doc
                .position(id)
                .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
            let Item::Dataset(existing) = doc.items.remove(position) else {
                unreachable!("position() only returns dataset items");
            };
            let active = active.unwrap_or_else(|| existing.is_active());
            let kind = existing.attr(KIND_ATTR).unwrap_or_default().to_string();
            doc.items.push(Item::Dataset(DatasetEntry::build(
                &kind,
                id,
                active,
                body.to_string(),
            )));
            Ok(())
        })?;
        tracing::info!(dataset_id = %id, actor = %actor, "dataset updated");
        Ok(())
    }

    /// Flip only the `active` attribute, in place. Unlike [`Catalog::update`]
    /// this preserves ordering and every other attribute on the record.
    pub fn set_active(&self, id: &str, active: bool, actor: &str) -> Result<(), CatalogError> {
        self.mutate(|doc| {
            let position = doc
                .position(id)
                .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
            if let Item::Dataset(entry) = &mut doc.items[position] {
                entry.set_attr(ACTIVE_ATTR, if active { "true" } else { "false" });
            }
            Ok(())
        })?;
        tracing::info!(dataset_id = %id, active, actor = %actor, "dataset active flag updated");
        Ok(())
    }

    /// Set the `active` attribute to `true`.
    pub fn activate(&self, id: &str, actor: &str) -> Result<(), CatalogError> {
        self.set_active(id, true, actor)
    }

    /// Set the `active` attribute to `false`.
    pub fn deactivate(&self, id: &str, actor: &str) -> Result<(), CatalogError> {
        self.set_active(id, false, actor)
    }

    /// Read-only snapshot of every record carrying a `datasetID`.
    ///
    /// Takes no lock: writers replace file content only while holding the
    /// lock, so a read sees either the previous or the next snapshot.
    pub fn records(&self) -> Result<Vec<DatasetRecord>, CatalogError> {
        let doc = self.read_document()?;
        Ok(doc
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Dataset(entry) => entry.attr(ID_ATTR).map(|id| DatasetRecord {
                    id: id.to_string(),
                    kind: entry.attr(KIND_ATTR).unwrap_or_default().to_string(),
                    active: entry.is_active(),
                    body: entry.body.clone(),
                }),
                Item::Raw(_) => None,
            })
            .collect())
    }

    /// Lock, read, mutate, write. An error from `mutate` aborts without
    /// writing; the guard drop releases the marker either way.
    fn mutate<F>(&self, mutate: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut Document) -> Result<(), CatalogError>,
    {
        if !self.path.exists() {
            return Err(CatalogError::Validation(format!(
                "dataset file {} does not exist",
                self.path.display()
            )));
        }
        let _guard = self.lock.acquire()?;
        let source = decode_latin1(&fs::read(&self.path)?);
        let mut doc = parse_document(&source)?;
        mutate(&mut doc)?;
        fs::write(&self.path, encode_latin1(&doc.render()))?;
        Ok(())
    }

    fn read_document(&self) -> Result<Document, CatalogError> {
        let source = decode_latin1(&fs::read(&self.path)?);
        parse_document(&source)
    }
}

// ── Document model ──────────────────────────────────────────────────────────

/// The parsed catalog: interleaved raw text and dataset entries, plus the
/// tail (root closing tag and anything after it). Appending an item puts
/// it immediately before the root closing tag.
#[derive(Debug)]
struct Document {
    items: Vec<Item>,
    tail: String,
}

#[derive(Debug)]
enum Item {
    /// Verbatim text this tool does not interpret.
    Raw(String),
    Dataset(DatasetEntry),
}

impl Document {
    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| {
            matches!(item, Item::Dataset(entry) if entry.attr(ID_ATTR) == Some(id))
        })
    }

    fn find(&self, id: &str) -> Option<&DatasetEntry> {
        self.items.iter().find_map(|item| match item {
            Item::Dataset(entry) if entry.attr(ID_ATTR) == Some(id) => Some(entry),
            _ => None,
        })
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            match item {
                Item::Raw(text) => out.push_str(text),
                Item::Dataset(entry) => out.push_str(&entry.render()),
            }
        }
        out.push_str(&self.tail);
        out
    }
}

/// One `<dataset>` element. `raw` holds the original source text and is
/// cleared by any mutation, forcing a re-render of just this record.
#[derive(Debug, Clone)]
struct DatasetEntry {
    /// Attributes in document order, unknown ones included.
    attrs: Vec<(String, String)>,
    body: String,
    raw: Option<String>,
}

impl DatasetEntry {
    /// A freshly created record. Attribute order matches the files the
    /// previous tooling wrote: active, datasetID, type.
    fn build(kind: &str, id: &str, active: bool, body: String) -> Self {
        Self {
            attrs: vec![
                (ACTIVE_ATTR.into(), if active { "true" } else { "false" }.into()),
                (ID_ATTR.into(), id.to_string()),
                (KIND_ATTR.into(), kind.to_string()),
            ],
            body,
            raw: None,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn is_active(&self) -> bool {
        self.attr(ACTIVE_ATTR) == Some("true")
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        self.raw = None;
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn render(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let mut out = String::from("<dataset");
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&quick_xml::escape::escape(value.as_str()));
            out.push('"');
        }
        out.push('>');
        out.push_str(&self.body);
        out.push_str("</dataset>");
        out
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────────

/// Split the document into raw segments and top-level `<dataset>` entries,
/// recording each entry's source span so untouched records re-emit
/// verbatim.
fn parse_document(src: &str) -> Result<Document, CatalogError> {
    struct Pending {
        raw_start: usize,
        body_start: usize,
        attrs: Vec<(String, String)>,
        nested: usize,
    }

    let mut reader = Reader::from_str(src);
    let mut items = Vec::new();
    let mut tail = String::new();
    let mut cursor = 0usize;
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut pending: Option<Pending> = None;

    loop {
        let pos = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(start) => {
                if pending.is_none() && depth == 1 && start.name().as_ref() == DATASET_TAG {
                    pending = Some(Pending {
                        raw_start: pos,
                        body_start: reader.buffer_position() as usize,
                        attrs: collect_attrs(&start)?,
                        nested: 0,
                    });
                } else if let Some(open) = pending.as_mut() {
                    open.nested += 1;
                }
                depth += 1;
                root_seen = true;
            }
            Event::End(_) => {
                depth -= 1;
                match pending.take() {
                    Some(open) if open.nested == 0 => {
                        let end = reader.buffer_position() as usize;
                        if open.raw_start > cursor {
                            items.push(Item::Raw(src[cursor..open.raw_start].to_string()));
                        }
                        items.push(Item::Dataset(DatasetEntry {
                            attrs: open.attrs,
                            body: src[open.body_start..pos].to_string(),
                            raw: Some(src[open.raw_start..end].to_string()),
                        }));
                        cursor = end;
                    }
                    Some(mut open) => {
                        open.nested -= 1;
                        pending = Some(open);
                    }
                    None if depth == 0 => {
                        // Root closing tag: flush the last raw segment and
                        // capture everything from here on as the tail.
                        if pos > cursor {
                            items.push(Item::Raw(src[cursor..pos].to_string()));
                        }
                        tail = src[pos..].to_string();
                        cursor = src.len();
                    }
                    None => {}
                }
            }
            Event::Empty(start) => {
                if pending.is_none() && depth == 1 && start.name().as_ref() == DATASET_TAG {
                    let end = reader.buffer_position() as usize;
                    if pos > cursor {
                        items.push(Item::Raw(src[cursor..pos].to_string()));
                    }
                    items.push(Item::Dataset(DatasetEntry {
                        attrs: collect_attrs(&start)?,
                        body: String::new(),
                        raw: Some(src[pos..end].to_string()),
                    }));
                    cursor = end;
                } else if pending.is_none() && depth == 0 && !root_seen {
                    // Self-closing root, e.g. a freshly provisioned
                    // `<erddapDatasets/>`. Reopen it so appended records
                    // land inside instead of after it.
                    let end = reader.buffer_position() as usize;
                    if pos > cursor {
                        items.push(Item::Raw(src[cursor..pos].to_string()));
                    }
                    let tag = &src[pos..end];
                    let open = format!("{}>", tag.trim_end_matches('>').trim_end_matches('/'));
                    items.push(Item::Raw(open));
                    let name = start.name().as_ref().to_vec();
                    let name = String::from_utf8_lossy(&name);
                    tail = format!("</{name}>{}", &src[end..]);
                    cursor = src.len();
                    root_seen = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(CatalogError::Validation(
            "catalog document has no root element".to_string(),
        ));
    }
    if cursor < src.len() && tail.is_empty() {
        tail = src[cursor..].to_string();
    }
    Ok(Document { items, tail })
}

fn collect_attrs(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, CatalogError> {
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr =
            attr.map_err(|err| CatalogError::Validation(format!("bad dataset attribute: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| CatalogError::Validation(format!("bad dataset attribute: {err}")))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

/// A body must be a non-empty, well-formed fragment: it is persisted
/// inside the `<dataset>` element, and a broken fragment would corrupt
/// the whole catalog for every consumer.
///
/// The depth tracking matters: quick-xml accepts multiple top-level
/// elements, so a balanced body that closes the wrapper early (e.g.
/// `x</dataset><dataset datasetID="d1">y`) parses cleanly while
/// smuggling sibling records past the duplicate-id check. Anything
/// after the wrapper closes is rejected.
fn validate_fragment(body: &str) -> Result<(), CatalogError> {
    if body.trim().is_empty() {
        return Err(CatalogError::Validation(
            "dataset configuration body must not be empty".to_string(),
        ));
    }
    let wrapped = format!("<dataset>{body}</dataset>");
    let mut reader = Reader::from_str(&wrapped);
    let mut depth = 0usize;
    let mut closed = false;
    loop {
        match reader.read_event() {
            Err(err) => {
                return Err(CatalogError::Validation(format!(
                    "malformed dataset configuration: {err}"
                )))
            }
            Ok(Event::Eof) => return Ok(()),
            Ok(event) => {
                if closed {
                    return Err(CatalogError::Validation(
                        "malformed dataset configuration: content outside the record element"
                            .to_string(),
                    ));
                }
                match event {
                    Event::Start(_) => depth += 1,
                    Event::End(_) => {
                        depth -= 1;
                        if depth == 0 {
                            closed = true;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SEED: &str = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
        <erddapDatasets>\n\
        <!-- managed by dsadmin -->\n\
        <dataset active=\"true\" datasetID=\"d1\" type=\"glider\"><attr>x</attr></dataset>\n\
        <dataset active=\"false\" datasetID=\"d2\" type=\"buoy\" vendor=\"acme\"><attr>y</attr></dataset>\n\
        </erddapDatasets>\n";

    fn seeded_catalog(dir: &TempDir) -> Catalog {
        let path = dir.path().join("datasets.xml");
        fs::write(&path, SEED).unwrap();
        Catalog::open(path, 2, Duration::from_millis(5))
    }

    fn contents(catalog: &Catalog) -> String {
        decode_latin1(&fs::read(catalog.path()).unwrap())
    }

    #[test]
    fn add_appends_before_root_close() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        catalog.add("ship", "d3", "<attr>z</attr>", true, ".cli").unwrap();

        let records = catalog.records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].id, "d3");
        assert_eq!(records[2].kind, "ship");
        assert!(contents(&catalog).ends_with(
            "<dataset active=\"true\" datasetID=\"d3\" type=\"ship\"><attr>z</attr></dataset></erddapDatasets>\n"
        ));
    }

    #[test]
    fn add_duplicate_fails_and_leaves_catalog_unchanged() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        let before = contents(&catalog);

        let err = catalog.add("ship", "d1", "<attr>z</attr>", true, ".cli").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "d1"));
        assert_eq!(contents(&catalog), before);
    }

    #[test]
    fn add_rejects_empty_and_malformed_bodies() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        assert!(matches!(
            catalog.add("ship", "d3", "   ", true, ".cli"),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            catalog.add("ship", "d3", "<attr>unclosed", true, ".cli"),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn add_rejects_body_that_closes_the_record_element_early() {
        // A balanced body that closes the wrapper and opens a sibling
        // record would duplicate d1 without tripping the id check.
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        let before = contents(&catalog);

        let smuggled = "<attr>ok</attr></dataset>\
            <dataset active=\"true\" datasetID=\"d1\" type=\"evil\"><attr>smuggled</attr>";
        let err = catalog.add("ship", "d3", smuggled, true, ".cli").unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(contents(&catalog), before);
        assert_eq!(contents(&catalog).matches("datasetID=\"d1\"").count(), 1);
    }

    #[test]
    fn update_rejects_body_with_trailing_sibling_content() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        assert!(matches!(
            catalog.update("d1", "<a>x</a></dataset><dataset datasetID=\"d9\"><a>y</a>", None, ".cli"),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn update_preserves_kind_and_active_and_moves_to_end() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        catalog.update("d1", "<attr>new</attr>", None, ".cli").unwrap();

        let records = catalog.records().unwrap();
        assert_eq!(records[0].id, "d2");
        assert_eq!(records[1].id, "d1");
        assert_eq!(records[1].kind, "glider");
        assert!(records[1].active);
        assert_eq!(records[1].body, "<attr>new</attr>");
    }

    #[test]
    fn update_with_active_set_overwrites_flag() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        catalog.update("d1", "<attr>new</attr>", Some(false), ".cli").unwrap();
        let records = catalog.records().unwrap();
        assert!(!records.iter().find(|r| r.id == "d1").unwrap().active);
    }

    #[test]
    fn update_unknown_id_fails() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        assert!(matches!(
            catalog.update("nope", "<attr>x</attr>", None, ".cli"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn set_active_patches_in_place_preserving_unknown_attributes() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        catalog.set_active("d2", true, ".cli").unwrap();

        let text = contents(&catalog);
        // Same position (before d1 would mean a move happened), same body,
        // unknown vendor attribute intact, only the flag flipped.
        assert!(text.contains(
            "<dataset active=\"true\" datasetID=\"d2\" type=\"buoy\" vendor=\"acme\"><attr>y</attr></dataset>"
        ));
        let records = catalog.records().unwrap();
        assert_eq!(records[0].id, "d1");
        assert_eq!(records[1].id, "d2");
        assert!(records[1].active);
        assert_eq!(records[1].body, "<attr>y</attr>");
    }

    #[test]
    fn untouched_records_and_foreign_content_round_trip_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        catalog.set_active("d2", true, ".cli").unwrap();

        let text = contents(&catalog);
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n"));
        assert!(text.contains("<!-- managed by dsadmin -->"));
        assert!(text.contains(
            "<dataset active=\"true\" datasetID=\"d1\" type=\"glider\"><attr>x</attr></dataset>"
        ));
    }

    #[test]
    fn mutation_that_fails_leaves_no_lock_marker() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        catalog.update("nope", "<attr>x</attr>", None, ".cli").unwrap_err();
        assert!(!dir.path().join("datasets.xml.lock").exists());
    }

    #[test]
    fn held_lock_blocks_mutation() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        let lock = FileLock::new(catalog.path(), 1, Duration::from_millis(1));
        let _guard = lock.acquire().unwrap();

        assert!(matches!(
            catalog.add("ship", "d3", "<attr>z</attr>", true, ".cli"),
            Err(CatalogError::Lock(_))
        ));
    }

    #[test]
    fn missing_file_is_reported_before_locking() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path().join("absent.xml"), 1, Duration::from_millis(1));
        assert!(matches!(
            catalog.add("ship", "d1", "<attr>z</attr>", true, ".cli"),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn add_then_update_scenario() {
        // add("glider", "d1", ..., true) then update with active unset
        // keeps kind and the active flag while replacing the body.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("datasets.xml");
        fs::write(&path, "<erddapDatasets>\n</erddapDatasets>\n").unwrap();
        let catalog = Catalog::open(path, 2, Duration::from_millis(5));

        catalog.add("glider", "d1", "<attr>x</attr>", true, ".cli").unwrap();
        catalog.update("d1", "<attr>y</attr>", None, ".cli").unwrap();

        let records = catalog.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "glider");
        assert!(records[0].active);
        assert!(records[0].body.contains('y'));
    }

    #[test]
    fn add_works_on_a_self_closing_root() {
        // A freshly provisioned catalog may be just `<erddapDatasets/>`.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("datasets.xml");
        fs::write(&path, "<?xml version=\"1.0\"?>\n<erddapDatasets/>\n").unwrap();
        let catalog = Catalog::open(path, 2, Duration::from_millis(5));

        catalog.add("glider", "d1", "<attr>x</attr>", true, ".cli").unwrap();

        let text = contents(&catalog);
        assert!(text.starts_with("<?xml version=\"1.0\"?>\n"));
        assert!(text.contains(
            "<erddapDatasets><dataset active=\"true\" datasetID=\"d1\" type=\"glider\"><attr>x</attr></dataset></erddapDatasets>"
        ));
        assert_eq!(catalog.records().unwrap().len(), 1);
    }

    #[test]
    fn self_closing_dataset_is_recognized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("datasets.xml");
        fs::write(
            &path,
            "<erddapDatasets><dataset active=\"false\" datasetID=\"d9\" type=\"buoy\"/></erddapDatasets>",
        )
        .unwrap();
        let catalog = Catalog::open(path, 2, Duration::from_millis(5));

        catalog.set_active("d9", true, ".cli").unwrap();
        let records = catalog.records().unwrap();
        assert!(records[0].active);
        assert_eq!(records[0].body, "");
    }
}
