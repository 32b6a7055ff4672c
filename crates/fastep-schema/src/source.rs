//! # Schema Resolution
//!
//! A [`SchemaSource`] owns one [`SchemaReference`] and turns it into parsed
//! JSON exactly once. File references are resolved against an ordered
//! [`SchemaSearchPath`]:
//!
//! - a reference naming an existing file is used as is;
//! - otherwise `.json` is appended when missing and each search directory is
//!   tried in the order it was appended; the first existing file wins.
//!
//! Everything that can go wrong here (no filename, nothing found, unreadable
//! file, invalid JSON, bad search directory) is a [`SchemaError`].

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use fastep_core::Filter;
use serde_json::Value;
use tracing::debug;

use crate::error::SchemaError;
use crate::policy::AdditionalPropertiesPolicy;
use crate::rewrite::rewrite;

/// Where a schema comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaReference {
    /// The schema document itself.
    Inline(Value),
    /// A file name, with or without the `.json` extension, absolute or
    /// relative to one of the search directories.
    File(PathBuf),
}

impl SchemaReference {
    /// True for inline schemas.
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

impl fmt::Display for SchemaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => f.write_str("<inline>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<Value> for SchemaReference {
    fn from(value: Value) -> Self {
        Self::Inline(value)
    }
}

impl From<&str> for SchemaReference {
    fn from(name: &str) -> Self {
        Self::File(PathBuf::from(name))
    }
}

impl From<String> for SchemaReference {
    fn from(name: String) -> Self {
        Self::File(PathBuf::from(name))
    }
}

impl From<PathBuf> for SchemaReference {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for SchemaReference {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

/// Ordered, duplicate-free list of directories holding schema files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSearchPath {
    dirs: Vec<PathBuf>,
}

impl SchemaSearchPath {
    /// Empty search path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories in search order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Number of directories.
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// True when no directory has been appended.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Append one or more directories.
    ///
    /// Every entry is checked before any is added: an empty batch or empty
    /// entry, a path that does not exist, or a path naming a file rejects the
    /// whole call and leaves the search path unchanged. Directories already
    /// present are skipped.
    pub fn append<I, P>(&mut self, dirs: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let batch: Vec<PathBuf> = dirs.into_iter().map(Into::into).collect();
        if batch.is_empty() {
            return Err(SchemaError::InvalidDirectory);
        }
        for dir in &batch {
            check_directory(dir)?;
        }
        for dir in batch {
            if !self.dirs.contains(&dir) {
                debug!(dir = %dir.display(), "schema directory appended");
                self.dirs.push(dir);
            }
        }
        Ok(())
    }

    /// Resolve a file reference to an existing file.
    pub fn resolve(&self, name: &Path) -> Result<PathBuf, SchemaError> {
        if name.as_os_str().is_empty() {
            return Err(SchemaError::MissingFilename);
        }
        if name.is_file() {
            return Ok(name.to_path_buf());
        }

        let candidate = with_json_extension(name);
        self.dirs
            .iter()
            .map(|dir| dir.join(&candidate))
            .find(|path| path.is_file())
            .ok_or_else(|| SchemaError::NotFound {
                filename: name.display().to_string(),
                searched: self.dirs.len(),
            })
    }
}

fn check_directory(dir: &Path) -> Result<(), SchemaError> {
    if dir.as_os_str().is_empty() {
        return Err(SchemaError::InvalidDirectory);
    }
    if dir.is_file() {
        return Err(SchemaError::NotADirectory(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(SchemaError::DirectoryNotFound(dir.to_path_buf()));
    }
    Ok(())
}

fn with_json_extension(name: &Path) -> PathBuf {
    if name.extension().is_some_and(|ext| ext == "json") {
        return name.to_path_buf();
    }
    let mut raw = OsString::from(name.as_os_str());
    raw.push(".json");
    PathBuf::from(raw)
}

/// True for the schemas that accept everything without running a validator:
/// `null`, `{}` and `[]`.
pub fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Parsed schema contents cached by a [`SchemaSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSchema {
    /// The schema document, after the contents hook.
    pub contents: Value,
    /// Set once the additional-properties rewrite has run.
    pub rewritten: bool,
}

/// Post-processing applied to freshly loaded contents.
pub type ContentsHook = dyn Fn(Value, &SchemaReference) -> Value + Send + Sync;

/// A schema reference plus its search path and cached contents.
#[derive(Debug)]
pub struct SchemaSource {
    reference: SchemaReference,
    search_path: SchemaSearchPath,
    loaded: Option<LoadedSchema>,
    contents_hook: Filter<ContentsHook>,
}

impl SchemaSource {
    /// Source for `reference` with an empty search path.
    pub fn new(reference: impl Into<SchemaReference>) -> Self {
        Self {
            reference: reference.into(),
            search_path: SchemaSearchPath::new(),
            loaded: None,
            contents_hook: Filter::new(),
        }
    }

    /// The reference this source resolves.
    pub fn reference(&self) -> &SchemaReference {
        &self.reference
    }

    /// Directories consulted for file references.
    pub fn search_path(&self) -> &SchemaSearchPath {
        &self.search_path
    }

    /// See [`SchemaSearchPath::append`].
    pub fn append_schema_dirs<I, P>(&mut self, dirs: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_path.append(dirs)
    }

    /// Register a handler run over the contents right after they are loaded.
    /// Handlers run once per source, not once per call.
    pub fn on_contents<F>(&mut self, handler: F)
    where
        F: Fn(Value, &SchemaReference) -> Value + Send + Sync + 'static,
    {
        self.contents_hook.add(Box::new(handler));
    }

    /// The cached schema, if it has been loaded.
    pub fn loaded(&self) -> Option<&LoadedSchema> {
        self.loaded.as_ref()
    }

    /// Load (first call) or return (later calls) the schema contents.
    pub fn get_contents(&mut self) -> Result<&Value, SchemaError> {
        Ok(&self.ensure_loaded()?.contents)
    }

    /// Rewrite the cached contents according to `policy`, at most once per
    /// source. Later calls return the already rewritten tree even if a
    /// different policy is passed.
    pub fn apply_additional_properties(
        &mut self,
        policy: &AdditionalPropertiesPolicy,
    ) -> Result<&Value, SchemaError> {
        let reference = self.reference.to_string();
        let loaded = self.ensure_loaded()?;
        if !loaded.rewritten {
            loaded.contents = rewrite(&loaded.contents, policy);
            loaded.rewritten = true;
            debug!(schema = %reference, %policy, "additionalProperties rewritten");
        }
        Ok(&loaded.contents)
    }

    fn ensure_loaded(&mut self) -> Result<&mut LoadedSchema, SchemaError> {
        let loaded = match self.loaded.take() {
            Some(loaded) => loaded,
            None => LoadedSchema {
                contents: self.load()?,
                rewritten: false,
            },
        };
        Ok(self.loaded.insert(loaded))
    }

    fn load(&self) -> Result<Value, SchemaError> {
        let raw = match &self.reference {
            SchemaReference::Inline(schema) => schema.clone(),
            SchemaReference::File(name) => {
                let path = self.search_path.resolve(name)?;
                let text = fs::read_to_string(&path).map_err(|source| SchemaError::Unreadable {
                    path: path.clone(),
                    source,
                })?;
                let parsed: Value =
                    serde_json::from_str(&text).map_err(|e| SchemaError::InvalidJson {
                        filename: name.display().to_string(),
                        reason: e.to_string(),
                    })?;
                debug!(schema = %name.display(), path = %path.display(), "schema loaded");
                parsed
            }
        };
        Ok(self
            .contents_hook
            .iter()
            .fold(raw, |contents, handler| handler(contents, &self.reference)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn store(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reference_conversions() {
        assert!(SchemaReference::from(json!({"type": "string"})).is_inline());
        assert_eq!(
            SchemaReference::from("Users/Get"),
            SchemaReference::File(PathBuf::from("Users/Get"))
        );
        assert_eq!(SchemaReference::from("Users/Get").to_string(), "Users/Get");
        assert_eq!(SchemaReference::from(json!({})).to_string(), "<inline>");
    }

    #[test]
    fn test_append_valid_directories_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();

        let mut search = SchemaSearchPath::new();
        assert!(search.is_empty());
        search.append([&a, &b]).unwrap();
        search.append([&a]).unwrap();
        assert_eq!(search.dirs(), &[a, b]);
    }

    #[test]
    fn test_append_rejects_bad_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path(), "schema.json", "{}");
        let mut search = SchemaSearchPath::new();

        let err = search.append(Vec::<PathBuf>::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDirectory));
        let err = search.append([""]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDirectory));
        let err = search.append(["fakedirectory"]).unwrap_err();
        assert_eq!(err.to_string(), "Schema directory not found: fakedirectory");
        let err = search.append([&file]).unwrap_err();
        assert!(matches!(err, SchemaError::NotADirectory(p) if p == file));
        assert!(search.is_empty());
    }

    #[test]
    fn test_append_mixed_batch_adds_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut search = SchemaSearchPath::new();
        let batch = [tmp.path().to_path_buf(), PathBuf::from("does/not/exist")];
        assert!(search.append(batch).is_err());
        assert!(search.is_empty());
    }

    #[test]
    fn test_resolve_full_path_is_used_directly() {
        let tmp = tempfile::tempdir().unwrap();
        let path = store(tmp.path(), "schema.json", "{}");
        let search = SchemaSearchPath::new();
        assert_eq!(search.resolve(&path).unwrap(), path);
    }

    #[test]
    fn test_resolve_relative_with_and_without_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = store(tmp.path(), "Users/Get.json", "{}");
        let mut search = SchemaSearchPath::new();
        search.append([tmp.path()]).unwrap();
        assert_eq!(search.resolve(Path::new("Users/Get")).unwrap(), path);
        assert_eq!(search.resolve(Path::new("Users/Get.json")).unwrap(), path);
    }

    #[test]
    fn test_resolve_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        store(second.path(), "shared.json", "{}");
        let winner = store(first.path(), "shared.json", "{}");
        let mut search = SchemaSearchPath::new();
        search.append([first.path(), second.path()]).unwrap();
        assert_eq!(search.resolve(Path::new("shared")).unwrap(), winner);
    }

    #[test]
    fn test_resolve_missing() {
        let search = SchemaSearchPath::new();
        assert!(matches!(
            search.resolve(Path::new("")).unwrap_err(),
            SchemaError::MissingFilename
        ));
        assert!(matches!(
            search.resolve(Path::new("Nope/Nothing")).unwrap_err(),
            SchemaError::NotFound { searched: 0, .. }
        ));
    }

    #[test]
    fn test_inline_contents() {
        let mut source = SchemaSource::new(json!({"type": "string"}));
        assert!(source.loaded().is_none());
        assert_eq!(source.get_contents().unwrap(), &json!({"type": "string"}));
        assert!(source.loaded().is_some());
    }

    #[test]
    fn test_contents_hook_runs_once() {
        let tmp = tempfile::tempdir().unwrap();
        store(tmp.path(), "Basics/String.json", r#"{"type": "string"}"#);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut source = SchemaSource::new("Basics/String");
        source.append_schema_dirs([tmp.path()]).unwrap();
        let seen = Arc::clone(&calls);
        source.on_contents(move |mut contents, reference| {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(reference.to_string(), "Basics/String");
            contents["title"] = json!("hooked");
            contents
        });

        let first = source.get_contents().unwrap().clone();
        let second = source.get_contents().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first, json!({"type": "string", "title": "hooked"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_json_file_skips_hook() {
        let tmp = tempfile::tempdir().unwrap();
        store(tmp.path(), "Invalid/Text.json", "this is not json");
        let calls = Arc::new(AtomicUsize::new(0));

        let mut source = SchemaSource::new("Invalid/Text.json");
        source.append_schema_dirs([tmp.path()]).unwrap();
        let seen = Arc::clone(&calls);
        source.on_contents(move |contents, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            contents
        });

        let err = source.get_contents().unwrap_err();
        assert_eq!(err.to_string(), "Invalid json file: Invalid/Text.json");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(source.loaded().is_none());
    }

    #[test]
    fn test_rewrite_happens_once() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "integer"}}});
        let mut source = SchemaSource::new(schema);

        let stripped = source
            .apply_additional_properties(&AdditionalPropertiesPolicy::Remove(true))
            .unwrap()
            .clone();
        assert_eq!(stripped["additionalProperties"], json!(false));

        let again = source
            .apply_additional_properties(&AdditionalPropertiesPolicy::Remove(false))
            .unwrap();
        assert_eq!(again, &stripped);
        assert!(source.loaded().map(|l| l.rewritten).unwrap_or(false));
    }

    #[test]
    fn test_empty_schema_detection() {
        assert!(is_empty_schema(&Value::Null));
        assert!(is_empty_schema(&json!({})));
        assert!(is_empty_schema(&json!([])));
        assert!(!is_empty_schema(&json!({"type": "string"})));
        assert!(!is_empty_schema(&json!(true)));
    }
}
