//! Scoped I/O operations
//!
//! [`IoScope`] resolves names through a [`ScopeChain`] and performs reads,
//! writes and copies against whichever backend the resolved store is bound
//! to. Every operation asks the store's session for the capability it needs
//! and fails with `PluginError::CapabilityMismatch` when it is absent.

use crate::error::{Capability, PluginError, PluginResult};
use cc_model::{
    ByteStream, DataSource, DataStore, FileHierarchy, IoType, ResolveError, ScopeChain, Session, StoreError,
    StoreReader, StoreWriter,
};
use cc_template::{substitute_vars, SubstitutionError};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How an operation names its data source
#[derive(Debug, Clone)]
pub enum SourceSelector {
    /// Resolve by name through the scope chain
    Name(String),
    /// Use this data source as is
    Inline(DataSource),
}

/// Arguments of a single read or write
#[derive(Debug, Clone)]
pub struct DataSourceOpInput {
    /// Data source to operate on
    pub source: SourceSelector,
    /// Key into the data source's `paths`
    pub path_key: String,
    /// Optional key into the data source's `data_paths`
    pub data_path_key: Option<String>,
    /// Values for `VAR` tokens in the selected path templates
    pub vars: HashMap<String, String>,
}

impl DataSourceOpInput {
    /// Operate on the data source named `name`
    #[must_use]
    pub fn named(name: impl Into<String>, path_key: impl Into<String>) -> Self {
        Self::with_selector(SourceSelector::Name(name.into()), path_key.into())
    }

    /// Operate on `source` without resolving it
    #[must_use]
    pub fn inline(source: DataSource, path_key: impl Into<String>) -> Self {
        Self::with_selector(SourceSelector::Inline(source), path_key.into())
    }

    fn with_selector(source: SourceSelector, path_key: String) -> Self {
        Self {
            source,
            path_key,
            data_path_key: None,
            vars: HashMap::new(),
        }
    }

    /// With data-path key
    #[inline]
    #[must_use]
    pub fn with_data_path_key(mut self, key: impl Into<String>) -> Self {
        self.data_path_key = Some(key.into());
        self
    }

    /// With one `VAR` value
    #[inline]
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

/// Arguments of [`IoScope::copy_file_to_local`]
#[derive(Debug, Clone)]
pub struct CopyToLocalInput {
    /// Input data source name
    pub source_name: String,
    /// Key into the data source's `paths`
    pub path_key: String,
    /// Local directory receiving the files
    pub local_dir: PathBuf,
}

/// Destination of [`IoScope::copy_file_to_remote`]
#[derive(Debug, Clone)]
pub enum RemoteTarget {
    /// Store name plus a path relative to the store root
    Store {
        /// Store name
        store: String,
        /// Store-relative path
        path: String,
    },
    /// Output data source plus path key
    DataSource {
        /// Output data source name
        name: String,
        /// Key into the data source's `paths`
        path_key: String,
    },
}

/// Arguments of [`IoScope::copy_file_to_remote`]
#[derive(Debug, Clone)]
pub struct CopyToRemoteInput {
    /// Where the files go
    pub target: RemoteTarget,
    /// Local file or directory to upload
    pub local_path: PathBuf,
}

/// Resolver and I/O operations bound to one scope chain
#[derive(Debug, Clone)]
pub struct IoScope<'a> {
    chain: ScopeChain<'a>,
}

impl<'a> IoScope<'a> {
    /// Wrap a scope chain
    #[inline]
    #[must_use]
    pub fn new(chain: ScopeChain<'a>) -> Self {
        Self { chain }
    }

    /// Underlying scope chain
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &ScopeChain<'a> {
        &self.chain
    }

    /// Find a store by name, nearest scope first
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if no scope declares it.
    pub fn get_store(&self, name: &str) -> PluginResult<&'a DataStore> {
        Ok(self.chain.get_store(name)?)
    }

    /// Find a data source in the given set(s)
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if no scope declares it.
    pub fn get_data_source(&self, io_type: IoType, name: &str) -> PluginResult<&'a DataSource> {
        Ok(self.chain.get_data_source(io_type, name)?)
    }

    /// Find an input data source
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if no scope declares it.
    pub fn get_input_data_source(&self, name: &str) -> PluginResult<&'a DataSource> {
        Ok(self.chain.get_input_data_source(name)?)
    }

    /// Find an output data source
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if no scope declares it.
    pub fn get_output_data_source(&self, name: &str) -> PluginResult<&'a DataSource> {
        Ok(self.chain.get_output_data_source(name)?)
    }

    /// Store root joined with a data source's path
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if a name or the path key is unknown.
    pub fn get_absolute_path(&self, store_name: &str, source_name: &str, path_key: &str) -> PluginResult<String> {
        Ok(self.chain.get_absolute_path(store_name, source_name, path_key)?)
    }

    /// Session of the named store downcast to its concrete type
    ///
    /// # Errors
    /// - `PluginError::Resolve` if the store is unknown
    /// - `PluginError::SessionType` if it has no session of type `T`
    pub fn get_store_as<T: Session>(&self, name: &str) -> PluginResult<&'a T> {
        let store = self.get_store(name)?;
        store
            .session()
            .and_then(|session| session.as_any().downcast_ref::<T>())
            .ok_or_else(|| PluginError::SessionType {
                store: store.name.clone(),
                store_type: store.store_type.clone(),
            })
    }

    /// Open a stream over an input data source
    ///
    /// # Errors
    /// - `PluginError::Resolve` for an unknown data source, store, path key
    ///   or data-path key
    /// - `PluginError::CapabilityMismatch` if the store cannot be read
    /// - `PluginError::Substitution` for a malformed `VAR` token
    /// - `PluginError::Upstream` if the backend fails
    pub fn get_reader(&self, op: &DataSourceOpInput) -> PluginResult<ByteStream> {
        self.open(op).map(|(_, _, stream)| stream)
    }

    /// Read an input data source fully into memory
    ///
    /// # Errors
    /// Same as [`IoScope::get_reader`], plus `PluginError::Upstream` if the
    /// stream fails mid-read.
    pub fn get(&self, op: &DataSourceOpInput) -> PluginResult<Vec<u8>> {
        let (store, path, mut stream) = self.open(op)?;
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| PluginError::upstream(&store.name, StoreError::io_error(path, e)))?;
        Ok(bytes)
    }

    /// Stream `reader` into an output data source
    ///
    /// # Errors
    /// - `PluginError::Resolve` for an unknown data source, store, path key
    ///   or data-path key
    /// - `PluginError::CapabilityMismatch` if the store cannot be written
    /// - `PluginError::Upstream` if the backend fails
    pub fn put(&self, op: &DataSourceOpInput, reader: &mut dyn Read) -> PluginResult<u64> {
        let source = self.resolve_source(&op.source, IoType::Output)?;
        let store = self.get_store(&source.store_name)?;
        let writer = writer_of(store)?;
        let (path, data_path) = op_paths(source, op)?;

        tracing::debug!(source = %source.name, store = %store.name, %path, "put");
        writer
            .put(reader, &path, data_path.as_deref())
            .map_err(|e| PluginError::upstream(&store.name, e))
    }

    /// Stream one data source into another
    ///
    /// Both ends resolve through the output set. The source store must be
    /// readable and the destination store writable.
    ///
    /// # Errors
    /// - `PluginError::Resolve` for unknown names or keys
    /// - `PluginError::CapabilityMismatch` naming the store lacking the
    ///   capability
    /// - `PluginError::Upstream` if either backend fails
    pub fn copy(&self, src: &DataSourceOpInput, dest: &DataSourceOpInput) -> PluginResult<u64> {
        let src_source = self.resolve_source(&src.source, IoType::Output)?;
        let src_store = self.get_store(&src_source.store_name)?;
        let dest_source = self.resolve_source(&dest.source, IoType::Output)?;
        let dest_store = self.get_store(&dest_source.store_name)?;

        let reader = reader_of(src_store)?;
        let writer = writer_of(dest_store)?;

        let (src_path, src_data_path) = op_paths(src_source, src)?;
        let (dest_path, dest_data_path) = op_paths(dest_source, dest)?;

        let mut stream = reader
            .get(&src_path, src_data_path.as_deref())
            .map_err(|e| PluginError::upstream(&src_store.name, e))?;
        let written = writer
            .put(&mut stream, &dest_path, dest_data_path.as_deref())
            .map_err(|e| PluginError::upstream(&dest_store.name, e))?;

        tracing::debug!(
            from = %src_store.name,
            to = %dest_store.name,
            bytes = written,
            "copied {src_path} to {dest_path}"
        );
        Ok(written)
    }

    /// Download an object, or every object below a prefix, into a local
    /// directory
    ///
    /// Each object lands at `local_dir/<basename>`. Returns the local files
    /// written.
    ///
    /// # Errors
    /// - `PluginError::Resolve` for unknown names or keys
    /// - `PluginError::CapabilityMismatch` without file hierarchy
    /// - `PluginError::Upstream` if the backend fails
    /// - `PluginError::Io` if a local file cannot be written
    pub fn copy_file_to_local(&self, input: &CopyToLocalInput) -> PluginResult<Vec<PathBuf>> {
        let source = self.get_input_data_source(&input.source_name)?;
        let store = self.get_store(&source.store_name)?;
        let files = file_hierarchy_of(store)?;
        let relative = source
            .path(&input.path_key)
            .ok_or_else(|| ResolveError::path_key(&source.name, &input.path_key))?;
        let remote = files.absolute_path(relative);

        fs::create_dir_all(&input.local_dir).map_err(|e| PluginError::io_error(&input.local_dir, e))?;

        let upstream = |e: StoreError| PluginError::upstream(&store.name, e);
        let objects = if files.exists(&remote).map_err(upstream)? {
            vec![remote.clone()]
        } else {
            files.walk(&remote).map_err(upstream)?
        };

        let mut written = Vec::with_capacity(objects.len());
        for object in &objects {
            let mut stream = files.get_object(object).map_err(upstream)?;
            let local = input.local_dir.join(basename(object));
            write_local(&mut stream, &local)?;
            written.push(local);
        }

        tracing::info!(store = %store.name, %remote, files = written.len(), "copied to local");
        Ok(written)
    }

    /// Upload a local file, or every file below a local directory
    ///
    /// A single file goes to the remote path itself; a directory's files go
    /// to `remote/<relative path>`. Returns the remote paths written.
    ///
    /// # Errors
    /// - `PluginError::Resolve` for unknown names or keys
    /// - `PluginError::Io` if the local path does not exist or cannot be read
    /// - `PluginError::CapabilityMismatch` without file hierarchy
    /// - `PluginError::Upstream` if the backend fails
    pub fn copy_file_to_remote(&self, input: &CopyToRemoteInput) -> PluginResult<Vec<String>> {
        let (store_name, relative) = match &input.target {
            RemoteTarget::Store { store, path } => (store.as_str(), path.as_str()),
            RemoteTarget::DataSource { name, path_key } => {
                let source = self.get_output_data_source(name)?;
                let path = source
                    .path(path_key)
                    .ok_or_else(|| ResolveError::path_key(&source.name, path_key))?;
                (source.store_name.as_str(), path)
            }
        };
        let store = self.get_store(store_name)?;

        let metadata = fs::metadata(&input.local_path).map_err(|e| PluginError::io_error(&input.local_path, e))?;
        let files = file_hierarchy_of(store)?;
        let remote = files.absolute_path(relative);

        let uploads = if metadata.is_dir() {
            let mut locals = Vec::new();
            for entry in WalkDir::new(&input.local_path).follow_links(false) {
                let entry = entry.map_err(|e| PluginError::io_error(&input.local_path, e.into()))?;
                if entry.file_type().is_file() {
                    locals.push(entry.into_path());
                }
            }
            locals.sort();
            locals
                .into_iter()
                .map(|local| {
                    let target = format!("{remote}/{}", relative_slash_path(&input.local_path, &local));
                    (local, target)
                })
                .collect()
        } else {
            vec![(input.local_path.clone(), remote.clone())]
        };

        let mut written = Vec::with_capacity(uploads.len());
        for (local, target) in uploads {
            let mut file = File::open(&local).map_err(|e| PluginError::io_error(&local, e))?;
            files
                .put_object(&mut file, &target)
                .map_err(|e| PluginError::upstream(&store.name, e))?;
            written.push(target);
        }

        tracing::info!(store = %store.name, %remote, files = written.len(), "copied to remote");
        Ok(written)
    }

    fn open(&self, op: &DataSourceOpInput) -> PluginResult<(&'a DataStore, String, ByteStream)> {
        let source = self.resolve_source(&op.source, IoType::Input)?;
        let store = self.get_store(&source.store_name)?;
        let reader = reader_of(store)?;
        let (path, data_path) = op_paths(source, op)?;

        tracing::debug!(source = %source.name, store = %store.name, %path, "get");
        let stream = reader
            .get(&path, data_path.as_deref())
            .map_err(|e| PluginError::upstream(&store.name, e))?;
        Ok((store, path, stream))
    }

    fn resolve_source<'s>(&self, selector: &'s SourceSelector, io_type: IoType) -> PluginResult<&'s DataSource>
    where
        'a: 's,
    {
        match selector {
            SourceSelector::Inline(source) => Ok(source),
            SourceSelector::Name(name) => self.get_data_source(io_type, name),
        }
    }
}

fn reader_of(store: &DataStore) -> PluginResult<&dyn StoreReader> {
    store
        .session()
        .and_then(|session| session.reader())
        .ok_or_else(|| PluginError::capability(&store.name, Capability::Read))
}

fn writer_of(store: &DataStore) -> PluginResult<&dyn StoreWriter> {
    store
        .session()
        .and_then(|session| session.writer())
        .ok_or_else(|| PluginError::capability(&store.name, Capability::Write))
}

fn file_hierarchy_of(store: &DataStore) -> PluginResult<&dyn FileHierarchy> {
    store
        .session()
        .and_then(|session| session.file_hierarchy())
        .ok_or_else(|| PluginError::capability(&store.name, Capability::FileHierarchy))
}

/// Path and optional data path selected by `op`, with `VAR` tokens applied
fn op_paths(source: &DataSource, op: &DataSourceOpInput) -> PluginResult<(String, Option<String>)> {
    let template = source
        .path(&op.path_key)
        .ok_or_else(|| ResolveError::path_key(&source.name, &op.path_key))?;
    let located = |e: SubstitutionError| PluginError::from(e.at(format!("data source {}", source.name)));
    let path = substitute_vars(template, &op.vars).map_err(located)?;

    let data_path = match op.data_path_key.as_deref() {
        Some(key) => {
            let template = source
                .data_path(key)
                .ok_or_else(|| ResolveError::data_path_key(&source.name, key))?;
            Some(substitute_vars(template, &op.vars).map_err(located)?)
        }
        None => None,
    };
    Ok((path, data_path))
}

fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

fn write_local(stream: &mut ByteStream, local: &Path) -> PluginResult<u64> {
    let mut file = File::create(local).map_err(|e| PluginError::io_error(local, e))?;
    io::copy(stream, &mut file).map_err(|e| PluginError::io_error(local, e))
}

fn relative_slash_path(base: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_model::IoManager;
    use std::any::Any;
    use std::sync::Arc;

    #[derive(Debug)]
    struct ResettingSession;

    struct ResettingStream;

    impl Read for ResettingStream {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
        }
    }

    impl StoreReader for ResettingSession {
        fn get(&self, _: &str, _: Option<&str>) -> Result<ByteStream, StoreError> {
            Ok(Box::new(ResettingStream))
        }
    }

    impl Session for ResettingSession {
        fn reader(&self) -> Option<&dyn StoreReader> {
            Some(self)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn basename_of_object_paths() {
        assert_eq!(basename("/sims/out/a.csv"), "a.csv");
        assert_eq!(basename("a.csv"), "a.csv");
        assert_eq!(basename("/sims/out/"), "out");
    }

    #[test]
    fn relative_paths_use_slashes() {
        let base = Path::new("/tmp/upload");
        assert_eq!(relative_slash_path(base, Path::new("/tmp/upload/a/b.txt")), "a/b.txt");
        assert_eq!(relative_slash_path(base, Path::new("/tmp/upload/c.txt")), "c.txt");
    }

    #[test]
    fn op_paths_apply_vars_and_check_keys() {
        let source = DataSource::new("results", "FFRD")
            .with_path("member", "runs/{VAR::member}.csv")
            .with_data_path("table", "t_{VAR::member}");

        let op = DataSourceOpInput::named("results", "member")
            .with_data_path_key("table")
            .with_var("member", "3");
        let (path, data_path) = op_paths(&source, &op).unwrap();
        assert_eq!(path, "runs/3.csv");
        assert_eq!(data_path.as_deref(), Some("t_3"));

        let missing = DataSourceOpInput::named("results", "nope");
        assert!(matches!(
            op_paths(&source, &missing),
            Err(PluginError::Resolve(ResolveError::PathKeyNotFound { .. }))
        ));

        let missing_dp = DataSourceOpInput::named("results", "member").with_data_path_key("nope");
        assert!(matches!(
            op_paths(&source, &missing_dp),
            Err(PluginError::Resolve(ResolveError::DataPathKeyNotFound { .. }))
        ));
    }

    #[test]
    fn op_paths_malformed_var_names_data_source() {
        let source = DataSource::new("results", "FFRD").with_path("member", "runs/{VAR::9bad}.csv");
        let op = DataSourceOpInput::named("results", "member").with_var("member", "3");

        let err = op_paths(&source, &op).unwrap_err();
        assert!(matches!(err, PluginError::Substitution(SubstitutionError::At { .. })));
        assert!(err.to_string().contains("data source results"));
    }

    #[test]
    fn interrupted_get_names_resolved_path() {
        let job = IoManager::new()
            .with_store(DataStore::new("FLAKY", "MEM"))
            .with_input(DataSource::new("grid", "FLAKY").with_path("default", "grids/{VAR::cell}.h5"));
        let scope = IoScope::new(ScopeChain::root(&job));
        scope
            .get_store("FLAKY")
            .unwrap()
            .bind_session(Arc::new(ResettingSession))
            .unwrap();

        let err = scope
            .get(&DataSourceOpInput::named("grid", "default").with_var("cell", "c1"))
            .unwrap_err();
        assert!(matches!(
            err,
            PluginError::Upstream { ref store, source: StoreError::Io { ref path, .. } }
                if store == "FLAKY" && path == "grids/c1.h5"
        ));
    }
}
