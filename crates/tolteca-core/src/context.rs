//! Runtime context facade
//!
//! A [`RuntimeContext`] is backed either by a root directory on disk
//! (persistent) or by an in-memory config mapping, never both. Its
//! effective config is built on first access and cached until
//! [`RuntimeContext::setup`] or [`RuntimeContext::invalidate`] drops it.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_yaml::{Mapping, Value};
use tolteca_fs::{NormalizedPath, YamlDocument, io};

use crate::collector::{collect_config_files, collect_config_from_files};
use crate::contents::{
    BINDIR, CALDIR, ContentTable, LOGDIR, PopulateOptions, RootPath, SETUP_FILE, populate_dir,
};
use crate::merge::{merge_all, rupdate_mapping};
use crate::schema::{
    CREATED_AT_KEY, SETUP_KEY, Schema, VERSION_KEY, ValidationEnv, Validator, base_schema,
};
use crate::stamp::{Stamper, SystemStamper, file_suffix, isot};
use crate::{Error, Result};

/// Key of the runtime section injected into the effective config.
pub const RUNTIME_KEY: &str = "runtime";
/// Key of the root path inside the runtime section.
pub const ROOTPATH_KEY: &str = "rootpath";

/// Content table and schema shared by all contexts of one kind.
#[derive(Debug, Clone)]
pub struct ContextProfile {
    contents: ContentTable,
    schema: Schema,
}

impl ContextProfile {
    /// Compose `extension` with the base schema.
    pub fn new(contents: ContentTable, extension: Schema) -> Self {
        Self {
            contents,
            schema: base_schema().extend(extension),
        }
    }

    /// The standard Toltec layout with the base schema.
    pub fn toltec() -> Self {
        Self::new(ContentTable::toltec(), Schema::new())
    }

    pub fn contents(&self) -> &ContentTable {
        &self.contents
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Default for ContextProfile {
    fn default() -> Self {
        Self::toltec()
    }
}

/// What backs a runtime context.
#[derive(Debug, Clone)]
pub enum ContextSource {
    RootPath(RootPath),
    Config(Mapping),
}

/// Resolved value of a content item.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEntry {
    /// Path under the root of a persistent context.
    Path(PathBuf),
    /// Value recorded under `runtime.<name>` in a non-persistent context.
    Described(Value),
}

impl ContentEntry {
    pub fn path(&self) -> Option<PathBuf> {
        match self {
            Self::Path(path) => Some(path.clone()),
            Self::Described(Value::String(path)) => Some(PathBuf::from(path)),
            Self::Described(_) => None,
        }
    }
}

/// Builder carrying the profile and stamper for new contexts.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    profile: Arc<ContextProfile>,
    stamper: Arc<dyn Stamper>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            profile: Arc::new(ContextProfile::toltec()),
            stamper: Arc::new(SystemStamper),
        }
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(mut self, profile: ContextProfile) -> Self {
        self.profile = Arc::new(profile);
        self
    }

    pub fn stamper(mut self, stamper: impl Stamper + 'static) -> Self {
        self.stamper = Arc::new(stamper);
        self
    }

    /// Construct from exactly one of a prepared root path or a config.
    ///
    /// A root path is checked with `force` so missing items are tolerated,
    /// but a root that is not a usable directory is rejected.
    pub fn open(self, rootpath: Option<PathBuf>, config: Option<Mapping>) -> Result<RuntimeContext> {
        let source = match (rootpath, config) {
            (Some(rootpath), None) => {
                let root = populate_dir(self.profile.contents(), &rootpath, PopulateOptions::force())
                    .map_err(|e| Error::Construction {
                        message: format!(
                            "missing runtime context contents in {} ({e}). \
                             Use RuntimeContext::from_dir with create enabled instead",
                            rootpath.display()
                        ),
                    })?;
                ContextSource::RootPath(root)
            }
            (None, Some(config)) => ContextSource::Config(config),
            (Some(_), Some(_)) | (None, None) => {
                return Err(Error::Construction {
                    message: "one and only one of rootpath and config has to be set".to_string(),
                });
            }
        };
        Ok(RuntimeContext {
            source,
            profile: self.profile,
            stamper: self.stamper,
            config: OnceCell::new(),
        })
    }

    /// Populate `path` with `options`, then construct from it.
    pub fn open_dir(self, path: impl AsRef<Path>, options: PopulateOptions) -> Result<RuntimeContext> {
        let root = populate_dir(self.profile.contents(), path, options)?;
        self.open(Some(root.into_path_buf()), None)
    }

    /// Merge `configs` in order into one in-memory config and construct from it.
    pub fn open_configs(self, configs: &[Mapping]) -> Result<RuntimeContext> {
        if configs.is_empty() {
            return Err(Error::Construction {
                message: "from_config needs at least one config".to_string(),
            });
        }
        self.open(None, Some(merge_all(configs)))
    }
}

/// Per-project runtime settings backed by a directory or a config mapping.
#[derive(Debug)]
pub struct RuntimeContext {
    source: ContextSource,
    profile: Arc<ContextProfile>,
    stamper: Arc<dyn Stamper>,
    config: OnceCell<Mapping>,
}

impl RuntimeContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Construct with the standard profile from exactly one of a root path
    /// (already populated) or a config.
    pub fn new(rootpath: Option<PathBuf>, config: Option<Mapping>) -> Result<Self> {
        ContextBuilder::new().open(rootpath, config)
    }

    /// Populate a directory and construct a persistent context from it.
    pub fn from_dir(path: impl AsRef<Path>, options: PopulateOptions) -> Result<Self> {
        ContextBuilder::new().open_dir(path, options)
    }

    /// Construct a non-persistent context from merged configs.
    pub fn from_config(configs: &[Mapping]) -> Result<Self> {
        ContextBuilder::new().open_configs(configs)
    }

    pub fn source(&self) -> &ContextSource {
        &self.source
    }

    pub fn profile(&self) -> &ContextProfile {
        &self.profile
    }

    pub fn stamper(&self) -> &dyn Stamper {
        self.stamper.as_ref()
    }

    /// True if this context is backed by a root directory.
    pub fn is_persistent(&self) -> bool {
        matches!(self.source, ContextSource::RootPath(_))
    }

    /// The bound root, or `runtime.rootpath` of a non-persistent config.
    pub fn root_path(&self) -> Result<Option<PathBuf>> {
        match &self.source {
            ContextSource::RootPath(root) => Ok(Some(root.as_path().to_path_buf())),
            ContextSource::Config(_) => Ok(runtime_section(self.config()?)
                .and_then(|runtime| runtime.get(ROOTPATH_KEY))
                .and_then(Value::as_str)
                .map(PathBuf::from)),
        }
    }

    /// Config files of a persistent context in merge order.
    pub fn config_files(&self) -> Result<Option<Vec<PathBuf>>> {
        match &self.source {
            ContextSource::RootPath(root) => collect_config_files(root.as_path()).map(Some),
            ContextSource::Config(_) => Ok(None),
        }
    }

    /// Validator for this context's profile and software version.
    pub fn validator(&self) -> Validator {
        Validator::new(
            self.profile.schema().clone(),
            ValidationEnv::new(self.stamper.version()),
        )
    }

    /// The effective config, built on first access.
    pub fn config(&self) -> Result<&Mapping> {
        self.config.get_or_try_init(|| self.materialize())
    }

    /// Drop the cached effective config.
    pub fn invalidate(&mut self) {
        if self.config.take().is_some() {
            tracing::debug!(context = %self, "invalidated cached config");
        }
    }

    fn materialize(&self) -> Result<Mapping> {
        let validator = self.validator();
        let config = match &self.source {
            ContextSource::RootPath(root) => {
                let files = collect_config_files(root.as_path())?;
                let mut config = collect_config_from_files(&files, Some(&validator))?;
                config.insert(
                    Value::from(RUNTIME_KEY),
                    Value::Mapping(self.persistent_runtime(root)),
                );
                config
            }
            ContextSource::Config(raw) => {
                let mut config = validator.validate(raw.clone())?;
                self.fill_runtime(&mut config)?;
                config
            }
        };
        tracing::debug!(context = %self, config = %render_yaml(&config), "loaded config");
        Ok(config)
    }

    /// Runtime section of a persistent context: the root path and every
    /// content item's path. `None` when not persistent.
    pub fn to_runtime_mapping(&self) -> Option<Mapping> {
        match &self.source {
            ContextSource::RootPath(root) => Some(self.persistent_runtime(root)),
            ContextSource::Config(_) => None,
        }
    }

    fn persistent_runtime(&self, root: &RootPath) -> Mapping {
        let mut runtime = Mapping::new();
        runtime.insert(Value::from(ROOTPATH_KEY), path_value(root.as_path()));
        for item in self.profile.contents().iter() {
            runtime.insert(
                Value::from(item.name.as_str()),
                path_value(&root.join(&item.relative_path)),
            );
        }
        runtime
    }

    /// Ensure a non-persistent config has a runtime section naming the root
    /// and every content item, defaulting to null.
    fn fill_runtime(&self, config: &mut Mapping) -> Result<()> {
        let runtime = config
            .entry(Value::from(RUNTIME_KEY))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if runtime.is_null() {
            *runtime = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(runtime) = runtime else {
            return Err(Error::validation(RUNTIME_KEY, "expected a mapping"));
        };
        let names = std::iter::once(ROOTPATH_KEY).chain(self.profile.contents().names());
        for name in names {
            runtime.entry(Value::from(name)).or_insert(Value::Null);
        }
        Ok(())
    }

    /// Resolve content item `name`.
    pub fn content(&self, name: &str) -> Result<ContentEntry> {
        let item = self
            .profile
            .contents()
            .get(name)
            .ok_or_else(|| Error::UnknownContent {
                name: name.to_string(),
            })?;
        match &self.source {
            ContextSource::RootPath(root) => Ok(ContentEntry::Path(root.join(&item.relative_path))),
            ContextSource::Config(_) => {
                let value = runtime_section(self.config()?)
                    .and_then(|runtime| runtime.get(name))
                    .cloned()
                    .unwrap_or(Value::Null);
                Ok(ContentEntry::Described(value))
            }
        }
    }

    /// Path of content item `name`, failing if it has none.
    pub fn content_path(&self, name: &str) -> Result<PathBuf> {
        self.content(name)?
            .path()
            .ok_or_else(|| Error::ContentUnavailable {
                name: name.to_string(),
            })
    }

    pub fn bindir(&self) -> Result<PathBuf> {
        self.content_path(BINDIR)
    }

    pub fn caldir(&self) -> Result<PathBuf> {
        self.content_path(CALDIR)
    }

    pub fn logdir(&self) -> Result<PathBuf> {
        self.content_path(LOGDIR)
    }

    pub fn setup_file(&self) -> Result<PathBuf> {
        self.content_path(SETUP_FILE)
    }

    /// Create a symbolic link to `src` inside the bin directory.
    ///
    /// The link is named `link_name`, or the last component of `src`. The
    /// name must be a single plain path component.
    pub fn symlink_to_bindir(&self, src: impl AsRef<Path>, link_name: Option<&str>) -> Result<PathBuf> {
        self.require_persistent("symlink_to_bindir")?;
        let src = src.as_ref();
        let link_name = match link_name {
            Some(name) => {
                if !is_single_component(Path::new(name)) {
                    return Err(Error::InvalidLinkName {
                        name: name.to_string(),
                    });
                }
                PathBuf::from(name)
            }
            None => src
                .file_name()
                .map(PathBuf::from)
                .ok_or_else(|| Error::InvalidLinkSource {
                    path: src.to_path_buf(),
                })?,
        };
        let dst = self.bindir()?.join(link_name);
        io::symlink(src, &dst)?;
        tracing::debug!(src = %src.display(), dst = %dst.display(), "symlink to bindir");
        Ok(dst)
    }

    /// Write the setup block to the setup file.
    ///
    /// Fails with [`Error::AlreadySetUp`] if the file already holds a setup
    /// block, unless `overwrite` is set. `extra` is written alongside the
    /// setup block, which always wins on conflicting keys. The cached
    /// config is dropped afterwards.
    pub fn setup(&mut self, extra: Option<&Mapping>, overwrite: bool) -> Result<&mut Self> {
        self.require_persistent("setup")?;
        let setup_path = self.setup_file()?;

        if is_set_up(&YamlDocument::load_raw(&setup_path)?) {
            if !overwrite {
                return Err(Error::AlreadySetUp { path: setup_path });
            }
            tracing::debug!(path = %setup_path.display(), "runtime context is already set up, overwrite");
            let backup_enabled = self
                .profile
                .contents()
                .get(SETUP_FILE)
                .is_some_and(|item| item.backup_enabled);
            if backup_enabled {
                io::copy_to_backup(&setup_path, &file_suffix(self.stamper.now()))?;
            }
        }

        let mut stamp = Mapping::new();
        stamp.insert(Value::from(VERSION_KEY), Value::from(self.stamper.version()));
        stamp.insert(Value::from(CREATED_AT_KEY), Value::from(isot(self.stamper.now())));
        let mut block = Mapping::new();
        block.insert(Value::from(SETUP_KEY), Value::Mapping(stamp));

        let mut config = extra.cloned().unwrap_or_default();
        rupdate_mapping(&mut config, &block);
        YamlDocument::save(&setup_path, &config)?;
        tracing::debug!(path = %setup_path.display(), "wrote setup file");

        self.invalidate();
        Ok(self)
    }

    fn require_persistent(&self, operation: &str) -> Result<()> {
        if self.is_persistent() {
            Ok(())
        } else {
            Err(Error::NotPersistent {
                operation: operation.to_string(),
            })
        }
    }
}

impl fmt::Display for RuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ContextSource::RootPath(root) => write!(f, "RuntimeContext({root})"),
            // the star marks a context without storage of its own
            ContextSource::Config(raw) => {
                let root = runtime_section(raw)
                    .and_then(|runtime| runtime.get(ROOTPATH_KEY))
                    .and_then(Value::as_str)
                    .unwrap_or("None");
                write!(f, "RuntimeContext(*{root})")
            }
        }
    }
}

fn is_single_component(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn runtime_section(config: &Mapping) -> Option<&Mapping> {
    config.get(RUNTIME_KEY).and_then(Value::as_mapping)
}

fn path_value(path: &Path) -> Value {
    Value::from(NormalizedPath::new(path).as_str())
}

/// A setup file counts as set up when it holds a non-empty setup block.
fn is_set_up(document: &Value) -> bool {
    match document.get(SETUP_KEY) {
        None | Some(Value::Null) => false,
        Some(Value::Mapping(block)) => !block.is_empty(),
        Some(_) => true,
    }
}

fn render_yaml(config: &Mapping) -> String {
    serde_yaml::to_string(config).unwrap_or_else(|e| format!("<unrenderable config: {e}>"))
}
