//! Platform scopes and platform discovery.
//!
//! A [`Platform`] is the root configuration scope for one vendor/architecture
//! pair, parsed from its `platform.txt`. Vendor platforms installed through a
//! board manager sit below the bundled root platform in the scope chain, so
//! keys missing from a vendor's description fall back to the stock values.
//!
//! [`discover_platforms`] walks a settings tree (the `.arduino15`-style
//! packages directory) for `platform.txt` files and derives each platform's
//! identity from the `.../{vendor}/hardware/{architecture}/...` path pattern.

pub mod board;
pub mod board_config;

pub use board::{Board, BoardId, BoardOption};
pub use board_config::BoardConfiguration;

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{ConfigScope, parse_description_file};
use crate::core::BoardwalkError;

/// File name of the platform description.
pub const PLATFORM_FILENAME: &str = "platform.txt";
/// File name of the board descriptions.
pub const BOARDS_FILENAME: &str = "boards.txt";
/// Directory holding per-board variant sources.
pub const VARIANTS_DIRNAME: &str = "variants";

/// Vendor of the bundled root platform.
pub const ROOT_PLATFORM_VENDOR: &str = "arduino";
/// Architecture of the bundled root platform.
pub const ROOT_PLATFORM_ARCH: &str = "avr";

/// Root configuration scope for one vendor/architecture pair.
///
/// Immutable once constructed; the only writes happen during construction
/// (architecture-specific synthesized keys). Safe to share across threads
/// behind an [`Arc`].
#[derive(Debug)]
pub struct Platform {
    vendor: String,
    architecture: String,
    root: PathBuf,
    data: IndexMap<String, String>,
    boards_data: IndexMap<String, String>,
    parent: Option<Arc<Platform>>,
}

impl Platform {
    /// Parse a platform from its root directory.
    ///
    /// Requires `platform.txt` to exist under `root`; a missing `boards.txt`
    /// yields an empty board list with a warning rather than an error.
    pub fn from_root(
        parent: Option<Arc<Platform>>,
        vendor: impl Into<String>,
        architecture: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Result<Self, BoardwalkError> {
        let root = root.into();
        let data = parse_description_file(&root.join(PLATFORM_FILENAME))?;
        let boards_data = match parse_description_file(&root.join(BOARDS_FILENAME)) {
            Ok(table) => table,
            Err(e) => {
                warn!("no usable boards file under {}: {e}", root.display());
                IndexMap::new()
            }
        };

        let mut platform = Self {
            vendor: vendor.into(),
            architecture: architecture.into(),
            root,
            data,
            boards_data,
            parent,
        };
        if platform.is_pic32() {
            platform.apply_pic32_synthesis();
        }
        Ok(platform)
    }

    /// Parse a platform from a directory, deriving vendor/architecture from
    /// the `.../{vendor}/hardware/{arch}/...` path pattern when possible.
    ///
    /// Returns [`BoardwalkError::PlatformNotFound`] when the directory holds
    /// no `platform.txt`.
    pub fn from_directory(
        root: &Path,
        parent: Option<Arc<Platform>>,
    ) -> Result<Self, BoardwalkError> {
        if !root.join(PLATFORM_FILENAME).exists() {
            return Err(BoardwalkError::PlatformNotFound { path: root.to_path_buf() });
        }
        let (vendor, architecture) = derive_identity(root).unwrap_or_else(|| {
            let arch = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| ROOT_PLATFORM_ARCH.to_string());
            (ROOT_PLATFORM_VENDOR.to_string(), arch)
        });
        Self::from_root(parent, vendor, architecture, root)
    }

    /// Platform vendor, e.g. `arduino`.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Platform architecture, e.g. `avr`.
    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// Root directory the description files were parsed from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Display name from the `name` key, when present.
    pub fn display_name(&self) -> Option<String> {
        self.value("name")
    }

    /// Path of the `boards.txt` file.
    pub fn boards_file_path(&self) -> PathBuf {
        self.root.join(BOARDS_FILENAME)
    }

    /// Path of the `platform.txt` file.
    pub fn platform_file_path(&self) -> PathBuf {
        self.root.join(PLATFORM_FILENAME)
    }

    /// Whether this platform targets the AVR architecture.
    pub fn is_avr(&self) -> bool {
        self.architecture.eq_ignore_ascii_case("avr")
    }

    /// Whether this platform targets the SAMD architecture.
    pub fn is_samd(&self) -> bool {
        self.architecture.eq_ignore_ascii_case("samd")
    }

    /// Whether this platform targets the PIC32 architecture.
    pub fn is_pic32(&self) -> bool {
        self.architecture.eq_ignore_ascii_case("pic32")
    }

    /// The raw boards table, shared by all boards of this platform.
    pub(crate) fn boards_data(&self) -> &IndexMap<String, String> {
        &self.boards_data
    }

    /// Parent platform (the bundled root platform), if any.
    pub fn parent_platform(&self) -> Option<&Arc<Platform>> {
        self.parent.as_ref()
    }

    /// Board ids declared in `boards.txt`, in declaration order.
    ///
    /// A board is declared by its `<id>.name` key.
    pub fn board_ids(&self) -> Vec<BoardId> {
        self.boards_data
            .keys()
            .filter_map(|key| match key.split_once('.') {
                Some((id, "name")) => Some(BoardId::new(id)),
                _ => None,
            })
            .collect()
    }

    /// All boards of this platform, in declaration order.
    pub fn boards(self: &Arc<Self>) -> Vec<Board> {
        self.board_ids().into_iter().map(|id| Board::new(Arc::clone(self), id)).collect()
    }

    /// Look up one board by id.
    pub fn board(self: &Arc<Self>, id: &str) -> Option<Board> {
        self.board_ids()
            .into_iter()
            .find(|b| b.as_str() == id)
            .map(|id| Board::new(Arc::clone(self), id))
    }

    // The stock PIC32 descriptions assume the vendor IDE toolchain; rewrite
    // tool names and flags for the xc32 toolchain the importer drives.
    fn apply_pic32_synthesis(&mut self) {
        self.data.insert("compiler.c.cmd".into(), "xc32-gcc".into());
        self.data.insert("compiler.c.elf.cmd".into(), "xc32-g++".into());
        self.data.insert("compiler.cpp.cmd".into(), "xc32-g++".into());
        self.data.insert("compiler.ar.cmd".into(), "xc32-ar".into());
        self.data.insert("compiler.objcopy.cmd".into(), "xc32-objcopy".into());
        self.data.insert("compiler.elf2hex.cmd".into(), "xc32-bin2hex".into());
        self.data.insert("compiler.size.cmd".into(), "xc32-size".into());

        let extra = self.data.get("build.extra_flags").cloned().unwrap_or_default();
        self.data.insert("build.extra_flags".into(), format!("{extra} -mnewlib-libc"));
        let define = self.data.get("compiler.define").cloned().unwrap_or_default();
        self.data
            .insert("compiler.define".into(), format!("{define} -D__CTYPE_NEWLIB -DXPRJ_default=default"));
        let cpp_flags = self.data.get("compiler.cpp.flags").cloned().unwrap_or_default();
        self.data.insert("compiler.cpp.flags".into(), format!("{cpp_flags} -std=gnu++11"));

        for value in self.data.values_mut() {
            *value = value.replace(" -O2 ", " -O1 ");
        }
    }
}

impl ConfigScope for Platform {
    fn data(&self) -> &IndexMap<String, String> {
        &self.data
    }

    fn parent(&self) -> Option<&dyn ConfigScope> {
        self.parent.as_deref().map(|p| p as &dyn ConfigScope)
    }

    fn describe(&self) -> String {
        format!("platform {}:{}", self.vendor, self.architecture)
    }
}

impl PartialEq for Platform {
    fn eq(&self, other: &Self) -> bool {
        self.vendor == other.vendor
            && self.architecture == other.architecture
            && self.root == other.root
    }
}

impl Eq for Platform {}

/// Derive `(vendor, architecture)` from a platform root path shaped like
/// `.../packages/{vendor}/hardware/{architecture}/1.2.3` or
/// `.../{vendor}/hardware/{architecture}`.
pub fn derive_identity(platform_root: &Path) -> Option<(String, String)> {
    let components: Vec<String> = platform_root
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let hardware_index = components.iter().rposition(|c| c.eq_ignore_ascii_case("hardware"))?;
    if hardware_index == 0 || hardware_index + 1 >= components.len() {
        return None;
    }
    let vendor = components[hardware_index - 1].clone();
    let architecture = components[hardware_index + 1].clone();
    Some((vendor, architecture))
}

/// Walk `settings_path` for `platform.txt` files and parse each hit into a
/// [`Platform`] below `root_platform`.
///
/// The root platform itself is appended to the result unless a discovered
/// platform shadows its vendor/architecture pair. Platforms that fail to
/// parse are logged and skipped.
pub fn discover_platforms(
    settings_path: &Path,
    root_platform: Arc<Platform>,
) -> Result<Vec<Arc<Platform>>, BoardwalkError> {
    if !settings_path.exists() {
        return Err(BoardwalkError::MalformedInput {
            path: settings_path.to_path_buf(),
            reason: "settings directory does not exist".into(),
        });
    }

    debug!("searching for platform files in {}", settings_path.display());
    let mut platforms = Vec::new();
    for entry in WalkDir::new(settings_path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == PLATFORM_FILENAME)
    {
        let root = entry.path().parent().expect("platform.txt has a parent directory");
        let Some((vendor, architecture)) = derive_identity(root) else {
            debug!("skipping {}: no vendor/hardware/arch path pattern", root.display());
            continue;
        };
        match Platform::from_root(Some(Arc::clone(&root_platform)), vendor, architecture, root) {
            Ok(platform) => platforms.push(Arc::new(platform)),
            Err(e) => warn!("failed to parse platform under {}: {e}", root.display()),
        }
    }

    let root_shadowed = platforms.iter().any(|p| {
        p.vendor().eq_ignore_ascii_case(root_platform.vendor())
            && p.architecture().eq_ignore_ascii_case(root_platform.architecture())
    });
    if !root_shadowed {
        platforms.push(root_platform);
    }
    Ok(platforms)
}
