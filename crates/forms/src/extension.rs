//! Entry surface of the extension module.
//!
//! A loader resolves [`formext_initialize`], receives the [`ExtensionApiV1`]
//! table and talks to the extension only through it.

use std::ffi::{CStr, CString, c_char, c_void};
use std::path::PathBuf;
use std::sync::{LazyLock, OnceLock};

use formext_abi::ExtensionApiV1;
use formext_config::{Config, logging};

use crate::error::LifecycleError;
use crate::lifecycle::{Lifecycle, Registry};

pub const SOLUTION_NAME: &str = "formext";

pub const MAJOR_VERSION: u8 = 0x01;
pub const MINOR_VERSION: u8 = 0x00;
/// Alpha/beta counter; `0xFF` marks a post-beta build.
pub const BETA_VERSION: u8 = 0x00;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "FORMEXT_CONFIG";
const DEFAULT_CONFIG: &str = "formext.toml";

/// Packs the version bytes with a record kind into one word.
///
/// Kind 0 gives the overall build version.
pub const fn record_version(kind: u8) -> u32 {
	(MAJOR_VERSION as u32) << 24 | (MINOR_VERSION as u32) << 16 | (BETA_VERSION as u32) << 8 | kind as u32
}

static DESCRIPTION: LazyLock<CString> = LazyLock::new(|| {
	CString::new(format!(
		"{SOLUTION_NAME}, v{MAJOR_VERSION}.{MINOR_VERSION} beta{BETA_VERSION}"
	))
	.unwrap_or_default()
});

/// Short human-readable description, e.g. `formext, v1.0 beta0`.
pub fn description() -> &'static str {
	DESCRIPTION.to_str().unwrap_or(SOLUTION_NAME)
}

static REGISTRY: Registry = Registry::new();
static LIFECYCLE: OnceLock<Lifecycle> = OnceLock::new();

static API: ExtensionApiV1 = ExtensionApiV1::new(test_command, describe);

/// The lifecycle installed by [`initialize`], if any.
pub fn lifecycle() -> Option<&'static Lifecycle> {
	LIFECYCLE.get()
}

/// Installs logging, registers every collected record type and seals the
/// registry. Later calls return the existing lifecycle.
pub fn initialize(config: &Config) -> Result<&'static Lifecycle, LifecycleError> {
	if let Some(lifecycle) = LIFECYCLE.get() {
		return Ok(lifecycle);
	}
	if let Err(error) = logging::init(&config.log) {
		tracing::warn!(%error, "keeping existing tracing subscriber");
	}
	tracing::info!(host = %config.host, "initializing {}", description());

	let lifecycle = Lifecycle::from_config(&REGISTRY, config)?;
	let codes = lifecycle.register_collected()?;
	lifecycle.seal();
	tracing::debug!(types = codes.len(), "extension initialized");

	Ok(LIFECYCLE.get_or_init(|| lifecycle))
}

/// The interface table handed to the loader.
pub fn api() -> &'static ExtensionApiV1 {
	&API
}

/// Loader entry point. Returns null if initialization failed.
#[unsafe(no_mangle)]
pub extern "C" fn formext_initialize() -> *const ExtensionApiV1 {
	let path = std::env::var_os(CONFIG_ENV)
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
	let result = Config::load_or_default(&path)
		.map_err(LifecycleError::from)
		.and_then(|config| initialize(&config));
	match result {
		Ok(_) => api(),
		Err(error) => {
			tracing::error!(path = %path.display(), %error, "extension initialization failed");
			std::ptr::null()
		}
	}
}

fn arg(ptr: *const c_char) -> String {
	if ptr.is_null() {
		return String::new();
	}
	// SAFETY: non-null arguments are NUL-terminated strings owned by the loader.
	unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Demonstration command: logs its target and arguments.
unsafe extern "C" fn test_command(target: *mut c_void, a: *const c_char, b: *const c_char, c: *const c_char) {
	tracing::debug!(
		object = ?target,
		a = %arg(a),
		b = %arg(b),
		c = %arg(c),
		"test command"
	);
}

unsafe extern "C" fn describe() -> *const c_char {
	tracing::info!("{}", description());
	DESCRIPTION.as_ptr()
}
