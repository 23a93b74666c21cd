//! The plugin loader (spec.md §4.8, C8): dlopen-style dynamic loading of
//! matrix-element shared libraries so they can self-register into the
//! `Registry` at load time.
//!
//! Grounded on the original's `SharedLibrary`/`LibraryManager`
//! (`examples/original_source/include/SharedLibrary.h`,
//! `examples/original_source/include/LibraryManager.h`): there, `dlopen` is
//! wrapped directly and handles are kept in a process-lifetime singleton so
//! symbols stay resolvable for the run's duration; `libloading` (used the
//! same way in wasmtime's `examples/min-platform`) is the idiomatic
//! equivalent here.
//!
//! A loaded library is expected to run its self-registration as part of
//! being loaded (the `ctor`-style pattern the original's `REGISTER_MODULE`
//! macro relies on); this port instead asks the library for one exported
//! entry point, `momemta_register_plugin`, and calls it with a reference to
//! the process registry, which is simpler to express safely across an FFI
//! boundary than relying on static constructors in the loaded image.

use crate::error::PluginError;
use crate::registry::Registry;
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A plugin's single entry point: given the process registry, register
/// whatever module types this plugin provides.
type RegisterFn = unsafe extern "C" fn(&Registry) -> i32;

const ENTRY_POINT: &[u8] = b"momemta_register_plugin";

/// Holds every loaded library handle for the process lifetime. Unloading is
/// not supported: a module instance built from a plugin's factory may
/// outlive any particular `PluginLoader` call, so the library must stay
/// mapped until the process exits.
#[derive(Default)]
pub struct PluginLoader {
    loaded: Mutex<Vec<(PathBuf, Library)>>,
}

impl PluginLoader {
    pub fn new() -> Self {
        PluginLoader {
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// Load a shared library from `path` and run its self-registration
    /// entry point against `registry`. Safety: the loaded image's
    /// `momemta_register_plugin` symbol must match `RegisterFn`'s
    /// signature; this is an unavoidable FFI trust boundary, the same one
    /// the original's `dlopen`-based loader has.
    pub fn load(&self, path: impl AsRef<Path>, registry: &Registry) -> Result<(), PluginError> {
        let path = path.as_ref().to_path_buf();

        let library = unsafe { Library::new(&path) }.map_err(|source| PluginError::LoadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let register: Symbol<RegisterFn> = unsafe { library.get(ENTRY_POINT) }.map_err(|source| PluginError::LoadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let result = unsafe { register(registry) };
        if result != 0 {
            return Err(PluginError::RegistrationCollision(format!(
                "{}: momemta_register_plugin returned {result}",
                path.display()
            )));
        }
        drop(register);

        tracing::info!(path = %path.display(), "loaded plugin");
        self.loaded
            .lock()
            .expect("plugin loader mutex poisoned")
            .push((path, library));
        Ok(())
    }

    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.loaded
            .lock()
            .expect("plugin loader mutex poisoned")
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}
