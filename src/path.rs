//! An ordered sequence of module instances to run in turn (spec.md §4.4,
//! §4.5 step 6).
//!
//! Grounded on the original's `Path` (`examples/original_source/include/momemta/Path.h`):
//! there it's a bare `{names, modules}` struct filled in by the graph
//! evaluator after topological sort. This port keeps the same shape — name
//! plus constructed instance, in execution order — but folds in the
//! lifecycle-driving methods the engine needs (`run_work`, and the
//! begin/end hooks), since nothing else owns that responsibility here.

use crate::error::RuntimeError;
use crate::module::{ModuleInstance, Status};

/// One module's slot in a `Path`: its declared instance name (for
/// diagnostics) next to its constructed instance.
pub struct PathEntry {
    pub name: String,
    pub instance: ModuleInstance,
}

/// An ordered, already-resolved run of modules. The main path runs once per
/// sample; a `Looper`'s sub-path runs once per loop iteration.
#[derive(Default)]
pub struct Path {
    entries: Vec<PathEntry>,
}

impl Path {
    pub fn new() -> Self {
        Path { entries: Vec::new() }
    }

    pub fn push(&mut self, name: impl Into<String>, instance: ModuleInstance) {
        self.entries.push(PathEntry {
            name: name.into(),
            instance,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PathEntry> {
        self.entries.iter_mut()
    }

    pub fn begin_integration(&mut self) {
        for entry in &mut self.entries {
            entry.instance.begin_integration();
        }
    }

    pub fn end_integration(&mut self) {
        for entry in &mut self.entries {
            entry.instance.end_integration();
        }
    }

    pub fn begin_loop(&mut self) {
        for entry in &mut self.entries {
            entry.instance.begin_loop();
        }
    }

    pub fn end_loop(&mut self) {
        for entry in &mut self.entries {
            entry.instance.end_loop();
        }
    }

    pub fn finish(&mut self) {
        for entry in &mut self.entries {
            entry.instance.finish();
        }
    }

    /// Run every module's `work()` in order, stopping as soon as one returns
    /// anything other than `Status::Ok` (spec.md §4.4: a non-`Ok` status
    /// short-circuits the rest of the path).
    pub fn run_work(&mut self) -> Result<Status, RuntimeError> {
        for entry in &mut self.entries {
            match entry.instance.work() {
                Ok(Status::Ok) => continue,
                Ok(other) => return Ok(other),
                Err(mut err) => {
                    if err.module.is_empty() {
                        err.module = entry.name.clone();
                    }
                    return Err(err);
                }
            }
        }
        Ok(Status::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;

    struct CountingModule {
        calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
        status: Status,
    }

    impl Module for CountingModule {
        fn work(&mut self) -> Result<Status, RuntimeError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.status)
        }
    }

    #[test]
    fn run_work_executes_in_order_and_stops_on_non_ok() {
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut path = Path::new();
        path.push(
            "a",
            Box::new(CountingModule {
                calls: calls.clone(),
                status: Status::Ok,
            }),
        );
        path.push(
            "b",
            Box::new(CountingModule {
                calls: calls.clone(),
                status: Status::NextCombination,
            }),
        );
        path.push(
            "c",
            Box::new(CountingModule {
                calls: calls.clone(),
                status: Status::Ok,
            }),
        );

        let result = path.run_work().unwrap();
        assert_eq!(result, Status::NextCombination);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
