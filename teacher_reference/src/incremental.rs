//! Incremental Materialization Engine
//!
//! `IncrementalEngine` provides persistent incremental computation for one
//! knowledge graph. It owns a timely worker thread with Differential Dataflow
//! InputSessions for base relations, and coordinates derived relation
//! materialization and index management.
//!
//! ## Architecture
//!
//! ```text
//! Main thread --command_tx--► Worker thread (timely::execute_directly)
//!                              ├─ InputSessions (one per base relation)
//!                              ├─ Arrangements (queryable via cursor)
//!                              ├─ DerivedRelationsManager (rule tracking)
//!                              ├─ IndexManager (HNSW indexes)
//!                              └─ Command loop (blocking recv + batch)
//! ```
//!
//! ## Thread Safety
//!
//! InputSessions and TraceAgents are NOT Send/Sync (Rc-based internally).
//! All DD state lives on the worker thread. The main thread communicates
//! exclusively through the command channel.

use crate::derived_relations::{CompiledRule, DerivedRelationsManager};
use crate::index_manager::{Index, IndexManager, IndexStats, RegisteredIndex, TupleId};
use crate::value::Tuple;
use crossbeam_channel as channel;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Commands sent from the main thread to the worker thread.
enum EngineCommand {
    // === Base Relation Operations ===
    InsertDelta {
        relation: String,
        updates: Vec<(Tuple, u64, isize)>,
    },
    AdvanceTime(u64),
    WaitUntilCaughtUp {
        time: u64,
        response: channel::Sender<()>,
    },
    ReadRelation {
        relation: String,
        response: channel::Sender<Vec<Tuple>>,
    },
    AddRelation {
        name: String,
        response: channel::Sender<()>,
    },
    Shutdown {
        response: channel::Sender<()>,
    },

    // === Derived Relations ===
    RegisterRule {
        rule: CompiledRule,
        response: channel::Sender<Result<(), String>>,
    },
    RemoveRule {
        name: String,
        response: channel::Sender<()>,
    },
    ReadDerivedRelation {
        relation: String,
        response: channel::Sender<Option<Vec<Tuple>>>,
    },
    SetMaterialized {
        relation: String,
        tuples: Vec<Tuple>,
        response: channel::Sender<()>,
    },
    NotifyBaseUpdate {
        relation: String,
        response: channel::Sender<Vec<String>>,
    },
    GetDerivedStats {
        response: channel::Sender<(usize, usize, usize)>,
    },

    // === Index Management ===
    RegisterIndex {
        index: RegisteredIndex,
        response: channel::Sender<Result<(), String>>,
    },
    RemoveIndex {
        name: String,
        response: channel::Sender<Result<(), String>>,
    },
    SetIndexMaterialized {
        name: String,
        index: Box<dyn Index + Send + Sync>,
        tuple_count: usize,
        response: channel::Sender<()>,
    },
    GetIndexStats {
        name: Option<String>,
        response: channel::Sender<Vec<IndexStats>>,
    },
    UpdateIndex {
        name: String,
        inserts: Vec<(TupleId, Vec<f32>)>,
        deletes: Vec<TupleId>,
        response: channel::Sender<Result<(), String>>,
    },
    NotifyIndexesBaseUpdate {
        relation: String,
        response: channel::Sender<Vec<String>>,
    },
}

/// Handle to the incremental computation engine for one knowledge graph.
///
/// Owns a dedicated worker thread running a timely/DD computation. All DD
/// state (InputSessions, TraceAgents) is confined to the worker thread.
/// The main thread communicates exclusively through the command channel.
pub struct IncrementalEngine {
    command_tx: channel::Sender<EngineCommand>,
    worker_handle: Option<std::thread::JoinHandle<()>>,
    current_time: Arc<AtomicU64>,
    max_write_time: Arc<AtomicU64>,
    known_relations: Mutex<HashSet<String>>,
    derived_relations: Arc<Mutex<DerivedRelationsManager>>,
    index_manager: Arc<Mutex<IndexManager>>,
}

impl IncrementalEngine {
    /// Create a new incremental engine with a single worker thread.
    ///
    /// `relations` specifies the initial base relations to create InputSessions for.
    pub fn new(relations: Vec<String>) -> Result<Self, String> {
        let (command_tx, command_rx) = channel::unbounded::<EngineCommand>();
        let current_time = Arc::new(AtomicU64::new(0));
        let max_write_time = Arc::new(AtomicU64::new(0));
        let known_relations = Mutex::new(relations.iter().cloned().collect());
        let derived_relations = Arc::new(Mutex::new(DerivedRelationsManager::new()));
        let derived_clone = Arc::clone(&derived_relations);
        let index_manager = Arc::new(Mutex::new(IndexManager::new()));
        let index_clone = Arc::clone(&index_manager);

        let worker_handle = std::thread::Builder::new()
            .name("incremental-worker".to_string())
            .spawn(move || {
                Self::worker_loop(relations, command_rx, derived_clone, index_clone);
            })
            .map_err(|e| format!("Failed to spawn worker thread: {e}"))?;

        Ok(IncrementalEngine {
            command_tx,
            worker_handle: Some(worker_handle),
            current_time,
            max_write_time,
            known_relations,
            derived_relations,
            index_manager,
        })
    }

    /// The worker thread's main loop.
    ///
    /// Creates a timely computation with u64 timestamps, InputSessions for
    /// each relation, and arrangements. Processes commands via blocking recv.
    fn worker_loop(
        relations: Vec<String>,
        command_rx: channel::Receiver<EngineCommand>,
        derived_relations: Arc<Mutex<DerivedRelationsManager>>,
        index_manager: Arc<Mutex<IndexManager>>,
    ) {
        use differential_dataflow::input::Input;
        use differential_dataflow::operators::arrange::ArrangeBySelf;
        use differential_dataflow::trace::cursor::Cursor;
        use differential_dataflow::trace::TraceReader;
        use timely::dataflow::operators::Probe;
        use timely::dataflow::ProbeHandle;

        timely::execute_directly(move |worker| {
            let mut probe = ProbeHandle::<u64>::new();

            let mut input_sessions: HashMap<
                String,
                differential_dataflow::input::InputSession<u64, Tuple, isize>,
            > = HashMap::new();

            type KeyTrace =
                differential_dataflow::trace::implementations::ord::OrdKeySpine<Tuple, u64, isize>;
            type KeyTraceAgent = differential_dataflow::operators::arrange::TraceAgent<KeyTrace>;
            let mut traces: HashMap<String, KeyTraceAgent> = HashMap::new();

            worker.dataflow::<u64, _, _>(|scope| {
                for relation in &relations {
                    let (session, collection) = scope.new_collection::<Tuple, isize>();
                    input_sessions.insert(relation.clone(), session);
                    let arranged = collection.arrange_by_self();
                    arranged.stream.probe_with(&mut probe);
                    traces.insert(relation.clone(), arranged.trace.clone());
                }
            });

            // Command processing loop: blocking recv + batch drain
            loop {
                let first_cmd = match command_rx.recv() {
                    Ok(cmd) => cmd,
                    Err(_) => return, // channel disconnected
                };

                let mut commands = vec![first_cmd];
                while let Ok(cmd) = command_rx.try_recv() {
                    commands.push(cmd);
                }

                for cmd in commands {
                    match cmd {
                        EngineCommand::InsertDelta { relation, updates } => {
                            if let Some(session) = input_sessions.get_mut(&relation) {
                                for (data, time, diff) in updates {
                                    session.update_at(data, time, diff);
                                }
                            }
                        }

                        EngineCommand::AdvanceTime(time) => {
                            for session in input_sessions.values_mut() {
                                session.advance_to(time);
                                session.flush();
                            }
                            worker.step();
                        }

                        EngineCommand::WaitUntilCaughtUp { time, response } => {
                            for session in input_sessions.values_mut() {
                                session.flush();
                            }
                            while probe.less_than(&time) {
                                worker.step();
                                std::thread::yield_now();
                            }
                            let _ = response.send(());
                        }

                        EngineCommand::ReadRelation { relation, response } => {
                            let mut result = Vec::new();
                            if let Some(trace) = traces.get_mut(&relation) {
                                let (mut cursor, storage) = trace.cursor();
                                while cursor.key_valid(&storage) {
                                    let key = cursor.key(&storage).clone();
                                    let mut total_diff: isize = 0;
                                    cursor.map_times(&storage, |_time, diff| {
                                        total_diff += diff;
                                    });
                                    if total_diff > 0 {
                                        result.push(key);
                                    }
                                    cursor.step_key(&storage);
                                }
                            }
                            let _ = response.send(result);
                        }

                        EngineCommand::AddRelation { name, response } => {
                            if !input_sessions.contains_key(&name) {
                                worker.dataflow::<u64, _, _>(|scope| {
                                    let (session, collection) =
                                        scope.new_collection::<Tuple, isize>();
                                    input_sessions.insert(name.clone(), session);
                                    let arranged = collection.arrange_by_self();
                                    arranged.stream.probe_with(&mut probe);
                                    traces.insert(name.clone(), arranged.trace.clone());
                                });
                            }
                            let _ = response.send(());
                        }

                        EngineCommand::Shutdown { response } => {
                            // Drop sessions without stepping to avoid merge batcher issues
                            input_sessions.clear();
                            traces.clear();
                            let _ = response.send(());
                            return;
                        }

                        // === Derived Relations ===
                        EngineCommand::RegisterRule { rule, response } => {
                            let mut mgr = derived_relations.lock();
                            mgr.register_rule(rule);
                            let _ = response.send(Ok(()));
                        }

                        EngineCommand::RemoveRule { name, response } => {
                            let mut mgr = derived_relations.lock();
                            mgr.remove_rule(&name);
                            let _ = response.send(());
                        }

                        EngineCommand::ReadDerivedRelation { relation, response } => {
                            let mgr = derived_relations.lock();
                            let result = mgr.get_materialized(&relation).map(|m| m.tuples.clone());
                            let _ = response.send(result);
                        }

                        EngineCommand::SetMaterialized {
                            relation,
                            tuples,
                            response,
                        } => {
                            let mut mgr = derived_relations.lock();
                            mgr.set_materialized(&relation, tuples);
                            let _ = response.send(());
                        }

                        EngineCommand::NotifyBaseUpdate { relation, response } => {
                            let mut mgr = derived_relations.lock();
                            let invalidated = mgr.notify_base_update(&relation);
                            let _ = response.send(invalidated);
                        }

                        EngineCommand::GetDerivedStats { response } => {
                            let mgr = derived_relations.lock();
                            let stats = mgr.stats();
                            let _ = response.send((
                                stats.total_rules,
                                stats.materialized_count,
                                stats.invalid_count,
                            ));
                        }

                        // === Index Management ===
                        EngineCommand::RegisterIndex { index, response } => {
                            let mut mgr = index_manager.lock();
                            let result = mgr.register_index(index);
                            let _ = response.send(result);
                        }

                        EngineCommand::RemoveIndex { name, response } => {
                            let mut mgr = index_manager.lock();
                            let result = mgr.remove_index(&name);
                            let _ = response.send(result);
                        }

                        EngineCommand::SetIndexMaterialized {
                            name,
                            index,
                            tuple_count,
                            response,
                        } => {
                            let mut mgr = index_manager.lock();
                            mgr.set_materialized(&name, index, tuple_count);
                            let _ = response.send(());
                        }

                        EngineCommand::GetIndexStats { name, response } => {
                            let mgr = index_manager.lock();
                            let stats = match name {
                                Some(n) => mgr.get_stats(&n).into_iter().collect(),
                                None => mgr.get_all_stats(),
                            };
                            let _ = response.send(stats);
                        }

                        EngineCommand::UpdateIndex {
                            name,
                            inserts,
                            deletes,
                            response,
                        } => {
                            let mut mgr = index_manager.lock();
                            let result = if let Some(mat) = mgr.get_materialized_mut(&name) {
                                for id in deletes {
                                    mat.index.delete(id);
                                }
                                let mut insert_result = Ok(());
                                for (id, vector) in inserts {
                                    if let Err(e) = mat.index.insert(id, &vector) {
                                        insert_result = Err(e);
                                        break;
                                    }
                                }
                                mat.tuple_count = mat.index.len();
                                insert_result
                            } else {
                                Err(format!("Index '{name}' not found or invalid"))
                            };
                            let _ = response.send(result);
                        }

                        EngineCommand::NotifyIndexesBaseUpdate { relation, response } => {
                            let mut mgr = index_manager.lock();
                            let invalidated = mgr.notify_base_update(&relation);
                            let _ = response.send(invalidated);
                        }
                    }
                }
            }
        });
    }

    // === Base Relation Operations ===

    /// Insert tuples into a base relation at the given logical time.
    pub fn insert(&self, relation: &str, tuples: Vec<Tuple>, time: u64) -> Result<(), String> {
        self.ensure_relation(relation)?;
        self.max_write_time.fetch_max(time, Ordering::SeqCst);
        let updates: Vec<(Tuple, u64, isize)> = tuples.into_iter().map(|t| (t, time, 1)).collect();
        self.command_tx
            .send(EngineCommand::InsertDelta {
                relation: relation.to_string(),
                updates,
            })
            .map_err(|_| "Worker disconnected".to_string())
    }

    /// Delete tuples from a base relation at the given logical time.
    pub fn delete(&self, relation: &str, tuples: Vec<Tuple>, time: u64) -> Result<(), String> {
        self.ensure_relation(relation)?;
        self.max_write_time.fetch_max(time, Ordering::SeqCst);
        let updates: Vec<(Tuple, u64, isize)> = tuples.into_iter().map(|t| (t, time, -1)).collect();
        self.command_tx
            .send(EngineCommand::InsertDelta {
                relation: relation.to_string(),
                updates,
            })
            .map_err(|_| "Worker disconnected".to_string())
    }

    /// Advance the logical time and flush all InputSessions.
    pub fn advance_time(&self, time: u64) -> Result<(), String> {
        self.current_time.store(time, Ordering::SeqCst);
        self.command_tx
            .send(EngineCommand::AdvanceTime(time))
            .map_err(|_| "Worker disconnected".to_string())
    }

    /// Block until the computation has processed all updates through `time`.
    pub fn wait_until_caught_up(&self, time: u64) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::WaitUntilCaughtUp { time, response: tx })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while waiting".to_string())
    }

    /// Read all current tuples from a base relation.
    pub fn read_relation(&self, relation: &str) -> Result<Vec<Tuple>, String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::ReadRelation {
                relation: relation.to_string(),
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while reading".to_string())
    }

    /// Read with consistency: advance time past all writes, wait, then read.
    pub fn read_relation_consistent(&self, relation: &str) -> Result<Vec<Tuple>, String> {
        let max_time = self.max_write_time.load(Ordering::SeqCst);
        let target = max_time + 1;
        self.advance_time(target)?;
        self.wait_until_caught_up(target)?;
        self.read_relation(relation)
    }

    /// Get the current logical time.
    pub fn current_time(&self) -> u64 {
        self.current_time.load(Ordering::SeqCst)
    }

    /// Get the maximum write time seen so far.
    pub fn max_write_time(&self) -> u64 {
        self.max_write_time.load(Ordering::SeqCst)
    }

    /// Ensure a relation exists (idempotent).
    pub fn ensure_relation(&self, name: &str) -> Result<(), String> {
        {
            let known = self.known_relations.lock();
            if known.contains(name) {
                return Ok(());
            }
        }
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::AddRelation {
                name: name.to_string(),
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while adding relation".to_string())?;
        self.known_relations.lock().insert(name.to_string());
        Ok(())
    }

    // === Derived Relations API ===

    /// Register a compiled rule for materialization.
    pub fn register_rule(&self, rule: CompiledRule) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::RegisterRule { rule, response: tx })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while registering rule".to_string())?
    }

    /// Remove a rule and its materialization.
    pub fn remove_rule(&self, name: &str) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::RemoveRule {
                name: name.to_string(),
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while removing rule".to_string())
    }

    /// Read materialized data for a derived relation.
    pub fn read_derived_relation(&self, relation: &str) -> Result<Option<Vec<Tuple>>, String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::ReadDerivedRelation {
                relation: relation.to_string(),
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while reading derived".to_string())
    }

    /// Set materialized data for a derived relation.
    pub fn set_materialized(&self, relation: &str, tuples: Vec<Tuple>) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::SetMaterialized {
                relation: relation.to_string(),
                tuples,
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while setting materialized".to_string())
    }

    /// Notify that a base relation was updated. Returns invalidated relation names.
    pub fn notify_base_update(&self, relation: &str) -> Result<Vec<String>, String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::NotifyBaseUpdate {
                relation: relation.to_string(),
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while notifying".to_string())
    }

    /// Get (total_rules, materialized_count, invalid_count).
    pub fn get_derived_stats(&self) -> Result<(usize, usize, usize), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::GetDerivedStats { response: tx })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while getting stats".to_string())
    }

    /// Check if a relation is derived (has a registered rule).
    pub fn is_derived_relation(&self, name: &str) -> bool {
        self.derived_relations.lock().is_derived(name)
    }

    /// Get direct access to the derived relations manager.
    pub fn derived_relations(&self) -> Arc<Mutex<DerivedRelationsManager>> {
        Arc::clone(&self.derived_relations)
    }

    // === Index Management API ===

    /// Register a new index (metadata only, does not build).
    pub fn register_index(&self, index: RegisteredIndex) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::RegisterIndex {
                index,
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while registering index".to_string())?
    }

    /// Remove an index.
    pub fn remove_index(&self, name: &str) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::RemoveIndex {
                name: name.to_string(),
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while removing index".to_string())?
    }

    /// Store a built index.
    pub fn set_index_materialized(
        &self,
        name: &str,
        index: Box<dyn Index + Send + Sync>,
        tuple_count: usize,
    ) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::SetIndexMaterialized {
                name: name.to_string(),
                index,
                tuple_count,
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while setting index".to_string())
    }

    /// Get index statistics.
    pub fn get_index_stats(&self, name: Option<&str>) -> Result<Vec<IndexStats>, String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::GetIndexStats {
                name: name.map(String::from),
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while getting index stats".to_string())
    }

    /// Apply incremental updates to an index.
    pub fn update_index(
        &self,
        name: &str,
        inserts: Vec<(TupleId, Vec<f32>)>,
        deletes: Vec<TupleId>,
    ) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::UpdateIndex {
                name: name.to_string(),
                inserts,
                deletes,
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while updating index".to_string())?
    }

    /// Notify indexes that a base relation was updated.
    pub fn notify_indexes_base_update(&self, relation: &str) -> Result<Vec<String>, String> {
        let (tx, rx) = channel::bounded(1);
        self.command_tx
            .send(EngineCommand::NotifyIndexesBaseUpdate {
                relation: relation.to_string(),
                response: tx,
            })
            .map_err(|_| "Worker disconnected".to_string())?;
        rx.recv()
            .map_err(|_| "Worker disconnected while notifying indexes".to_string())
    }

    /// Check if an index exists.
    pub fn has_index(&self, name: &str) -> bool {
        self.index_manager.lock().has_index(name)
    }

    /// Get direct access to the index manager.
    pub fn index_manager(&self) -> Arc<Mutex<IndexManager>> {
        Arc::clone(&self.index_manager)
    }

    /// Shut down the computation cleanly.
    pub fn shutdown(mut self) -> Result<(), String> {
        let (tx, rx) = channel::bounded(1);
        let _ = self
            .command_tx
            .send(EngineCommand::Shutdown { response: tx });
        let _ = rx.recv();
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| "Worker thread panicked".to_string())?;
        }
        Ok(())
    }
}

impl Drop for IncrementalEngine {
    fn drop(&mut self) {
        let (tx, rx) = channel::bounded(1);
        let _ = self
            .command_tx
            .send(EngineCommand::Shutdown { response: tx });
        let _ = rx.recv_timeout(std::time::Duration::from_secs(5));
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}
