//! The graph builder (spec.md §4.5, C5): turns a `TopLevelConfig` plus a
//! `Registry` into a frozen `Plan`.
//!
//! Grounded on the original's `ConfigurationReader`
//! (`examples/original_source/include/momemta/ConfigurationReader.h`), which
//! performs the same validate-then-wire-then-freeze sequence over a Lua
//! table; this port runs the seven steps spec.md lays out explicitly instead
//! of interleaving them with script evaluation.

use crate::configuration::{AttributeTable, ConfigValue, ModuleInstanceDecl, TopLevelConfig};
use crate::error::{ConfigurationError, GraphError};
use crate::input_tag::InputTag;
use crate::module::ModuleContext;
use crate::path::Path;
use crate::plan::Plan;
use crate::registry::Registry;
use crate::schema::{AttrDef, AttrType, ModuleDef};
use crate::value::Pool;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

const INTERNAL_MODULES: &[&str] = &["cuba", "input", "met", "momemta"];

/// Validate a single declared instance's attribute table against its
/// schema (step 1), returning the set of known attribute/input names so the
/// unknown-key check below it can run.
fn validate_attributes(
    def: &ModuleDef,
    decl: &ModuleInstanceDecl,
    globals: &AttributeTable,
) -> Result<(), ConfigurationError> {
    let mut known: HashSet<&str> = HashSet::new();

    for attr in &def.attributes {
        known.insert(attr.name.as_str());

        if attr.global {
            if globals.get(&attr.name).is_none() && attr.default.is_none() {
                return Err(ConfigurationError::MissingGlobalAttribute(attr.name.clone()));
            }
            continue;
        }

        match decl.attributes.get(&attr.name) {
            Some(value) => check_type(def, attr, value)?,
            None if attr.optional || attr.default.is_some() => {}
            None => {
                return Err(ConfigurationError::MissingAttribute {
                    module: decl.name.clone(),
                    attribute: attr.name.clone(),
                })
            }
        }
    }

    for input in &def.inputs {
        known.insert(input.name.as_str());
        for nested in &input.nested_attributes {
            known.insert(nested.name.as_str());
        }

        if input.optional || input.default.is_some() {
            continue;
        }

        let present = if input.nested_attributes.is_empty() {
            decl.attributes.get(&input.name).is_some()
        } else {
            let path: Vec<String> = input.nested_attributes.iter().map(|a| a.name.clone()).collect();
            decl.attributes.descend_value(&path).is_some()
        };
        if !present {
            return Err(ConfigurationError::MissingAttribute {
                module: decl.name.clone(),
                attribute: input.name.clone(),
            });
        }
    }

    for (name, _) in decl.attributes.iter() {
        if !known.contains(name.as_str()) {
            return Err(ConfigurationError::UnknownAttribute {
                module: decl.name.clone(),
                attribute: name.clone(),
            });
        }
    }

    Ok(())
}

fn check_type(def: &ModuleDef, attr: &AttrDef, value: &ConfigValue) -> Result<(), ConfigurationError> {
    let matches = match attr.ty {
        AttrType::Bool => value.as_bool().is_some(),
        AttrType::Integer => value.as_integer().is_some(),
        AttrType::Real => value.as_real().is_some(),
        AttrType::String => value.as_str().is_some(),
        AttrType::InputTag => value.as_input_tag().is_some(),
        AttrType::Path => value.as_path().is_some(),
    };
    if matches {
        Ok(())
    } else {
        Err(ConfigurationError::TypeMismatch {
            module: def.name.clone(),
            attribute: attr.name.clone(),
            expected: attr.ty.to_string(),
            got: format!("{value:?}"),
        })
    }
}

/// Step 2: every `InputTag` reachable from a declared instance's attributes,
/// including those nested under `nested_attributes` paths declared by its
/// inputs.
fn extract_references(def: &ModuleDef, decl: &ModuleInstanceDecl) -> Vec<InputTag> {
    let mut tags = Vec::new();
    for (_, value) in decl.attributes.iter() {
        value.collect_input_tags(&mut tags);
    }
    for input in &def.inputs {
        if input.nested_attributes.is_empty() {
            continue;
        }
        let path: Vec<String> = input.nested_attributes.iter().map(|a| a.name.clone()).collect();
        if let Some(value) = decl.attributes.descend_value(&path) {
            value.collect_input_tags(&mut tags);
        }
    }
    tags
}

/// A `Path`-valued attribute names a `Looper`'s sub-path, in user-declared
/// order.
fn extract_sub_path(decl: &ModuleInstanceDecl) -> Option<Vec<String>> {
    for (_, value) in decl.attributes.iter() {
        if let ConfigValue::Path(names) = value {
            return Some(names.clone());
        }
    }
    None
}

struct Validated<'a> {
    decl: &'a ModuleInstanceDecl,
    def: ModuleDef,
    depends_on: Vec<String>,
    sub_path: Option<Vec<String>>,
}

pub fn build(registry: &Registry, config: &TopLevelConfig) -> Result<Plan, crate::error::MomemtaError> {
    // Step 1 + duplicate name check.
    let mut seen_names = HashSet::new();
    let mut validated = Vec::with_capacity(config.modules.len());
    for decl in &config.modules {
        if !seen_names.insert(decl.name.as_str()) {
            return Err(ConfigurationError::DuplicateModuleName(decl.name.clone()).into());
        }
        let def = registry
            .schema(&decl.module_type)
            .ok_or_else(|| ConfigurationError::UnknownModule(decl.module_type.clone()))?;
        validate_attributes(&def, decl, &config.parameters)?;

        let refs = extract_references(&def, decl);
        let sub_path = extract_sub_path(decl);
        let depends_on = refs
            .iter()
            .filter(|tag| !INTERNAL_MODULES.contains(&tag.module.as_str()))
            .map(|tag| tag.module.clone())
            .collect();

        validated.push(Validated {
            decl,
            def,
            depends_on,
            sub_path,
        });
    }

    // Step 3: producer index, (module, output) -> module name.
    let mut producer_index: HashMap<(String, String), String> = HashMap::new();
    let def_by_module: HashMap<&str, &ModuleDef> = validated.iter().map(|v| (v.decl.name.as_str(), &v.def)).collect();
    for v in &validated {
        for output in &v.def.outputs {
            let key = (v.decl.name.clone(), output.name.clone());
            if producer_index.insert(key.clone(), v.decl.name.clone()).is_some() {
                return Err(GraphError::DuplicateProducer {
                    module: key.0,
                    output: key.1,
                }
                .into());
            }
        }
    }
    for tag in all_referenced_tags(&validated, &config.integrand) {
        if INTERNAL_MODULES.contains(&tag.module.as_str()) {
            if let Some(def) = registry.schema(&tag.module) {
                check_indexed_shape(&def, &tag)?;
            }
            continue;
        }
        let key = (tag.module.clone(), tag.parameter.clone());
        if !producer_index.contains_key(&key) {
            return Err(GraphError::UnknownProducer {
                module: tag.module.clone(),
                output: tag.parameter.clone(),
            }
            .into());
        }
        if let Some(&def) = def_by_module.get(tag.module.as_str()) {
            check_indexed_shape(def, &tag)?;
        }
    }

    // Sub-path module names are not part of the main topological order; set
    // them aside first so pruning/ordering only see main-path candidates.
    let sub_path_members: HashSet<String> = validated
        .iter()
        .filter_map(|v| v.sub_path.clone())
        .flatten()
        .collect();

    // Step 4: pruning. Roots are sticky modules and integrand sinks; walk
    // dependency edges backwards (consumer -> producer).
    let by_name: HashMap<&str, &Validated> = validated.iter().map(|v| (v.decl.name.as_str(), v)).collect();
    let mut reachable: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    for v in &validated {
        if v.def.sticky {
            queue.push_back(v.decl.name.clone());
        }
    }
    for tag in &config.integrand {
        if !INTERNAL_MODULES.contains(&tag.module.as_str()) {
            queue.push_back(tag.module.clone());
        }
    }

    while let Some(name) = queue.pop_front() {
        if !reachable.insert(name.clone()) {
            continue;
        }
        if let Some(v) = by_name.get(name.as_str()) {
            for dep in &v.depends_on {
                if !reachable.contains(dep) {
                    queue.push_back(dep.clone());
                }
            }
            if let Some(members) = &v.sub_path {
                for member in members {
                    if !reachable.contains(member) {
                        queue.push_back(member.clone());
                    }
                }
            }
        }
    }

    let survivors: Vec<&Validated> = validated
        .iter()
        .filter(|v| reachable.contains(v.decl.name.as_str()) && !sub_path_members.contains(v.decl.name.as_str()))
        .collect();

    // Step 5: topological order of the main-path survivors.
    let main_order = topo_sort(&survivors)?;

    // Step 6: dimension accounting happens as we freeze (step 7), since only
    // constructed instances can report `dimensions()`.
    let pool = Arc::new(Pool::new());
    let mut main = Path::new();
    let mut n_dimensions = 0usize;

    for name in &main_order {
        let v = by_name[name.as_str()];
        let ctx = ModuleContext::new(v.decl.name.clone(), pool.clone());
        let instance = registry.instantiate(&v.decl.module_type, ctx, &v.decl.attributes)?;
        n_dimensions += instance.dimensions();
        main.push(v.decl.name.clone(), instance);
    }

    let mut sub_paths = HashMap::new();
    for v in &validated {
        let Some(members) = &v.sub_path else { continue };
        if !reachable.contains(v.decl.name.as_str()) {
            continue;
        }
        validate_sub_path_visibility(v, members, &by_name, &reachable)?;

        let mut sub = Path::new();
        for member in members {
            let mv = by_name
                .get(member.as_str())
                .ok_or_else(|| GraphError::SubPathVisibility {
                    module: v.decl.name.clone(),
                    dependency: member.clone(),
                })?;
            let ctx = ModuleContext::new(mv.decl.name.clone(), pool.clone());
            let instance = registry.instantiate(&mv.decl.module_type, ctx, &mv.decl.attributes)?;
            n_dimensions += instance.dimensions();
            sub.push(mv.decl.name.clone(), instance);
        }
        sub_paths.insert(v.decl.name.clone(), sub);
    }

    pool.freeze();

    tracing::info!(
        main_modules = main.len(),
        sub_paths = sub_paths.len(),
        n_dimensions,
        "plan built"
    );
    Ok(Plan::new(pool, main, sub_paths, n_dimensions, config.integrand.clone()))
}

/// Step 3/5: an indexed tag (`module::parameter/i`) only makes sense against
/// a producer whose declared output is a sequence (spec.md §8 scenario #4).
/// Silently accepts a tag naming an output the producer's schema doesn't
/// declare at all — that's the separate `UnknownProducer` check's job.
fn check_indexed_shape(def: &ModuleDef, tag: &InputTag) -> Result<(), GraphError> {
    let Some(index) = tag.index else { return Ok(()) };
    match def.outputs.iter().find(|o| o.name == tag.parameter) {
        Some(output) if !output.many => Err(GraphError::IndexedTagForScalar {
            module: tag.module.clone(),
            parameter: tag.parameter.clone(),
            index,
        }),
        _ => Ok(()),
    }
}

fn all_referenced_tags(validated: &[Validated], integrand: &[InputTag]) -> Vec<InputTag> {
    let mut tags = Vec::new();
    for v in validated {
        for (_, value) in v.decl.attributes.iter() {
            value.collect_input_tags(&mut tags);
        }
    }
    tags.extend(integrand.iter().cloned());
    tags
}

fn validate_sub_path_visibility(
    looper: &Validated,
    members: &[String],
    by_name: &HashMap<&str, &Validated>,
    outer_reachable: &HashSet<String>,
) -> Result<(), GraphError> {
    let mut visible: HashSet<&str> = HashSet::new();
    for member in members {
        let Some(mv) = by_name.get(member.as_str()) else {
            return Err(GraphError::SubPathVisibility {
                module: looper.decl.name.clone(),
                dependency: member.clone(),
            });
        };
        for dep in &mv.depends_on {
            if !visible.contains(dep.as_str()) && !outer_reachable.contains(dep) {
                return Err(GraphError::SubPathVisibility {
                    module: mv.decl.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        visible.insert(member.as_str());
    }
    Ok(())
}

/// Kahn's algorithm over the surviving main-path modules' dependency edges.
fn topo_sort(survivors: &[&Validated]) -> Result<Vec<String>, GraphError> {
    let survivor_names: HashSet<&str> = survivors.iter().map(|v| v.decl.name.as_str()).collect();

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for v in survivors {
        in_degree.entry(v.decl.name.as_str()).or_insert(0);
        for dep in &v.depends_on {
            if !survivor_names.contains(dep.as_str()) {
                continue;
            }
            *in_degree.entry(v.decl.name.as_str()).or_insert(0) += 1;
            dependents.entry(dep.as_str()).or_default().push(v.decl.name.as_str());
        }
    }

    let mut queue: VecDeque<&str> = survivors
        .iter()
        .map(|v| v.decl.name.as_str())
        .filter(|n| in_degree.get(n).copied().unwrap_or(0) == 0)
        .collect();

    let mut order = Vec::with_capacity(survivors.len());
    while let Some(name) = queue.pop_front() {
        order.push(name.to_string());
        if let Some(deps) = dependents.get(name) {
            for &dependent in deps {
                let entry = in_degree.get_mut(dependent).expect("dependent tracked in in_degree");
                *entry -= 1;
                if *entry == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if order.len() != survivors.len() {
        let stuck = survivors
            .iter()
            .map(|v| v.decl.name.as_str())
            .find(|n| !order.contains(&n.to_string()))
            .unwrap_or("<unknown>");
        return Err(GraphError::CyclicGraph(stuck.to_string()));
    }

    Ok(order)
}
