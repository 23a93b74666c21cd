//! The frozen output of the graph builder (spec.md §4.5 step 7): a main
//! `Path`, a named set of sub-paths (one per `Looper`), the shared `Pool`
//! they all read and write, and the integration dimensionality.

use crate::input_tag::InputTag;
use crate::path::Path;
use crate::value::Pool;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Plan {
    pub pool: Arc<Pool>,
    pub main: Path,
    pub sub_paths: HashMap<String, Path>,
    pub n_dimensions: usize,
    pub integrand_tags: Vec<InputTag>,
}

impl Plan {
    pub fn new(pool: Arc<Pool>, main: Path, sub_paths: HashMap<String, Path>, n_dimensions: usize, integrand_tags: Vec<InputTag>) -> Self {
        Plan {
            pool,
            main,
            sub_paths,
            n_dimensions,
            integrand_tags,
        }
    }
}
