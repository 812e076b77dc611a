//! Dependency ordering for declared resources
//!
//! `requires` edges form a small DAG. Execution follows a stable
//! topological order: among ready resources the one declared first runs
//! first, so runs are deterministic and failure localization is exact.

use crate::resource::Resource;
use std::collections::HashMap;

/// Compute a stable topological order over the declaration.
///
/// Returns declaration indices in execution order. On a cycle, returns
/// the references of every resource stuck in it. Unparseable or unknown
/// `requires` entries are ignored here; validation reports them.
pub fn execution_order(resources: &[Resource]) -> Result<Vec<usize>, Vec<String>> {
    let index: HashMap<String, usize> = resources
        .iter()
        .enumerate()
        .map(|(i, r)| (r.reference().to_string(), i))
        .collect();

    // dependents[i] = indices that require i
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); resources.len()];
    let mut indegree: Vec<usize> = vec![0; resources.len()];

    for (i, resource) in resources.iter().enumerate() {
        for reference in &resource.requires {
            if let Some(&dep) = index.get(reference.as_str()) {
                dependents[dep].push(i);
                indegree[i] += 1;
            }
        }
    }

    let mut order = Vec::with_capacity(resources.len());
    let mut done = vec![false; resources.len()];

    // Kahn with a declaration-order scan instead of a queue: among ready
    // resources, the lowest declaration index goes next.
    while order.len() < resources.len() {
        let next = (0..resources.len()).find(|&i| !done[i] && indegree[i] == 0);
        let Some(next) = next else {
            let stuck = resources
                .iter()
                .enumerate()
                .filter(|(i, _)| !done[*i])
                .map(|(_, r)| r.reference().to_string())
                .collect();
            return Err(stuck);
        };
        done[next] = true;
        order.push(next);
        for &dependent in &dependents[next] {
            indegree[dependent] -= 1;
        }
    }

    Ok(order)
}
