//! Compute resource hints attached to plan nodes.

use serde::{Deserialize, Serialize};

/// Resources an instruction needs, used by the scheduler for placement.
///
/// Every field is optional; an unset field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub num_cpus: Option<f64>,
    pub num_gpus: Option<f64>,
    pub memory_bytes: Option<usize>,
}

impl ResourceRequest {
    /// A request that places no constraint.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_num_cpus(mut self, num_cpus: f64) -> Self {
        self.num_cpus = Some(num_cpus);
        self
    }

    #[must_use]
    pub fn with_num_gpus(mut self, num_gpus: f64) -> Self {
        self.num_gpus = Some(num_gpus);
        self
    }

    #[must_use]
    pub fn with_memory_bytes(mut self, memory_bytes: usize) -> Self {
        self.memory_bytes = Some(memory_bytes);
        self
    }

    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        self.num_cpus.is_none() && self.num_gpus.is_none() && self.memory_bytes.is_none()
    }

    /// Field-wise maximum over a set of requests.
    ///
    /// Unset fields are ignored; a field stays unset only if it is unset in
    /// every request.
    pub fn max_of<'a>(requests: impl IntoIterator<Item = &'a ResourceRequest>) -> Self {
        requests
            .into_iter()
            .fold(Self::default(), |acc, req| Self {
                num_cpus: max_opt(acc.num_cpus, req.num_cpus, f64::max),
                num_gpus: max_opt(acc.num_gpus, req.num_gpus, f64::max),
                memory_bytes: max_opt(acc.memory_bytes, req.memory_bytes, usize::max),
            })
    }
}

fn max_opt<T>(a: Option<T>, b: Option<T>, max: impl Fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(max(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

impl std::fmt::Display for ResourceRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(cpus) = self.num_cpus {
            parts.push(format!("cpus={cpus}"));
        }
        if let Some(gpus) = self.num_gpus {
            parts.push(format!("gpus={gpus}"));
        }
        if let Some(mem) = self.memory_bytes {
            parts.push(format!("memory={mem}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}
