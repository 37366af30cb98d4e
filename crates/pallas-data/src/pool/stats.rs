// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Counters describing how well the pool is recycling buffers.

use serde::Serialize;
use std::fmt;

/// Lifetime counters of a [`ConstantBufferPool`](super::ConstantBufferPool).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Leases handed out.
    pub leases: u64,
    /// Leases served by an existing buffer.
    pub reuses: u64,
    /// Leases that had to create a new buffer.
    pub allocations: u64,
    /// Leases returned to the pool.
    pub releases: u64,
    /// Slot rotations.
    pub advances: u64,
    /// Bytes of device memory created by the pool, over its whole lifetime.
    pub bytes_allocated: u64,
}

impl PoolStats {
    /// Returns the fraction of leases that reused a buffer, in `[0, 1]`.
    pub fn reuse_ratio(&self) -> f64 {
        if self.leases == 0 {
            0.0
        } else {
            self.reuses as f64 / self.leases as f64
        }
    }

    /// Returns the number of leases not yet released.
    pub fn outstanding(&self) -> u64 {
        self.leases.saturating_sub(self.releases)
    }

    /// Renders the counters as pretty-printed RON, for run reports.
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} leases ({} reused, {} allocated, {:.1}% reuse), {} released, {} advances, {} bytes allocated",
            self.leases,
            self.reuses,
            self.allocations,
            self.reuse_ratio() * 100.0,
            self.releases,
            self.advances,
            self.bytes_allocated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_ratio_of_empty_stats_is_zero() {
        assert_eq!(PoolStats::default().reuse_ratio(), 0.0);
    }

    #[test]
    fn derived_values() {
        let stats = PoolStats {
            leases: 4,
            reuses: 3,
            allocations: 1,
            releases: 2,
            advances: 1,
            bytes_allocated: 64,
        };
        assert_eq!(stats.reuse_ratio(), 0.75);
        assert_eq!(stats.outstanding(), 2);
        assert!(stats.to_string().starts_with("4 leases (3 reused, 1 allocated, 75.0% reuse)"));
    }

    #[test]
    fn ron_report_names_every_counter() {
        let stats = PoolStats {
            leases: 10,
            reuses: 7,
            allocations: 3,
            releases: 10,
            advances: 5,
            bytes_allocated: 240,
        };
        let text = stats.to_ron_string().unwrap();
        for field in [
            "leases: 10",
            "reuses: 7",
            "allocations: 3",
            "releases: 10",
            "advances: 5",
            "bytes_allocated: 240",
        ] {
            assert!(text.contains(field), "missing `{field}` in {text}");
        }
    }
}
