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

//! Defines the error type for buffer resource operations.

use crate::renderer::api::BufferId;
use std::fmt;

/// An error related to the creation or use of a GPU buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The device could not satisfy an allocation.
    OutOfMemory {
        /// The number of bytes that were requested.
        requested: u64,
        /// The number of bytes the device still had available.
        available: u64,
    },
    /// The handle used to reference a buffer is not (or no longer) valid.
    InvalidHandle(BufferId),
    /// The buffer is already mapped for CPU access.
    AlreadyMapped(BufferId),
    /// The buffer is not currently mapped.
    NotMapped(BufferId),
    /// A buffer descriptor was rejected by the device.
    InvalidDescriptor(String),
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::OutOfMemory {
                requested,
                available,
            } => write!(
                f,
                "Out of device memory: requested {requested} bytes, {available} available."
            ),
            ResourceError::InvalidHandle(id) => write!(f, "Invalid buffer handle: {id}."),
            ResourceError::AlreadyMapped(id) => write!(f, "Buffer {id} is already mapped."),
            ResourceError::NotMapped(id) => write!(f, "Buffer {id} is not mapped."),
            ResourceError::InvalidDescriptor(msg) => {
                write!(f, "Invalid buffer descriptor: {msg}")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_display() {
        let err = ResourceError::OutOfMemory {
            requested: 256,
            available: 64,
        };
        assert_eq!(
            format!("{err}"),
            "Out of device memory: requested 256 bytes, 64 available."
        );
    }

    #[test]
    fn handle_errors_name_the_buffer() {
        assert_eq!(
            format!("{}", ResourceError::InvalidHandle(BufferId(7))),
            "Invalid buffer handle: buffer#7."
        );
        assert_eq!(
            format!("{}", ResourceError::NotMapped(BufferId(3))),
            "Buffer buffer#3 is not mapped."
        );
    }

    #[test]
    fn is_std_error() {
        let err: Box<dyn std::error::Error> =
            Box::new(ResourceError::BackendError("lost".to_string()));
        assert_eq!(err.to_string(), "Backend-specific resource error: lost");
    }
}
