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

//! Typed parameter sets bound to pooled constant buffers.

use crate::params::{write_parameters_mapped, ParameterLayout, ShaderParameters};
use crate::pool::{BufferLease, ConstantBufferPool};
use pallas_core::renderer::{BufferId, ResourceError};
use std::fmt;
use std::rc::Rc;

/// One live binding of a [`ShaderParameters`] type to a leased constant buffer.
///
/// The set owns its lease exclusively and returns it to the slot it was drawn
/// from when dropped. It is move-only.
///
/// # Examples
///
/// ```
/// use pallas_core::math::Vec4;
/// use pallas_data::{param_schema, ConstantBufferPool, ParameterSet, PoolSettings};
/// use pallas_data::{SchemaBuilder, ShaderParameters};
/// use pallas_infra::HostGraphicsDevice;
/// use std::sync::Arc;
///
/// struct Tint {
///     color: Vec4,
/// }
///
/// impl ShaderParameters for Tint {
///     fn declare(schema: &mut SchemaBuilder<Self>) {
///         param_schema!(schema, Tint { color });
///     }
/// }
///
/// let pool = ConstantBufferPool::new(Arc::new(HostGraphicsDevice::new()), &PoolSettings::default());
/// let mut set = ParameterSet::<Tint>::new(&pool, "Tint").unwrap();
/// set.write(&Tint { color: Vec4::ONE });
/// assert_eq!(set.size(), 16);
/// drop(set);
/// pool.shutdown();
/// ```
pub struct ParameterSet<T: ShaderParameters> {
    pool: ConstantBufferPool,
    layout: Rc<ParameterLayout<T>>,
    lease: Option<BufferLease>,
}

impl<T: ShaderParameters> ParameterSet<T> {
    /// Leases a buffer sized for `T` from the pool's active slot.
    ///
    /// # Errors
    ///
    /// Returns the device error if the pool has to create a buffer and cannot.
    pub fn new(pool: &ConstantBufferPool, label: &str) -> Result<Self, ResourceError> {
        let layout = pool.layout::<T>();
        let lease = pool.lease(layout.size(), label)?;
        Ok(Self {
            pool: pool.clone(),
            layout,
            lease: Some(lease),
        })
    }

    /// Leases a buffer and writes `values` into it.
    pub fn with_values(
        pool: &ConstantBufferPool,
        label: &str,
        values: &T,
    ) -> Result<Self, ResourceError> {
        let mut set = Self::new(pool, label)?;
        set.write(values);
        Ok(set)
    }

    /// Packs `values` into the mapped buffer. Padding bytes are left as they are.
    pub fn write(&mut self, values: &T) {
        let Some(lease) = self.lease.as_mut() else {
            unreachable!("ParameterSet: lease taken before drop");
        };
        write_parameters_mapped(&self.layout, values, lease.mapping_mut());
    }

    /// Returns the bound buffer.
    pub fn buffer(&self) -> BufferId {
        self.lease().buffer()
    }

    /// Returns the frame slot the buffer was leased from.
    pub fn slot(&self) -> usize {
        self.lease().slot()
    }

    /// Returns the packed size of `T`.
    pub fn size(&self) -> u64 {
        self.layout.size()
    }

    /// Returns the real size of the bound buffer.
    pub fn capacity(&self) -> u64 {
        self.lease().capacity()
    }

    /// Returns the layout of `T`.
    pub fn layout(&self) -> &ParameterLayout<T> {
        &self.layout
    }

    /// Returns the bytes currently in the mapped buffer, up to the packed size.
    pub fn bytes(&self) -> &[u8] {
        &self.lease().mapping().as_slice()[..self.layout.size() as usize]
    }

    fn lease(&self) -> &BufferLease {
        match &self.lease {
            Some(lease) => lease,
            None => unreachable!("ParameterSet: lease taken before drop"),
        }
    }
}

impl<T: ShaderParameters> Drop for ParameterSet<T> {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take() {
            self.pool.release(lease);
        }
    }
}

impl<T: ShaderParameters> fmt::Debug for ParameterSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSet")
            .field("type_name", &self.layout.type_name())
            .field("lease", &self.lease)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param_schema;
    use crate::params::SchemaBuilder;
    use crate::pool::PoolSettings;
    use pallas_core::math::{Mat4, Vec3};
    use pallas_infra::HostGraphicsDevice;
    use std::sync::Arc;

    struct Object {
        world: Mat4,
        tint: Vec3,
        roughness: f32,
    }

    impl ShaderParameters for Object {
        fn declare(schema: &mut SchemaBuilder<Self>) {
            param_schema!(schema, Object { world, tint, roughness });
        }
    }

    fn object() -> Object {
        Object {
            world: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            tint: Vec3::new(0.5, 0.25, 0.125),
            roughness: 0.75,
        }
    }

    fn pool() -> (Arc<HostGraphicsDevice>, ConstantBufferPool) {
        let device = Arc::new(HostGraphicsDevice::new());
        let pool = ConstantBufferPool::new(device.clone(), &PoolSettings::default());
        (device, pool)
    }

    #[test]
    fn write_reaches_the_device_buffer() {
        let (device, pool) = pool();
        let set = ParameterSet::with_values(&pool, "Object", &object()).unwrap();

        assert_eq!(set.size(), 80);
        let stored = device.read_buffer(set.buffer()).unwrap();
        assert_eq!(&stored[..80], set.bytes());

        // Row 0 of a translation matrix ends with the x offset.
        assert_eq!(f32::from_ne_bytes(stored[12..16].try_into().unwrap()), 1.0);
        assert_eq!(f32::from_ne_bytes(stored[76..80].try_into().unwrap()), 0.75);

        drop(set);
        pool.shutdown();
    }

    #[test]
    fn drop_releases_into_the_recorded_slot() {
        let (_device, pool) = pool();
        let set = ParameterSet::<Object>::new(&pool, "Object").unwrap();
        assert_eq!(set.slot(), 0);
        assert_eq!(pool.slot_counts(0).leased, 1);

        pool.advance_slot();
        drop(set);

        let counts = pool.slot_counts(0);
        assert_eq!(counts.leased, 0);
        assert_eq!(counts.freed, 1);
        assert_eq!(pool.slot_counts(1).total, 0);
        pool.shutdown();
    }

    #[test]
    fn sets_share_one_layout() {
        let (_device, pool) = pool();
        let a = ParameterSet::<Object>::new(&pool, "A").unwrap();
        let b = ParameterSet::<Object>::new(&pool, "B").unwrap();

        assert!(std::ptr::eq(a.layout(), b.layout()));
        assert_ne!(a.buffer(), b.buffer());
        assert_eq!(pool.layouts().len(), 1);

        drop((a, b));
        pool.shutdown();
    }
}
