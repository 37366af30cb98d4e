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

//! The per-type layout cache.

use super::layout::ParameterLayout;
use super::schema::ShaderParameters;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Plans each [`ShaderParameters`] type once and hands out the shared result.
///
/// Lives on the render-submission thread alongside the buffer pool; it is not `Send`.
#[derive(Default)]
pub struct LayoutRegistry {
    layouts: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl LayoutRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the layout of `T`, planning it on first use.
    pub fn get<T: ShaderParameters>(&self) -> Rc<ParameterLayout<T>> {
        let key = TypeId::of::<T>();
        if let Some(cached) = self.layouts.borrow().get(&key) {
            return Self::downcast(Rc::clone(cached));
        }

        let layout = Rc::new(ParameterLayout::<T>::build());
        self.layouts
            .borrow_mut()
            .insert(key, layout.clone() as Rc<dyn Any>);
        layout
    }

    /// Returns `true` if `T` has already been planned.
    pub fn contains<T: ShaderParameters>(&self) -> bool {
        self.layouts.borrow().contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of planned types.
    pub fn len(&self) -> usize {
        self.layouts.borrow().len()
    }

    /// Returns `true` if no type has been planned yet.
    pub fn is_empty(&self) -> bool {
        self.layouts.borrow().is_empty()
    }

    fn downcast<T: ShaderParameters>(erased: Rc<dyn Any>) -> Rc<ParameterLayout<T>> {
        match erased.downcast::<ParameterLayout<T>>() {
            Ok(layout) => layout,
            Err(_) => unreachable!("LayoutRegistry: entries are keyed by their own TypeId"),
        }
    }
}

impl fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutRegistry")
            .field("planned_types", &self.len())
            .finish()
    }
}
