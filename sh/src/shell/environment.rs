//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Value {
    pub value: String,
    pub export: bool,
}

impl Value {
    pub fn new(value: String) -> Self {
        Value {
            value,
            export: false,
        }
    }

    pub fn new_exported(value: String) -> Self {
        Value {
            value,
            export: true,
        }
    }
}

/// The shell's variable store. The exported subset, extended with any
/// stage-scoped assignments, becomes the environment of exec'd children.
#[derive(Default, Clone, Debug)]
pub struct Environment {
    pub variables: HashMap<String, Value>,
}

impl Environment {
    pub fn set(&mut self, name: String, value: String, export: bool) {
        match self.variables.entry(name) {
            Entry::Occupied(mut e) => {
                // the export attribute is sticky
                e.get_mut().value = value;
                e.get_mut().export |= export;
            }
            Entry::Vacant(e) => {
                let value = if export {
                    Value::new_exported(value)
                } else {
                    Value::new(value)
                };
                e.insert(value);
            }
        }
    }

    /// Marks an existing variable for export. Unknown names are ignored.
    pub fn export(&mut self, name: &str) {
        if let Some(var) = self.variables.get_mut(name) {
            var.export = true;
        }
    }

    pub fn get_str_value(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(|var| var.value.as_str())
    }

    pub fn exported(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables
            .iter()
            .filter(|(_, var)| var.export)
            .map(|(name, var)| (name.as_str(), var.value.as_str()))
    }
}

impl<I: IntoIterator<Item = (String, Value)>> From<I> for Environment {
    fn from(value: I) -> Self {
        Self {
            variables: value.into_iter().collect(),
        }
    }
}
