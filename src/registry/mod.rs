//! Data type registry
//!
//! Maps logical data type identifiers to their destination tables. The
//! built-in registry is initialized once on first use and is read-only
//! afterwards, so lookups from concurrent callers need no locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::models::DataTypeMapping;

/// Errors from registry construction and lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown data type: {0}")]
    NotFound(String),
    #[error("Duplicate data type: {0}")]
    Duplicate(String),
}

static BUILTIN: Lazy<Arc<TypeRegistry>> = Lazy::new(|| Arc::new(TypeRegistry::builtin()));

/// Static definitions of the supported data types
pub fn builtin_mappings() -> Vec<DataTypeMapping> {
    vec![
        DataTypeMapping::new(
            "maintenance",
            "blade_maintenance_data",
            "Aircraft maintenance schedules and predictive maintenance data",
        ),
        DataTypeMapping::new(
            "sortie",
            "blade_sortie_schedules",
            "Flight schedules and sortie planning data",
        ),
        DataTypeMapping::new(
            "deployment",
            "blade_deployment_plans",
            "Deployment preparation and logistics planning",
        ),
        DataTypeMapping::new(
            "logistics",
            "blade_logistics_general",
            "General logistics and supply chain data",
        ),
    ]
}

/// Immutable index of data type mappings
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    mappings: BTreeMap<String, DataTypeMapping>,
}

impl TypeRegistry {
    /// Registry holding the built-in data types
    pub fn builtin() -> Self {
        // The built-in table has unique keys.
        let mut mappings = BTreeMap::new();
        for mapping in builtin_mappings() {
            mappings.insert(mapping.data_type.clone(), mapping);
        }
        Self { mappings }
    }

    /// Build a registry from arbitrary mappings; keys must be unique
    pub fn from_mappings<I>(mappings: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = DataTypeMapping>,
    {
        let mut index = BTreeMap::new();
        for mapping in mappings {
            if index.contains_key(&mapping.data_type) {
                return Err(RegistryError::Duplicate(mapping.data_type));
            }
            index.insert(mapping.data_type.clone(), mapping);
        }
        Ok(Self { mappings: index })
    }

    /// Case-sensitive lookup by data type
    pub fn lookup(&self, data_type: &str) -> Result<&DataTypeMapping, RegistryError> {
        self.mappings
            .get(data_type)
            .ok_or_else(|| RegistryError::NotFound(data_type.to_string()))
    }

    /// Supported data type identifiers, sorted
    pub fn supported_types(&self) -> Vec<&str> {
        self.mappings.keys().map(String::as_str).collect()
    }

    /// All mappings, sorted by data type
    pub fn mappings(&self) -> impl Iterator<Item = &DataTypeMapping> {
        self.mappings.values()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// The process-wide built-in registry
pub fn global() -> &'static TypeRegistry {
    &BUILTIN
}

/// Shared handle to the built-in registry
pub fn shared() -> Arc<TypeRegistry> {
    Arc::clone(&BUILTIN)
}

/// Look up a data type in the built-in registry
pub fn lookup(data_type: &str) -> Result<&'static DataTypeMapping, RegistryError> {
    global().lookup(data_type)
}

/// Supported data types of the built-in registry
pub fn list_supported_types() -> Vec<&'static str> {
    global().supported_types()
}
