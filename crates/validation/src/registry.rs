//! Validator registry.

use std::collections::HashMap;
use std::sync::Arc;
use tutorkit_core::ValidatorName;

use crate::builtin;
use crate::validator::Validator;

/// Validators by name.
pub struct ValidatorRegistry {
    validators: HashMap<ValidatorName, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in validators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, validator) in builtin::builtins() {
            registry.validators.insert(name, validator);
        }
        registry
    }

    /// Register a validator, returning the one it replaced.
    pub fn register(
        &mut self,
        name: ValidatorName,
        validator: Arc<dyn Validator>,
    ) -> Option<Arc<dyn Validator>> {
        self.validators.insert(name, validator)
    }

    /// Unregister a validator.
    pub fn unregister(&mut self, name: &ValidatorName) -> Option<Arc<dyn Validator>> {
        self.validators.remove(name)
    }

    /// Get a validator by name.
    pub fn get(&self, name: &ValidatorName) -> Option<Arc<dyn Validator>> {
        self.validators.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<ValidatorName> {
        let mut names: Vec<_> = self.validators.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::FnValidator;
    use tutorkit_core::names;

    #[test]
    fn test_builtins_registered() {
        let registry = ValidatorRegistry::with_builtins();
        assert_eq!(registry.list().len(), 7);
        assert!(registry.get(&ValidatorName::new(names::POP_BUBBLE)).is_some());
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = ValidatorRegistry::new();
        let name = ValidatorName::new("custom");
        let replaced = registry.register(name.clone(), Arc::new(FnValidator::new(|_, _, _| true)));
        assert!(replaced.is_none());
        assert_eq!(registry.list(), vec![name.clone()]);

        assert!(registry.unregister(&name).is_some());
        assert!(registry.get(&name).is_none());
        assert!(registry.unregister(&name).is_none());
    }
}
