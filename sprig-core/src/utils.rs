//! Utility functions for the container
//!
//! This module provides the bean naming strategy and the resolution chain
//! used to detect circular factory bean references.

/// Naming convention utilities for bean names
pub mod naming {
    use crate::bean::BeanDefinition;

    /// Converts a PascalCase type name to camelCase for bean naming.
    ///
    /// This is the default bean naming strategy, similar to Spring's behavior
    /// where `UserService` becomes `userService`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sprig_core::utils::naming::to_camel_case;
    ///
    /// assert_eq!(to_camel_case("UserService"), "userService");
    /// assert_eq!(to_camel_case("ABean"), "aBean");
    /// assert_eq!(to_camel_case(""), "");
    /// ```
    pub fn to_camel_case(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = String::with_capacity(s.len());
                result.extend(first.to_lowercase());
                result.push_str(chars.as_str());
                result
            }
        }
    }

    /// Generates the default bean name for a definition.
    ///
    /// Only definitions carrying a bean class can be named this way; the name
    /// is the camelCase short name of that class. Instance factory definitions
    /// have no class to derive a name from and yield `None`.
    pub fn generate_bean_name(definition: &BeanDefinition) -> Option<String> {
        let class = definition.bean_class()?;
        let name = to_camel_case(class.short_name());
        (!name.is_empty()).then_some(name)
    }
}

/// Dependency resolution utilities
pub mod dependency {
    /// Tracks the chain of bean names currently being resolved by one call.
    ///
    /// Each top-level resolution owns its own chain, so concurrent resolutions
    /// of the same prototype on different threads never interfere with each
    /// other. Entering a name that is already on the chain means the factory
    /// bean references loop back on themselves.
    #[derive(Debug, Default, Clone)]
    pub struct ResolutionChain {
        names: Vec<String>,
    }

    impl ResolutionChain {
        /// Creates a new empty chain.
        pub fn new() -> Self {
            Self { names: Vec::new() }
        }

        /// Pushes `name` onto the chain.
        ///
        /// # Errors
        ///
        /// Returns the full cycle (ending with `name`) if `name` is already
        /// being resolved further up the chain.
        pub fn enter(&mut self, name: &str) -> Result<(), Vec<String>> {
            if self.contains(name) {
                let mut cycle = self.names.clone();
                cycle.push(name.to_string());
                return Err(cycle);
            }
            self.names.push(name.to_string());
            Ok(())
        }

        /// Pops `name` from the chain. Names must be exited in reverse order.
        pub fn exit(&mut self, name: &str) {
            if self.names.last().map(String::as_str) == Some(name) {
                self.names.pop();
            } else {
                tracing::error!("Resolution chain out of order: exiting '{}' from {:?}", name, self.names);
            }
        }

        /// Checks if a bean is currently being resolved.
        pub fn contains(&self, name: &str) -> bool {
            self.names.iter().any(|n| n == name)
        }

        pub fn depth(&self) -> usize {
            self.names.len()
        }
    }
}

#[cfg(test)]
mod tests {
    mod naming_tests {
        use super::super::naming::*;
        use crate::bean::BeanDefinition;
        use crate::types::TypeDescriptor;

        #[test]
        fn test_to_camel_case() {
            assert_eq!(to_camel_case("UserService"), "userService");
            assert_eq!(to_camel_case("DatabaseService"), "databaseService");
            assert_eq!(to_camel_case("A"), "a");
            assert_eq!(to_camel_case("AB"), "aB");
            assert_eq!(to_camel_case(""), "");
            assert_eq!(to_camel_case("lowerCase"), "lowerCase");
        }

        #[test]
        fn test_generate_bean_name() {
            struct UserService;
            let class = TypeDescriptor::builder::<UserService>()
                .constructor(|| Ok(UserService))
                .build();

            let bd = BeanDefinition::new().with_bean_class(&class);
            assert_eq!(generate_bean_name(&bd).as_deref(), Some("userService"));

            let bd = BeanDefinition::new()
                .with_factory_bean("factory")
                .with_factory_method("make");
            assert_eq!(generate_bean_name(&bd), None);
        }
    }

    mod dependency_tests {
        use super::super::dependency::*;

        #[test]
        fn test_resolution_chain() {
            let mut chain = ResolutionChain::new();

            assert!(!chain.contains("serviceA"));
            chain.enter("serviceA").unwrap();
            chain.enter("serviceB").unwrap();
            assert_eq!(chain.depth(), 2);

            let cycle = chain.enter("serviceA").unwrap_err();
            assert_eq!(cycle, vec!["serviceA", "serviceB", "serviceA"]);

            chain.exit("serviceB");
            chain.exit("serviceA");
            assert_eq!(chain.depth(), 0);
        }

        #[test]
        fn test_self_reference() {
            let mut chain = ResolutionChain::new();
            chain.enter("serviceA").unwrap();
            let cycle = chain.enter("serviceA").unwrap_err();
            assert_eq!(cycle.len(), 2);
        }
    }
}
