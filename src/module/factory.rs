use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::module::{library, ModuleCreator, ModuleSet};
use crate::SimError;

lazy_static! {
    static ref STANDARD_LIBRARY: ModuleFactory = ModuleFactory::from_creators(library::creators());
}

/// The process-wide factory holding the standard module library
///
/// It is built on first use and never modified afterwards, so lookups are safe
/// from any thread.
pub fn standard_library() -> &'static ModuleFactory {
    &STANDARD_LIBRARY
}

/// Read-only registry of module creators, keyed by module name
///
/// Factories are assembled with [ModuleFactory::builder] and cannot be
/// modified once built.
///
/// # Example
///
/// ```
/// use biosim::*;
///
/// let oscillator = standard_library().retrieve("harmonic_oscillator").unwrap();
/// assert_eq!(oscillator.kind(), ModuleKind::Derivative);
/// assert!(standard_library().retrieve("no_such_module").is_err());
/// ```
#[derive(Clone, Default)]
pub struct ModuleFactory {
    creators: HashMap<String, Arc<dyn ModuleCreator>>,
}

impl ModuleFactory {
    pub fn builder() -> ModuleFactoryBuilder {
        ModuleFactoryBuilder {
            creators: Vec::new(),
        }
    }

    fn from_creators(creators: Vec<Arc<dyn ModuleCreator>>) -> Self {
        ModuleFactory {
            creators: creators
                .into_iter()
                .map(|creator| (creator.name().to_string(), creator))
                .collect(),
        }
    }

    /// Look up the creator registered under `name`
    pub fn retrieve(&self, name: &str) -> Result<Arc<dyn ModuleCreator>, SimError> {
        self.creators
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::ModuleNotFound(name.to_string()))
    }

    /// Look up several creators, keeping the requested order
    pub fn retrieve_all(&self, names: &[&str]) -> Result<ModuleSet, SimError> {
        names.iter().map(|name| self.retrieve(name)).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    /// Names of every registered module, sorted
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.creators.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

/// Collects creators before a [ModuleFactory] is frozen
pub struct ModuleFactoryBuilder {
    creators: Vec<Arc<dyn ModuleCreator>>,
}

impl ModuleFactoryBuilder {
    pub fn register(mut self, creator: impl ModuleCreator + 'static) -> Self {
        self.creators.push(Arc::new(creator));
        self
    }

    pub fn register_shared(mut self, creator: Arc<dyn ModuleCreator>) -> Self {
        self.creators.push(creator);
        self
    }

    /// Validate every descriptor and freeze the registry
    ///
    /// Names must be unique and non-empty, and a module may not declare the
    /// same output twice or produce nothing at all.
    pub fn build(self) -> Result<ModuleFactory, SimError> {
        let mut seen = HashSet::new();
        for creator in &self.creators {
            validate_descriptor(creator.as_ref())?;
            if !seen.insert(creator.name().to_string()) {
                return Err(SimError::DuplicateModule(creator.name().to_string()));
            }
        }
        Ok(ModuleFactory::from_creators(self.creators))
    }
}

pub(crate) fn validate_descriptor(creator: &dyn ModuleCreator) -> Result<(), SimError> {
    let name = creator.name();
    if name.trim().is_empty() {
        return Err(SimError::invalid_module(name, "module name is empty"));
    }

    let outputs = creator.outputs();
    if outputs.is_empty() {
        return Err(SimError::invalid_module(name, "module declares no outputs"));
    }

    let mut seen = HashSet::new();
    for output in &outputs {
        if output.trim().is_empty() {
            return Err(SimError::invalid_module(name, "empty output name"));
        }
        if !seen.insert(output.as_str()) {
            return Err(SimError::invalid_module(
                name,
                format!("output '{}' is declared more than once", output),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{FnCreator, ModuleKind};

    fn noop() -> FnCreator {
        FnCreator::new("noop", ModuleKind::SteadyState, &[], &["a"], |_, out| {
            out.update("a", 0.0)
        })
    }

    #[test]
    fn test_standard_library_is_valid() {
        let mut builder = ModuleFactory::builder();
        for creator in library::creators() {
            builder = builder.register_shared(creator);
        }
        let factory = builder.build().unwrap();
        assert_eq!(factory.module_names(), standard_library().module_names());
    }

    #[test]
    fn test_retrieve_unknown_module() {
        match standard_library().retrieve("photosynthesis_magic") {
            Err(SimError::ModuleNotFound(name)) => assert_eq!(name, "photosynthesis_magic"),
            _ => panic!("expected ModuleNotFound"),
        }
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let result = ModuleFactory::builder()
            .register(noop())
            .register(noop())
            .build();
        assert!(matches!(result, Err(SimError::DuplicateModule(name)) if name == "noop"));
    }

    #[test]
    fn test_repeated_output_is_rejected() {
        let creator = FnCreator::new("twice", ModuleKind::SteadyState, &[], &["a", "a"], |_, out| {
            out.update("a", 0.0)
        });
        let result = ModuleFactory::builder().register(creator).build();
        assert!(matches!(result, Err(SimError::InvalidModule { .. })));
    }

    #[test]
    fn test_retrieve_all_keeps_order() {
        let set = standard_library()
            .retrieve_all(&["harmonic_energy", "harmonic_oscillator"])
            .unwrap();
        let names: Vec<&str> = set.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["harmonic_energy", "harmonic_oscillator"]);
    }

    #[test]
    fn test_lookups_from_many_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    standard_library()
                        .retrieve("solar_position_michalsky")
                        .map(|c| c.name().to_string())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "solar_position_michalsky");
        }
    }
}
