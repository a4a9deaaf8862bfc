//! Extension: the set of classes one native module exposes
//!
//! The host loads the module, obtains its [`Extension`] (usually through the
//! symbol generated by `#[extension]`), and once it allows classes to be
//! declared calls [`Extension::startup`]. [`Extension::shutdown`] runs when
//! the module is unloaded.

use std::fmt;

use crate::class::ClassDescriptor;
use crate::error::{BridgeResult, UsageError};
use crate::host::{ClassEntry, HostRuntime};
use crate::object::Base;

/// Class-independent view of a [`ClassDescriptor`].
pub trait ClassRegistration {
    /// Class name
    fn name(&self) -> &str;
    /// Number of methods
    fn method_count(&self) -> usize;
    /// Whether the class is declared to the host
    fn is_initialized(&self) -> bool;
    /// Host handle, once initialized
    fn class_entry(&self) -> Option<ClassEntry>;
    /// See [`ClassDescriptor::initialize`]
    fn initialize(&mut self, host: &mut dyn HostRuntime) -> BridgeResult<ClassEntry>;
    /// See [`ClassDescriptor::shutdown`]
    fn shutdown(&mut self, host: &mut dyn HostRuntime) -> BridgeResult<()>;
    /// See [`ClassDescriptor::construct`]
    fn construct(&self) -> Box<dyn Base>;
}

impl<T: Base> ClassRegistration for ClassDescriptor<T> {
    fn name(&self) -> &str {
        ClassDescriptor::name(self)
    }

    fn method_count(&self) -> usize {
        ClassDescriptor::method_count(self)
    }

    fn is_initialized(&self) -> bool {
        ClassDescriptor::is_initialized(self)
    }

    fn class_entry(&self) -> Option<ClassEntry> {
        ClassDescriptor::class_entry(self)
    }

    fn initialize(&mut self, host: &mut dyn HostRuntime) -> BridgeResult<ClassEntry> {
        ClassDescriptor::initialize(self, host)
    }

    fn shutdown(&mut self, host: &mut dyn HostRuntime) -> BridgeResult<()> {
        ClassDescriptor::shutdown(self, host)
    }

    fn construct(&self) -> Box<dyn Base> {
        ClassDescriptor::construct(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Defined,
    Running,
    Failed,
    Stopped,
}

/// A native module: name, version and its classes.
pub struct Extension {
    name: String,
    version: String,
    classes: Vec<Box<dyn ClassRegistration>>,
    phase: Phase,
}

impl Extension {
    /// Create a new extension.
    ///
    /// # Arguments
    /// * `name` - Module name as the host knows it
    /// * `version` - Module version
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            classes: Vec::new(),
            phase: Phase::Defined,
        }
    }

    /// Add a class. Classes are declared in the order they are added.
    pub fn add_class<T: Base>(&mut self, class: ClassDescriptor<T>) -> BridgeResult<&mut Self> {
        if self.phase != Phase::Defined {
            return Err(UsageError::AlreadyStarted(self.name.clone()).into());
        }
        tracing::trace!(extension = %self.name, class = class.name(), "class added");
        self.classes.push(Box::new(class));
        Ok(self)
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of classes
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Class names in declaration order
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.name()).collect()
    }

    /// Look up a class by name
    pub fn class(&self, name: &str) -> Option<&dyn ClassRegistration> {
        self.classes
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// Fresh native instance of the named class
    pub fn construct(&self, class: &str) -> Option<Box<dyn Base>> {
        self.class(class).map(|c| c.construct())
    }

    /// Whether startup completed and shutdown has not run
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Declare every class to the host, in insertion order.
    ///
    /// All or nothing: if any class fails, the classes declared before it are
    /// released again and the error is returned. Startup runs at most once.
    pub fn startup(&mut self, host: &mut dyn HostRuntime) -> BridgeResult<()> {
        if self.phase != Phase::Defined {
            return Err(UsageError::AlreadyStarted(self.name.clone()).into());
        }

        for index in 0..self.classes.len() {
            if let Err(err) = self.classes[index].initialize(host) {
                tracing::error!(
                    extension = %self.name,
                    class = self.classes[index].name(),
                    error = %err,
                    "extension startup failed"
                );
                for declared in self.classes[..index].iter_mut().rev() {
                    declared.shutdown(host)?;
                }
                self.phase = Phase::Failed;
                return Err(err);
            }
        }

        tracing::info!(
            extension = %self.name,
            version = %self.version,
            classes = self.classes.len(),
            "extension started"
        );
        self.phase = Phase::Running;
        Ok(())
    }

    /// Release every class, last declared first.
    pub fn shutdown(&mut self, host: &mut dyn HostRuntime) -> BridgeResult<()> {
        if self.phase != Phase::Running {
            return Err(UsageError::NotStarted(self.name.clone()).into());
        }
        for class in self.classes.iter_mut().rev() {
            class.shutdown(host)?;
        }
        self.phase = Phase::Stopped;
        tracing::info!(extension = %self.name, "extension stopped");
        Ok(())
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("classes", &self.class_names())
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ClassDeclaration, HostError};
    use crate::method::Callback;
    use classbridge_sdk::CallResult;
    use std::ffi::c_void;

    #[derive(Default)]
    struct Door;

    impl Base for Door {}

    impl Door {
        fn open(&mut self) -> CallResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct NamedHost {
        live: Vec<String>,
        refuse: Option<&'static str>,
        handles: Vec<Box<u8>>,
    }

    impl HostRuntime for NamedHost {
        fn declare_class(&mut self, declaration: &ClassDeclaration<'_>) -> Result<ClassEntry, HostError> {
            let name = declaration.name().to_str().unwrap().to_string();
            if self.refuse == Some(name.as_str()) {
                return Err(HostError::new("refused"));
            }
            self.live.push(name);
            self.handles.push(Box::new(0));
            let handle = self.handles.last_mut().unwrap();
            Ok(ClassEntry::from_raw(&mut **handle as *mut u8 as *mut c_void).unwrap())
        }

        fn release_class(&mut self, _entry: ClassEntry) {
            self.live.pop();
        }
    }

    fn door(name: &str) -> ClassDescriptor<Door> {
        let mut class = ClassDescriptor::new(name);
        class.method("open", Callback::NoArgs(Door::open)).unwrap();
        class
    }

    #[test]
    fn test_startup_and_shutdown() {
        let mut host = NamedHost::default();
        let mut ext = Extension::new("doors", "1.0.0");
        ext.add_class(door("Front")).unwrap();
        ext.add_class(door("Back")).unwrap();
        assert_eq!(ext.class_names(), ["Front", "Back"]);

        ext.startup(&mut host).unwrap();
        assert!(ext.is_running());
        assert_eq!(host.live, ["Front", "Back"]);
        assert!(ext.class("Back").unwrap().is_initialized());

        let err = ext.startup(&mut host).unwrap_err();
        assert!(matches!(err.as_usage(), Some(UsageError::AlreadyStarted(_))));

        ext.shutdown(&mut host).unwrap();
        assert!(host.live.is_empty());
        assert!(ext.shutdown(&mut host).is_err());
    }

    #[test]
    fn test_failed_startup_rolls_back() {
        let mut host = NamedHost {
            refuse: Some("Back"),
            ..Default::default()
        };
        let mut ext = Extension::new("doors", "1.0.0");
        ext.add_class(door("Front")).unwrap();
        ext.add_class(door("Back")).unwrap();

        assert!(ext.startup(&mut host).is_err());
        assert!(host.live.is_empty());
        assert!(!ext.is_running());
        assert!(!ext.class("Front").unwrap().is_initialized());
    }

    #[test]
    fn test_add_class_after_startup() {
        let mut host = NamedHost::default();
        let mut ext = Extension::new("doors", "1.0.0");
        ext.startup(&mut host).unwrap();
        assert!(ext.add_class(door("Late")).is_err());
        ext.shutdown(&mut host).unwrap();
    }

    #[test]
    fn test_construct_by_name() {
        let mut ext = Extension::new("doors", "1.0.0");
        ext.add_class(door("Front")).unwrap();
        assert!(ext.construct("Front").is_some());
        assert!(ext.construct("Window").is_none());
    }
}
