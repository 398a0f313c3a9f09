// Registry of metric family name -> sender constructor

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::sender::{
    CpuSender, DiskIoSender, DiskUsageSender, LoadAvgSender, MemorySender, NetworkTrafficSender,
    Sender,
};

pub type SenderConstructor = fn() -> Box<dyn Sender>;

/// Maps family names to sender constructors. Built once at startup; the only
/// place senders are constructed. It does not validate config.
pub struct Registry {
    constructors: BTreeMap<&'static str, SenderConstructor>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Every family the collector can publish.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(|| Box::new(MemorySender));
        registry.register(|| Box::new(LoadAvgSender));
        registry.register(|| Box::new(CpuSender));
        registry.register(|| Box::new(DiskUsageSender));
        registry.register(|| Box::new(DiskIoSender));
        registry.register(|| Box::new(NetworkTrafficSender));
        registry
    }

    /// Register under the sender's own family name, replacing any previous entry.
    pub fn register(&mut self, constructor: SenderConstructor) {
        let name = constructor().name();
        self.constructors.insert(name, constructor);
    }

    /// Registered family names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    pub fn build_sender(&self, name: &str) -> Result<Box<dyn Sender>> {
        self.constructors
            .get(name)
            .map(|construct| construct())
            .ok_or_else(|| Error::UnsupportedFamily(name.to_string()))
    }
}

/// [`Registry::build_sender`] on the built-in registry.
pub fn build_sender(name: &str) -> Result<Box<dyn Sender>> {
    Registry::builtin().build_sender(name)
}
