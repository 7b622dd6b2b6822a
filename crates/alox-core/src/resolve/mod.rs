//! Cross-module declaration resolution.

mod builtin;

use crate::error::{Error, Result};
use crate::ir::{DeclarationRef, IrModule, Type};
use crate::path::Path;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace, warn};

const LOG_AREA: &str = "[resolve]";

/// Shared universe of published modules.
///
/// Registration is append-only. Each registration replaces the module list
/// with a new snapshot, so a reader holding a snapshot never sees a module
/// half-published.
#[derive(Debug, Default)]
pub struct DeclarationResolver {
    modules: RwLock<Arc<Vec<Arc<IrModule>>>>,
}

impl DeclarationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a module. Returns `false` if a module with the same full path
    /// is already registered; the earlier one stays visible.
    pub fn register_module(&self, module: Arc<IrModule>) -> bool {
        let full_path = module.full_path();
        let mut guard = self.modules.write();
        if guard.iter().any(|existing| existing.full_path() == full_path) {
            warn!("{} module {} is already registered", LOG_AREA, full_path);
            return false;
        }
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(module);
        *guard = Arc::new(next);
        debug!("{} registered module {}", LOG_AREA, full_path);
        true
    }

    pub fn modules(&self) -> Arc<Vec<Arc<IrModule>>> {
        self.modules.read().clone()
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_module(&self, full_path: &Path) -> Option<Arc<IrModule>> {
        self.modules()
            .iter()
            .find(|module| &module.full_path() == full_path)
            .cloned()
    }

    /// Resolve `reference` as written inside `current`.
    ///
    /// `None` means "not available": either the name does not exist or its
    /// module has not been published yet.
    pub fn resolve(&self, current: &Arc<IrModule>, reference: &DeclarationRef) -> Option<Type> {
        trace!("{} resolving {} in {}", LOG_AREA, reference, current.full_path());
        if reference.path.is_empty() {
            if let Some(declaration) = current.find_declaration(&reference.name) {
                return declaration.instantiate(current, &qualify_arguments(current, reference));
            }
            return builtin::resolve_builtin(self, current, reference);
        }

        let module = if current.full_path() == reference.path {
            current.clone()
        } else {
            self.find_module(&reference.path)?
        };
        let declaration = module.find_declaration(&reference.name)?;
        declaration.instantiate(&module, &qualify_arguments(current, reference))
    }

    /// Like [`Self::resolve`], for callers that cannot continue without the type.
    pub fn require(&self, current: &Arc<IrModule>, reference: &DeclarationRef) -> Result<Type> {
        self.resolve(current, reference)
            .ok_or_else(|| Error::Resolution(reference.clone()))
    }

    /// Resolve a reference that was written inside the module at
    /// `origin`, e.g. the field type of a struct declared elsewhere.
    pub fn resolve_in(
        &self,
        origin: &Path,
        current: &Arc<IrModule>,
        reference: &DeclarationRef,
    ) -> Option<Type> {
        if &current.full_path() == origin {
            return self.resolve(current, reference);
        }
        let module = self.find_module(origin)?;
        self.resolve(&module, reference)
    }
}

/// Type arguments are bound into another module's declaration, so names of
/// `current`'s own declarations get `current`'s full path.
fn qualify_arguments(current: &IrModule, reference: &DeclarationRef) -> DeclarationRef {
    DeclarationRef {
        path: reference.path.clone(),
        name: reference.name.clone(),
        arguments: reference
            .arguments
            .iter()
            .map(|argument| qualify(current, argument))
            .collect(),
    }
}

fn qualify(current: &IrModule, reference: &DeclarationRef) -> DeclarationRef {
    let mut qualified = qualify_arguments(current, reference);
    if qualified.path.is_empty() && current.find_declaration(&qualified.name).is_some() {
        qualified.path = current.full_path();
    }
    qualified
}
