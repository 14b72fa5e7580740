//! Instantiation collaborators
//!
//! Lookups the instantiator delegates to the host application.

use super::component::{Component, ComponentRef};
use std::collections::HashMap;
use std::path::Path;

/// Creates a fresh live instance for a component type name.
pub trait ComponentFactory {
    fn create(&self, type_name: &str) -> anyhow::Result<ComponentRef>;
}

/// Turns a file under a template's context path into a public URL.
pub trait AssetResolver {
    fn publish(&self, path: &Path) -> anyhow::Result<String>;
}

/// Application parameters by name.
pub trait ParameterTable {
    fn parameter(&self, name: &str) -> Option<serde_json::Value>;
}

pub trait Localizer {
    fn localize(&self, text: &str) -> String;
}

/// Applies skins to structural components. `skin_id` is `None` for the
/// default skin.
pub trait SkinProvider {
    fn apply_skin(&self, component: &mut dyn Component, skin_id: Option<&str>) -> anyhow::Result<()>;
}

/// Publishes assets under their file path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathAssets;

impl AssetResolver for PathAssets {
    fn publish(&self, path: &Path) -> anyhow::Result<String> {
        Ok(path.display().to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoParameters;

impl ParameterTable for NoParameters {
    fn parameter(&self, _name: &str) -> Option<serde_json::Value> {
        None
    }
}

impl ParameterTable for HashMap<String, serde_json::Value> {
    fn parameter(&self, name: &str) -> Option<serde_json::Value> {
        self.get(name).cloned()
    }
}

/// Returns text untranslated.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLocalizer;

impl Localizer for IdentityLocalizer {
    fn localize(&self, text: &str) -> String {
        text.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoSkins;

impl SkinProvider for NoSkins {
    fn apply_skin(&self, _component: &mut dyn Component, _skin_id: Option<&str>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Everything an instantiation call needs besides the template and owner.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub factory: &'a dyn ComponentFactory,
    pub assets: &'a dyn AssetResolver,
    pub parameters: &'a dyn ParameterTable,
    pub localizer: &'a dyn Localizer,
    pub skins: &'a dyn SkinProvider,
}

impl<'a> Services<'a> {
    pub fn new(factory: &'a dyn ComponentFactory) -> Self {
        Services {
            factory,
            assets: &PathAssets,
            parameters: &NoParameters,
            localizer: &IdentityLocalizer,
            skins: &NoSkins,
        }
    }

    pub fn with_assets(mut self, assets: &'a dyn AssetResolver) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_parameters(mut self, parameters: &'a dyn ParameterTable) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_localizer(mut self, localizer: &'a dyn Localizer) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn with_skins(mut self, skins: &'a dyn SkinProvider) -> Self {
        self.skins = skins;
        self
    }
}
