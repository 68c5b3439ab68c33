//! Host variable sources: what a wiki knows beyond its pages.

use std::collections::HashMap;
use std::sync::Arc;

use wikitext::{ApplicationVariables, UrlVariables, VariableSource};

/// Version of the running wiki.
pub const WIKI_VERSION: &str = "WIKI_VERSION";
/// Directory the page tree was loaded from.
pub const WIKI_ROOT_PATH: &str = "WIKI_ROOT_PATH";

/// Configured properties, then the process environment.
#[derive(Debug, Clone)]
pub struct SystemVariableSource {
    properties: HashMap<String, String>,
    root_path: Option<String>,
    use_environment: bool,
}

impl Default for SystemVariableSource {
    fn default() -> Self {
        SystemVariableSource {
            properties: HashMap::new(),
            root_path: None,
            use_environment: true,
        }
    }
}

impl SystemVariableSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not fall back to environment variables.
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = Some(path.into());
        self
    }
}

impl VariableSource for SystemVariableSource {
    fn find_variable(&self, name: &str) -> Option<String> {
        if let Some(value) = self.properties.get(name) {
            return Some(value.clone());
        }
        if self.use_environment {
            return std::env::var(name).ok();
        }
        None
    }

    fn as_application_variables(&self) -> Option<&dyn ApplicationVariables> {
        Some(self)
    }
}

impl ApplicationVariables for SystemVariableSource {
    fn find_application_variable(&self, name: &str) -> Option<String> {
        match name {
            WIKI_VERSION => Some(env!("CARGO_PKG_VERSION").to_string()),
            WIKI_ROOT_PATH => self.root_path.clone(),
            _ => None,
        }
    }
}

/// A host source for one request: variables passed on the URL, on top of
/// another host source.
pub struct UrlPathVariableSource {
    inner: Arc<dyn VariableSource>,
    url_variables: HashMap<String, String>,
}

impl UrlPathVariableSource {
    pub fn new(inner: Arc<dyn VariableSource>, url_variables: HashMap<String, String>) -> Self {
        UrlPathVariableSource {
            inner,
            url_variables,
        }
    }
}

impl VariableSource for UrlPathVariableSource {
    fn find_variable(&self, name: &str) -> Option<String> {
        self.inner.find_variable(name)
    }

    fn as_url_variables(&self) -> Option<&dyn UrlVariables> {
        Some(self)
    }

    fn as_application_variables(&self) -> Option<&dyn ApplicationVariables> {
        self.inner.as_application_variables()
    }
}

impl UrlVariables for UrlPathVariableSource {
    fn find_url_variable(&self, name: &str) -> Option<String> {
        self.url_variables.get(name).cloned()
    }
}
