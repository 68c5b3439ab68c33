use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::variables::VariableSource;

/// Values recorded while parsing and rendering one page.
///
/// Lives exactly as long as the `ParsingPage` that owns it; a page that is
/// re-parsed starts over with an empty cache.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    values: Mutex<HashMap<String, String>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VariableSource for ResolutionCache {
    fn find_variable(&self, name: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
