//! Preview configuration.
//!
//! Every knob has a default matching the stock React playground, so an empty
//! JSON object (or `PreviewOptions::default()`) is a complete configuration.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
    static ref ELEMENT_ID_RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_:.-]*$").unwrap();
}

/// Script extensions considered for module analysis, in resolution order.
pub const SCRIPT_EXTENSIONS: [&str; 4] = ["js", "jsx", "ts", "tsx"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewOptions {
    /// Element the entry component is rendered into.
    pub root_element_id: String,
    /// The single binding every `export default` writes to.
    pub shared_default_slot: String,
    /// Expression bound to imports that cannot be resolved.
    pub placeholder_literal: String,
    /// Markup used when the project has no entry document.
    pub fallback_entry_markup: String,
    /// External runtime scripts injected ahead of the bundle.
    pub runtime_scripts: Vec<String>,
    /// `type` attribute of the bundle script.
    pub bundle_script_type: String,
    /// `data-presets` attribute of the bundle script; empty omits it.
    pub bundle_presets: String,
    /// Statements evaluated before the resolution bindings.
    pub runtime_prelude: String,
    /// `<title>` of the generated document.
    pub document_title: String,
    /// Prefix of generated resource handle urls.
    pub handle_scheme: String,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            root_element_id: "root".to_string(),
            shared_default_slot: "__defaultExport".to_string(),
            placeholder_literal: "null".to_string(),
            fallback_entry_markup: r#"<div id="root"></div>"#.to_string(),
            runtime_scripts: vec![
                "https://unpkg.com/react@18/umd/react.development.js".to_string(),
                "https://unpkg.com/react-dom@18/umd/react-dom.development.js".to_string(),
                "https://unpkg.com/@babel/standalone/babel.min.js".to_string(),
            ],
            bundle_script_type: "text/babel".to_string(),
            bundle_presets: "react".to_string(),
            runtime_prelude: "const { useState, useEffect, useRef, useMemo } = React;".to_string(),
            document_title: "React Preview".to_string(),
            handle_scheme: "blob:preview".to_string(),
        }
    }
}

impl PreviewOptions {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Reject values that would be spliced into generated code unchecked.
    pub fn validate(&self) -> Result<(), BuildError> {
        if !is_identifier(&self.shared_default_slot) {
            return Err(BuildError::InvalidOption {
                field: "sharedDefaultSlot",
                value: self.shared_default_slot.clone(),
            });
        }
        if !ELEMENT_ID_RE.is_match(&self.root_element_id) {
            return Err(BuildError::InvalidOption {
                field: "rootElementId",
                value: self.root_element_id.clone(),
            });
        }
        Ok(())
    }
}

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let opts = PreviewOptions::from_json_str("{}").unwrap();
        assert_eq!(opts, PreviewOptions::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let opts =
            PreviewOptions::from_json_str(r#"{"rootElementId":"app","bundlePresets":""}"#).unwrap();
        assert_eq!(opts.root_element_id, "app");
        assert!(opts.bundle_presets.is_empty());
        assert_eq!(opts.shared_default_slot, "__defaultExport");
    }

    #[test]
    fn test_validate_rejects_bad_slot() {
        let opts = PreviewOptions {
            shared_default_slot: "not valid".to_string(),
            ..PreviewOptions::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(BuildError::InvalidOption { field: "sharedDefaultSlot", .. })
        ));
        assert!(PreviewOptions::default().validate().is_ok());
    }
}
