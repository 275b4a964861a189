//! Parameter value sources.
//!
//! A route parameter is backed by up to three capabilities, each an explicit
//! trait object on its [`ParameterBinding`]:
//! - [`ProvidesValues`]: the ordered value list per locale
//! - [`ProvidesTranslation`]: the same resource's value in another locale
//! - [`ProvidesPayload`]: resource data handed to request handlers
//!
//! Providers may perform I/O; they are called from blocking contexts and
//! are never retried here.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::tree::RouteTree;

/// Parameter name → concrete value bound so far.
pub type BoundParameters = BTreeMap<String, String>;

/// Result of asking a provider for its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValues {
    Values(Vec<String>),
    /// The value space cannot be enumerated; routes stay templated.
    Unbounded,
}

/// Errors raised by value providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("no values declared for locale '{0}'")]
    MissingLocale(String),

    #[error("provider failed: {0}")]
    Provider(String),
}

pub trait ProvidesValues: Send + Sync {
    fn list_values(&self, locale: &str, bound: &BoundParameters) -> Result<ParameterValues, SourceError>;
}

pub trait ProvidesTranslation: Send + Sync {
    /// `Ok(None)` when the value has no counterpart in `to`.
    fn translate_value(&self, value: &str, from: &str, to: &str) -> Result<Option<String>, SourceError>;
}

pub trait ProvidesPayload: Send + Sync {
    fn payload(&self, locale: &str, value: &str) -> Result<Option<serde_json::Value>, SourceError>;
}

/// Capabilities backing one parameter.
#[derive(Clone, Default)]
pub struct ParameterBinding {
    values: Option<Arc<dyn ProvidesValues>>,
    translation: Option<Arc<dyn ProvidesTranslation>>,
    payload: Option<Arc<dyn ProvidesPayload>>,
}

impl fmt::Debug for ParameterBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterBinding")
            .field("values", &self.values.is_some())
            .field("translation", &self.translation.is_some())
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

impl ParameterBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(mut self, provider: Arc<dyn ProvidesValues>) -> Self {
        self.values = Some(provider);
        self
    }

    pub fn with_translation(mut self, provider: Arc<dyn ProvidesTranslation>) -> Self {
        self.translation = Some(provider);
        self
    }

    pub fn with_payload(mut self, provider: Arc<dyn ProvidesPayload>) -> Self {
        self.payload = Some(provider);
        self
    }

    pub fn values(&self) -> Option<&dyn ProvidesValues> {
        self.values.as_deref()
    }

    pub fn translation(&self) -> Option<&dyn ProvidesTranslation> {
        self.translation.as_deref()
    }

    pub fn payload(&self) -> Option<&dyn ProvidesPayload> {
        self.payload.as_deref()
    }
}

/// Bindings for every parameter name used in the tree.
///
/// Values declared on a node are scoped to that node and its descendants;
/// bindings registered by name apply everywhere the scoped lookup misses.
#[derive(Debug, Clone, Default)]
pub struct ParameterSources {
    bindings: HashMap<String, ParameterBinding>,
    /// Declaring node id → parameter → binding.
    scoped: HashMap<String, HashMap<String, ParameterBinding>>,
}

impl ParameterSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the static `values` declared on parameter nodes of `tree`.
    pub fn from_tree(tree: &RouteTree) -> Self {
        let mut sources = Self::new();
        for node in tree.walk() {
            if let (Some(parameter), Some(values)) = (&node.parameter, &node.values) {
                let provider = Arc::new(StaticValues::new(values.clone()));
                sources.bind_node(
                    node.id.clone(),
                    parameter.clone(),
                    ParameterBinding::new()
                        .with_values(provider.clone())
                        .with_translation(provider),
                );
            }
        }
        sources
    }

    pub fn bind(&mut self, parameter: impl Into<String>, binding: ParameterBinding) -> &mut Self {
        self.bindings.insert(parameter.into(), binding);
        self
    }

    /// Bind `parameter` for the node `node` and everything below it.
    pub fn bind_node(
        &mut self,
        node: impl Into<String>,
        parameter: impl Into<String>,
        binding: ParameterBinding,
    ) -> &mut Self {
        self.scoped
            .entry(node.into())
            .or_default()
            .insert(parameter.into(), binding);
        self
    }

    pub fn get(&self, parameter: &str) -> Option<&ParameterBinding> {
        self.bindings.get(parameter)
    }

    /// Binding of `parameter` as seen from node `node`.
    ///
    /// Node ids are dot-separated ancestry, so the nearest declaring
    /// ancestor is found by dropping trailing components.
    pub fn binding_for(&self, node: &str, parameter: &str) -> Option<&ParameterBinding> {
        let mut scope = node;
        loop {
            if let Some(binding) = self.scoped.get(scope).and_then(|m| m.get(parameter)) {
                return Some(binding);
            }
            match scope.rsplit_once('.') {
                Some((parent, _)) => scope = parent,
                None if !scope.is_empty() => scope = "",
                None => break,
            }
        }
        self.get(parameter)
    }

    /// Translate `value` of `parameter` on node `node` between locales.
    ///
    /// Parameters without a translation capability are locale-invariant.
    pub fn translate(
        &self,
        node: &str,
        parameter: &str,
        value: &str,
        from: &str,
        to: &str,
    ) -> Result<Option<String>, SourceError> {
        if from == to {
            return Ok(Some(value.to_string()));
        }
        match self.binding_for(node, parameter).and_then(ParameterBinding::translation) {
            Some(translator) => translator.translate_value(value, from, to),
            None => Ok(Some(value.to_string())),
        }
    }
}

/// Per-locale value lists with positional correspondence across locales.
#[derive(Debug, Clone, Default)]
pub struct StaticValues {
    per_locale: BTreeMap<String, Vec<String>>,
}

impl StaticValues {
    pub fn new(per_locale: BTreeMap<String, Vec<String>>) -> Self {
        Self { per_locale }
    }
}

impl ProvidesValues for StaticValues {
    fn list_values(&self, locale: &str, _bound: &BoundParameters) -> Result<ParameterValues, SourceError> {
        self.per_locale
            .get(locale)
            .map(|values| ParameterValues::Values(values.clone()))
            .ok_or_else(|| SourceError::MissingLocale(locale.to_string()))
    }
}

impl ProvidesTranslation for StaticValues {
    fn translate_value(&self, value: &str, from: &str, to: &str) -> Result<Option<String>, SourceError> {
        let source = self
            .per_locale
            .get(from)
            .ok_or_else(|| SourceError::MissingLocale(from.to_string()))?;
        let target = self
            .per_locale
            .get(to)
            .ok_or_else(|| SourceError::MissingLocale(to.to_string()))?;
        Ok(source
            .iter()
            .position(|v| v == value)
            .and_then(|index| target.get(index))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flowers() -> StaticValues {
        StaticValues::new(BTreeMap::from([
            ("de".to_string(), vec!["rose".to_string(), "tulpe".to_string(), "nelke".to_string()]),
            ("en".to_string(), vec!["rose-en".to_string(), "tulip".to_string()]),
        ]))
    }

    #[test]
    fn test_static_values_per_locale() {
        let values = flowers().list_values("en", &BoundParameters::new()).unwrap();
        assert_eq!(values, ParameterValues::Values(vec!["rose-en".into(), "tulip".into()]));
        assert!(matches!(
            flowers().list_values("fr", &BoundParameters::new()),
            Err(SourceError::MissingLocale(_))
        ));
    }

    #[test]
    fn test_positional_translation() {
        let flowers = flowers();
        assert_eq!(flowers.translate_value("rose-en", "en", "de").unwrap(), Some("rose".into()));
        assert_eq!(flowers.translate_value("tulpe", "de", "en").unwrap(), Some("tulip".into()));
        // no counterpart when the target list is shorter
        assert_eq!(flowers.translate_value("nelke", "de", "en").unwrap(), None);
    }

    #[test]
    fn test_unbound_parameters_are_locale_invariant() {
        let sources = ParameterSources::new();
        assert_eq!(sources.translate("products.id", "id", "42", "de", "en").unwrap(), Some("42".into()));
    }

    #[test]
    fn test_node_bindings_are_scoped() {
        let mut sources = ParameterSources::new();
        sources.bind_node("flowers.flower", "flower", ParameterBinding::new().with_translation(Arc::new(flowers())));

        assert_eq!(
            sources.translate("flowers.flower.edit", "flower", "rose-en", "en", "de").unwrap(),
            Some("rose".into())
        );
        // outside the declaring node the value is passed through
        assert_eq!(
            sources.translate("bouquets.flower", "flower", "rose-en", "en", "de").unwrap(),
            Some("rose-en".into())
        );
        assert!(sources.binding_for("flowers", "flower").is_none());
    }

    #[test]
    fn test_from_tree_keeps_same_named_parameters_apart() {
        use crate::tree::NodeDefinition;

        let tree = RouteTree::from_definition(
            NodeDefinition::from_value(serde_json::json!({
                "children": {
                    "products": { "children": { "product": {
                        "segment": "{id}",
                        "values": { "de": ["tisch"], "en": ["table"] },
                        "show": "ProductController@show",
                    } } },
                    "articles": { "children": { "article": {
                        "segment": "{id}",
                        "values": { "de": ["neuigkeit"], "en": ["news"] },
                        "show": "ArticleController@show",
                    } } },
                }
            }))
            .unwrap(),
        )
        .unwrap();
        let sources = ParameterSources::from_tree(&tree);

        assert_eq!(sources.translate("products.product", "id", "table", "en", "de").unwrap(), Some("tisch".into()));
        assert_eq!(sources.translate("articles.article", "id", "news", "en", "de").unwrap(), Some("neuigkeit".into()));
        assert_eq!(sources.translate("products.product", "id", "news", "en", "de").unwrap(), None);
    }
}
