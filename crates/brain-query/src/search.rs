use brain_common::{ComponentCategory, ComponentRecord, ComponentType, DesignModel};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_LIMIT: usize = 5;

/// Component search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub text: String,
    #[serde(rename = "type", default)]
    pub component_type: Option<ComponentType>,
    #[serde(default)]
    pub category: Option<ComponentCategory>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            component_type: None,
            category: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_type(mut self, component_type: ComponentType) -> Self {
        self.component_type = Some(component_type);
        self
    }

    pub fn with_category(mut self, category: ComponentCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn matches(&self, needle: &str, component: &ComponentRecord) -> bool {
        if self.component_type.is_some_and(|t| t != component.component_type) {
            return false;
        }
        if self.category.is_some_and(|c| c != component.category) {
            return false;
        }
        if needle.is_empty() {
            return true;
        }
        component.name.to_lowercase().contains(needle)
            || component.description.to_lowercase().contains(needle)
            || component
                .usage
                .use_cases
                .iter()
                .any(|u| u.to_lowercase().contains(needle))
    }
}

/// Components whose name, description or use cases contain the query text,
/// in extraction order. No match is an empty result.
pub fn search<'a>(model: &'a DesignModel, query: &SearchQuery) -> Vec<&'a ComponentRecord> {
    let needle = query.text.trim().to_lowercase();
    let results: Vec<_> = model
        .components
        .iter()
        .filter(|c| query.matches(&needle, c))
        .take(query.limit)
        .collect();
    debug!("Search {:?} matched {} components", query.text, results.len());
    results
}

pub fn retrieve<'a>(model: &'a DesignModel, id: &str) -> Option<&'a ComponentRecord> {
    model.component(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_extract::extract_from_str;

    fn model() -> DesignModel {
        extract_from_str(
            r#"<nav class="menu"><button class="btn btn--primary">Go</button></nav>
               <div class="card"><button class="btn">More</button></div>
               <button class="btn">Three</button>"#,
            ".btn { padding: 8px; } .btn--primary { color: #fff; } .card { padding: 16px; }",
        )
        .unwrap()
    }

    #[test]
    fn test_search_no_match_is_empty() {
        let model = model();
        assert!(!model.components.is_empty());
        assert!(search(&model, &SearchQuery::new("nonexistent-widget")).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let model = model();
        let results = search(&model, &SearchQuery::new("BTN"));
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|c| c.name == "btn"));
    }

    #[test]
    fn test_search_matches_use_cases() {
        let model = model();
        let button = model
            .components
            .iter()
            .find(|c| c.component_type == ComponentType::Button)
            .unwrap();
        let use_case = button.usage.use_cases[0].to_uppercase();

        let results = search(&model, &SearchQuery::new(use_case));
        assert!(results.iter().any(|c| c.id == button.id));
    }

    #[test]
    fn test_search_filters_and_limit() {
        let model = model();

        let cards = search(&model, &SearchQuery::new("").with_type(ComponentType::Card));
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "card");

        let navigation = search(
            &model,
            &SearchQuery::new("").with_category(ComponentCategory::Navigation),
        );
        assert!(navigation
            .iter()
            .all(|c| c.category == ComponentCategory::Navigation));

        let limited = search(&model, &SearchQuery::new("btn").with_limit(2));
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_retrieve() {
        let model = model();
        let first = &model.components[0];
        assert_eq!(retrieve(&model, &first.id).map(|c| &c.name), Some(&first.name));
        assert!(retrieve(&model, "missing").is_none());
    }

    #[test]
    fn test_query_deserializes_with_defaults() {
        let query: SearchQuery =
            serde_json::from_str(r#"{"text": "card", "type": "card"}"#).unwrap();
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.component_type, Some(ComponentType::Card));
        assert_eq!(query.category, None);
    }
}
