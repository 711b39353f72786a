use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::LayoutError;
use super::types::{
    ComponentInstance, ComponentType, QueryMeta, Row, DEFAULT_BUTTON_LABEL, DEFAULT_TEXT_CONTENT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Ordered components of one app. Order is render order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutDocument {
    pub components: Vec<ComponentInstance>,
}

impl LayoutDocument {
    pub fn new(components: Vec<ComponentInstance>) -> Self {
        Self { components }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.id == id)
    }

    fn position(&self, id: &str) -> Result<usize, LayoutError> {
        self.components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| LayoutError::NotFound(format!("Component {id} not found")))
    }

    /// Appends a new unbound component and returns its id.
    pub fn add_component(&mut self, component_type: ComponentType) -> String {
        let id = format!("comp-{}", Uuid::new_v4().simple());
        let mut component = ComponentInstance::new(id.clone(), component_type);
        match component_type {
            ComponentType::Text => {
                component
                    .config
                    .insert("content".into(), Value::from(DEFAULT_TEXT_CONTENT));
            }
            ComponentType::Button => {
                component
                    .config
                    .insert("label".into(), Value::from(DEFAULT_BUTTON_LABEL));
            }
            _ => {}
        }
        self.components.push(component);
        id
    }

    pub fn remove_component(&mut self, id: &str) -> Result<ComponentInstance, LayoutError> {
        let index = self.position(id)?;
        Ok(self.components.remove(index))
    }

    /// Swaps with the neighbour; moving past either end is a no-op.
    pub fn move_component(
        &mut self,
        id: &str,
        direction: MoveDirection,
    ) -> Result<(), LayoutError> {
        let index = self.position(id)?;
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.components.len() => index + 1,
            _ => return Ok(()),
        };
        self.components.swap(index, target);
        Ok(())
    }

    pub fn update_config(&mut self, id: &str, key: &str, value: Value) -> Result<(), LayoutError> {
        let index = self.position(id)?;
        self.components[index].config.insert(key.to_string(), value);
        Ok(())
    }

    /// Records a successful bind. Callers only reach this after the query ran.
    pub fn apply_binding(
        &mut self,
        id: &str,
        query: &QueryMeta,
        rows: Vec<Row>,
    ) -> Result<&ComponentInstance, LayoutError> {
        let index = self.position(id)?;
        let component = &mut self.components[index];
        component.query_id = Some(query.id.clone());
        component.query_name = Some(query.name.clone());
        component.data = Some(rows);
        Ok(component)
    }

    /// Persistable copy: same components, same order, no `data`.
    pub fn stripped(&self) -> Vec<ComponentInstance> {
        self.components
            .iter()
            .map(ComponentInstance::without_data)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_of(types: &[ComponentType]) -> (LayoutDocument, Vec<String>) {
        let mut doc = LayoutDocument::default();
        let ids = types.iter().map(|t| doc.add_component(*t)).collect();
        (doc, ids)
    }

    #[test]
    fn test_add_assigns_unique_ids_and_defaults() {
        let (doc, ids) =
            doc_of(&[ComponentType::Text, ComponentType::Button, ComponentType::Table]);
        assert_eq!(doc.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert!(ids[0].starts_with("comp-"));
        assert_eq!(
            doc.get(&ids[0]).and_then(|c| c.config_str("content")),
            Some(DEFAULT_TEXT_CONTENT)
        );
        assert_eq!(
            doc.get(&ids[1]).and_then(|c| c.config_str("label")),
            Some(DEFAULT_BUTTON_LABEL)
        );
        assert!(doc.get(&ids[2]).map(|c| c.query_id.is_none()).unwrap_or(false));
    }

    #[test]
    fn test_move_and_remove() {
        let (mut doc, ids) =
            doc_of(&[ComponentType::Table, ComponentType::Chart, ComponentType::List]);
        doc.move_component(&ids[2], MoveDirection::Up).unwrap();
        let order: Vec<&str> = doc.components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec![ids[0].as_str(), ids[2].as_str(), ids[1].as_str()]);

        doc.move_component(&ids[0], MoveDirection::Up).unwrap();
        assert_eq!(doc.components[0].id, ids[0]);

        let removed = doc.remove_component(&ids[2]).unwrap();
        assert_eq!(removed.component_type, ComponentType::List);
        assert!(matches!(
            doc.remove_component(&ids[2]),
            Err(LayoutError::NotFound(_))
        ));
    }

    #[test]
    fn test_apply_binding_and_strip() {
        let (mut doc, ids) = doc_of(&[ComponentType::Table]);
        let query = QueryMeta {
            id: "q1".into(),
            name: "Orders".into(),
            description: None,
            datasource_id: None,
        };
        let mut row = Row::new();
        row.insert("n".into(), Value::from(1));
        doc.apply_binding(&ids[0], &query, vec![row]).unwrap();

        let stripped = doc.stripped();
        assert!(stripped[0].data.is_none());
        assert_eq!(stripped[0].query_id.as_deref(), Some("q1"));
        assert_eq!(stripped[0].query_name.as_deref(), Some("Orders"));
        assert!(doc.components[0].data.is_some());
    }

    #[test]
    fn test_move_down_and_past_the_end() {
        let (mut doc, ids) = doc_of(&[ComponentType::Table, ComponentType::Chart]);
        doc.move_component(&ids[0], MoveDirection::Down).unwrap();
        assert_eq!(doc.components[0].id, ids[1]);
        assert_eq!(doc.components[1].id, ids[0]);

        doc.move_component(&ids[0], MoveDirection::Down).unwrap();
        assert_eq!(doc.components[1].id, ids[0]);
        assert!(matches!(
            doc.move_component("missing", MoveDirection::Down),
            Err(LayoutError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_config() {
        let (mut doc, ids) = doc_of(&[ComponentType::Text]);
        doc.update_config(&ids[0], "content", Value::from("Quarterly notes")).unwrap();
        doc.update_config(&ids[0], "align", Value::from("center")).unwrap();
        let text = doc.get(&ids[0]).unwrap();
        assert_eq!(text.config_str("content"), Some("Quarterly notes"));
        assert_eq!(text.config_str("align"), Some("center"));

        assert!(matches!(
            doc.update_config("missing", "content", Value::from("x")),
            Err(LayoutError::NotFound(_))
        ));
        assert_eq!(doc.len(), 1);
    }
}
