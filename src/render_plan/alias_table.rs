use crate::entity_catalog::EntityType;

/// Alias → entity type assignments for one statement.
///
/// Aliases are handed out as `t1`, `t2`, ... in registration order and never
/// removed. A type registered twice gets two aliases; lookups by type return
/// the first.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<(String, EntityType)>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: EntityType) -> String {
        let alias = format!("t{}", self.entries.len() + 1);
        log::debug!("Alias {} -> {}", alias, entity);
        self.entries.push((alias.clone(), entity));
        alias
    }

    pub fn alias_of(&self, entity: &EntityType) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, e)| e == entity)
            .map(|(alias, _)| alias.as_str())
    }

    pub fn entity_of(&self, alias: &str) -> Option<EntityType> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, e)| *e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, EntityType)> {
        self.entries.iter().map(|(a, e)| (a.as_str(), *e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
