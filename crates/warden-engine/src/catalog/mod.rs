//! The command catalog: an immutable table of command definitions, each
//! carrying its risk tier, required capability, input schema and handler.

mod definitions;
pub mod schema;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{Capability, RiskLevel};

use crate::handlers::HandlerFn;
use schema::{FieldDescriptor, InputSchema};

pub use definitions::standard_definitions;

/// One catalog entry.
#[derive(Clone)]
pub struct CommandDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub capability: Capability,
    pub risk: RiskLevel,
    pub schema: InputSchema,
    pub handler: HandlerFn,
}

impl std::fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("id", &self.id)
            .field("capability", &self.capability)
            .field("risk", &self.risk)
            .finish_non_exhaustive()
    }
}

impl CommandDefinition {
    pub fn parse_input(&self, input: &Value) -> WardenResult<Value> {
        self.schema.parse(input)
    }

    pub fn summary(&self) -> CommandSummary {
        CommandSummary {
            id: self.id,
            name: self.name,
            description: self.description,
            capability: self.capability,
            risk: self.risk,
            fields: self.schema.descriptors(),
        }
    }
}

/// What a command picker needs to render one entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub capability: Capability,
    pub risk: RiskLevel,
    pub fields: Vec<FieldDescriptor>,
}

/// Definitions in registration order, indexed by id.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    definitions: Vec<CommandDefinition>,
    by_id: HashMap<&'static str, usize>,
}

impl CommandCatalog {
    /// A later definition replaces an earlier one with the same id.
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        definitions.into_iter().fold(
            Self {
                definitions: Vec::new(),
                by_id: HashMap::new(),
            },
            Self::with_definition,
        )
    }

    /// The twelve moderation commands.
    pub fn standard() -> Self {
        Self::new(standard_definitions())
    }

    pub fn lookup(&self, command_id: &str) -> WardenResult<&CommandDefinition> {
        self.by_id
            .get(command_id)
            .map(|&slot| &self.definitions[slot])
            .ok_or_else(|| WardenError::UnknownCommand {
                id: command_id.to_string(),
            })
    }

    /// Add `definition`, replacing any entry with the same id in place.
    pub fn with_definition(mut self, definition: CommandDefinition) -> Self {
        match self.by_id.get(definition.id) {
            Some(&slot) => self.definitions[slot] = definition,
            None => {
                self.by_id.insert(definition.id, self.definitions.len());
                self.definitions.push(definition);
            }
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn summaries(&self) -> Vec<CommandSummary> {
        self.iter().map(CommandDefinition::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_unique_ids() {
        let catalog = CommandCatalog::standard();
        assert_eq!(catalog.len(), 12);
        let mut ids: Vec<_> = catalog.iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn replacing_a_definition_keeps_its_position() {
        let standard = CommandCatalog::standard();
        let mut stricter = standard.lookup("note.add").unwrap().clone();
        stricter.risk = RiskLevel::High;
        let catalog = standard.with_definition(stricter);

        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.lookup("note.add").unwrap().risk, RiskLevel::High);
        let position = catalog.iter().position(|d| d.id == "note.add");
        let original = CommandCatalog::standard().iter().position(|d| d.id == "note.add");
        assert_eq!(position, original);
    }

    #[test]
    fn unknown_command_is_reported() {
        let err = CommandCatalog::standard().lookup("ban.forever").unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: ban.forever.");
    }

    #[test]
    fn risk_tiers_match_catalog() {
        let catalog = CommandCatalog::standard();
        let risk = |id| catalog.lookup(id).map(|d| d.risk).unwrap();
        assert_eq!(risk("warning.create"), RiskLevel::Low);
        assert_eq!(risk("ban.temp"), RiskLevel::Medium);
        assert_eq!(risk("ban.perm"), RiskLevel::High);
        assert_eq!(risk("ban.remove"), RiskLevel::High);
        assert_eq!(risk("report.bulk_resolve"), RiskLevel::Medium);
    }

    #[test]
    fn summaries_expose_field_metadata() {
        let summaries = CommandCatalog::standard().summaries();
        let flag = summaries.iter().find(|s| s.id == "player.flag").unwrap();
        let json = serde_json::to_value(flag).unwrap();
        assert_eq!(json["fields"][1]["options"], serde_json::json!(["ACTIVE", "WATCHED"]));
        assert_eq!(json["risk"], "LOW");
    }
}
