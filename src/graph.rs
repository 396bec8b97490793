//! The entity graph: id-indexed storage and structural validation
//!
//! Owns every [`Entity`] of one crate plus its accumulated context.
//! Entities are kept in insertion order with an id index on the side, so
//! listing preserves the source `@graph` order while lookups stay O(1).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::context::ContextResolver;
use crate::entity::Entity;
use crate::error::{CrateError, ValidationFinding};
use crate::vocab;

/// Read-time policy for structural validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Any validation finding (or malformed node) aborts the read.
    Strict,
    /// Best-effort graph: malformed nodes are skipped and findings are
    /// recorded on the graph instead of raised.
    Lenient,
}

/// Which reference-valued properties on the descriptor must resolve to an
/// entity present in the graph.
///
/// The exact structural set is deliberately an allow-list rather than a
/// hard-coded rule; the default covers `about` only. The descriptor's
/// `conformsTo` names a profile URI that lives outside the graph, so it is
/// checked against the supported specification versions instead of against
/// graph membership.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    /// Descriptor properties whose reference targets must exist in-graph
    pub structural_properties: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            structural_properties: vec![vocab::ABOUT_PROPERTY.to_string()],
        }
    }
}

/// All entities of one crate, keyed by id, insertion order preserved.
#[derive(Debug, Default)]
pub struct EntityGraph {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
    context: ContextResolver,
    findings: Vec<ValidationFinding>,
}

impl EntityGraph {
    /// Creates an empty graph for programmatic building.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from one parsed JSON-LD document.
    ///
    /// Pipeline: extract `@graph` -> normalize each node into an [`Entity`]
    /// -> insert into the index (the first duplicate id aborts) -> record
    /// `@context` -> validate. Under [`Strictness::Strict`] the first
    /// validation finding fails the whole read; under
    /// [`Strictness::Lenient`] findings (including skipped malformed
    /// nodes) are recorded on the returned graph.
    pub fn from_document(
        doc: &Value,
        origin: &str,
        strictness: Strictness,
    ) -> Result<EntityGraph, CrateError> {
        let root = doc.as_object().ok_or_else(|| CrateError::InvalidStructure {
            origin: origin.to_string(),
            reason: "top level is not a JSON object".to_string(),
        })?;

        let nodes = root
            .get("@graph")
            .and_then(Value::as_array)
            .ok_or_else(|| CrateError::InvalidStructure {
                origin: origin.to_string(),
                reason: "missing @graph array".to_string(),
            })?;

        let mut graph = EntityGraph::new();

        for (index, node) in nodes.iter().enumerate() {
            match Entity::from_json_node(node) {
                Ok(entity) => graph.add_entity(entity)?,
                Err(CrateError::MalformedEntity(detail)) => match strictness {
                    Strictness::Strict => return Err(CrateError::MalformedEntity(detail)),
                    Strictness::Lenient => {
                        log::warn!("{origin}: skipping graph node {index}: {detail}");
                        graph
                            .findings
                            .push(ValidationFinding::SkippedNode { index, detail });
                    }
                },
                Err(other) => return Err(other),
            }
        }

        if let Some(ctx) = root.get("@context") {
            graph.record_context(ctx);
        }

        let findings = graph.check(&ValidationPolicy::default());
        if let (Strictness::Strict, Some(first)) = (strictness, findings.first()) {
            return Err(CrateError::Validation(first.clone()));
        }
        graph.findings.extend(findings);

        Ok(graph)
    }

    /// O(1) lookup of an entity by id.
    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    /// All entities in insertion order, descriptor included.
    pub fn to_list(&self) -> Vec<&Entity> {
        self.entities.iter().collect()
    }

    /// All entity ids in insertion order.
    pub fn ids(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All recorded context entries, each wrapped as `{"@context": ...}`.
    pub fn get_all_context(&self) -> Vec<Value> {
        self.context.all()
    }

    /// Records a raw `@context` value against this graph.
    pub fn record_context(&mut self, raw: &Value) {
        self.context.record(raw);
    }

    /// Validation findings deferred by a lenient read.
    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    /// Re-derives the JSON-LD document this graph describes.
    ///
    /// The inverse of [`from_document`](Self::from_document): recorded
    /// context first (omitted when none was recorded), then the `@graph`
    /// array with every entity in insertion order.
    pub fn to_json_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(context) = self.context.to_value() {
            doc.insert("@context".to_string(), context);
        }
        doc.insert(
            "@graph".to_string(),
            Value::Array(self.entities.iter().map(Entity::to_json_node).collect()),
        );
        Value::Object(doc)
    }

    /// Serializes the graph as pretty-printed JSON-LD at `path`.
    pub fn write_to_path(&self, path: &Path) -> Result<(), CrateError> {
        let mut rendered = serde_json::to_string_pretty(&self.to_json_document()).map_err(|e| {
            CrateError::Serialize {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        rendered.push('\n');
        fs::write(path, rendered).map_err(|e| CrateError::io(path, e))?;
        log::debug!("wrote {} entities to {}", self.len(), path.display());
        Ok(())
    }

    /// Inserts an entity, failing with [`CrateError::DuplicateId`] if its id
    /// is already present.
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), CrateError> {
        if self.index.contains_key(&entity.id) {
            return Err(CrateError::DuplicateId(entity.id));
        }
        self.index.insert(entity.id.clone(), self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    /// Removes and returns an entity by id.
    ///
    /// Removing the descriptor or root entity is permitted here; a later
    /// [`validate`](Self::validate) call reports the broken invariant. Fails
    /// with [`CrateError::NotFound`] when the id is absent.
    pub fn remove_entity(&mut self, id: &str) -> Result<Entity, CrateError> {
        let position = self
            .index
            .remove(id)
            .ok_or_else(|| CrateError::NotFound(id.to_string()))?;
        let removed = self.entities.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Ok(removed)
    }

    /// Runs structural validation with the default policy, failing on the
    /// first finding.
    pub fn validate(&self) -> Result<(), CrateError> {
        self.validate_with(&ValidationPolicy::default())
    }

    /// Runs structural validation with a caller-supplied policy.
    pub fn validate_with(&self, policy: &ValidationPolicy) -> Result<(), CrateError> {
        match self.check(policy).into_iter().next() {
            Some(finding) => Err(CrateError::Validation(finding)),
            None => Ok(()),
        }
    }

    /// Collects every structural finding without failing.
    ///
    /// Checks: exactly one descriptor entity conforming to a supported
    /// specification version; the descriptor's structural references (per
    /// policy, `about` by default) resolve in-graph; no duplicate ids. The
    /// duplicate check is guaranteed by the index already but re-run after
    /// bulk construction.
    pub fn check(&self, policy: &ValidationPolicy) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();

        let descriptors: Vec<&Entity> = self
            .entities
            .iter()
            .filter(|e| vocab::is_descriptor_name(&e.id))
            .collect();

        match descriptors.as_slice() {
            [] => findings.push(ValidationFinding::MissingDescriptor),
            [descriptor] => self.check_descriptor(descriptor, policy, &mut findings),
            many => findings.push(ValidationFinding::MultipleDescriptors {
                ids: many.iter().map(|e| e.id.clone()).collect(),
            }),
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.id.as_str()) {
                findings.push(ValidationFinding::DuplicateEntityId(entity.id.clone()));
            }
        }

        findings
    }

    fn check_descriptor(
        &self,
        descriptor: &Entity,
        policy: &ValidationPolicy,
        findings: &mut Vec<ValidationFinding>,
    ) {
        let conformances = descriptor.reference_ids(vocab::CONFORMS_TO_PROPERTY);
        if !conformances
            .iter()
            .any(|id| vocab::is_supported_conformance(id))
        {
            findings.push(ValidationFinding::UnsupportedConformance {
                descriptor_id: descriptor.id.clone(),
            });
        }

        for property in &policy.structural_properties {
            let targets = descriptor.reference_ids(property);
            if targets.is_empty() {
                findings.push(ValidationFinding::MissingReference {
                    entity_id: descriptor.id.clone(),
                    property: property.clone(),
                });
                continue;
            }
            for target in targets {
                if !self.index.contains_key(target) {
                    findings.push(ValidationFinding::UnresolvedReference {
                        entity_id: descriptor.id.clone(),
                        property: property.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }
    }
}
