use super::entity::names;
use super::{IndexDecl, KeyDecl, RelationshipDecl, SkipDecl};
use crate::schema::app::ReferentialAction;
use crate::schema::Value;

/// Configures a relationship from the dependent's side.
pub struct RelationshipBuilder<'a> {
    relationship: &'a mut RelationshipDecl,
}

impl<'a> RelationshipBuilder<'a> {
    pub(super) fn new(relationship: &'a mut RelationshipDecl) -> Self {
        Self { relationship }
    }

    /// The principal has many dependents, reached through `inverse`.
    pub fn with_many(&mut self, inverse: Option<&str>) -> &mut Self {
        self.relationship.unique = false;
        self.relationship.inverse = inverse.map(String::from);
        self
    }

    /// The principal has at most one dependent, reached through `inverse`.
    pub fn with_one(&mut self, inverse: Option<&str>) -> &mut Self {
        self.relationship.unique = true;
        self.relationship.inverse = inverse.map(String::from);
        self
    }

    pub fn has_foreign_key(&mut self, properties: &[&str]) -> &mut Self {
        self.relationship.foreign_key = names(properties);
        self
    }

    /// References an alternate key instead of the principal's primary key.
    pub fn has_principal_key(&mut self, properties: &[&str]) -> &mut Self {
        self.relationship.principal_key = names(properties);
        self
    }

    pub fn on_delete(&mut self, action: ReferentialAction) -> &mut Self {
        self.relationship.on_delete = Some(action);
        self
    }

    pub fn is_required(&mut self) -> &mut Self {
        self.relationship.required = true;
        self
    }

    pub fn has_constraint_name(&mut self, name: &str) -> &mut Self {
        self.relationship.name = Some(name.to_string());
        self
    }

    pub fn has_annotation(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.relationship.annotations.set(key, value);
        self
    }
}

/// Configures one side of a many-to-many relationship.
pub struct SkipNavigationBuilder<'a> {
    skip: &'a mut SkipDecl,
}

impl<'a> SkipNavigationBuilder<'a> {
    pub(super) fn new(skip: &'a mut SkipDecl) -> Self {
        Self { skip }
    }

    /// Names the navigation on the target pointing back.
    pub fn with_many(&mut self, inverse: &str) -> &mut Self {
        self.skip.inverse = Some(inverse.to_string());
        self
    }

    /// Uses an explicitly declared join entity type.
    pub fn using_entity(&mut self, join_entity: &str) -> &mut Self {
        self.skip.join_entity = Some(join_entity.to_string());
        self
    }
}

/// Configures a primary or alternate key.
pub struct KeyBuilder<'a> {
    key: &'a mut KeyDecl,
}

impl<'a> KeyBuilder<'a> {
    pub(super) fn new(key: &'a mut KeyDecl) -> Self {
        Self { key }
    }

    pub fn has_name(&mut self, name: &str) -> &mut Self {
        self.key.name = Some(name.to_string());
        self
    }

    pub fn has_annotation(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.key.annotations.set(key, value);
        self
    }
}

pub struct IndexBuilder<'a> {
    index: &'a mut IndexDecl,
}

impl<'a> IndexBuilder<'a> {
    pub(super) fn new(index: &'a mut IndexDecl) -> Self {
        Self { index }
    }

    pub fn is_unique(&mut self) -> &mut Self {
        self.index.unique = true;
        self
    }

    pub fn has_name(&mut self, name: &str) -> &mut Self {
        self.index.name = Some(name.to_string());
        self
    }

    /// Partial index predicate.
    pub fn has_filter(&mut self, sql: &str) -> &mut Self {
        self.index.filter = Some(sql.to_string());
        self
    }

    /// Per-column sort order, `true` for descending.
    pub fn is_descending(&mut self, descending: &[bool]) -> &mut Self {
        self.index.descending = descending.to_vec();
        self
    }

    pub fn has_annotation(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.index.annotations.set(key, value);
        self
    }
}

/// Configures the discriminator of a TPH hierarchy.
pub struct DiscriminatorBuilder<'a> {
    root_value: &'a mut Option<Value>,
}

impl<'a> DiscriminatorBuilder<'a> {
    pub(super) fn new(root_value: &'a mut Option<Value>) -> Self {
        Self { root_value }
    }

    /// Discriminator value of the root type itself.
    pub fn has_value(&mut self, value: impl Into<Value>) -> &mut Self {
        *self.root_value = Some(value.into());
        self
    }
}
