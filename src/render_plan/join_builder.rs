//! Join Builder Module
//!
//! Walks a join chain in caller order, assigning aliases and resolving key
//! fields to columns, and produces a [`JoinPlan`].
//!
//! Rules:
//! - the first step's left type becomes `t1`
//! - every step's left type must already have an alias
//! - the right type always gets the next alias, even if it was joined before
//! - filters and orderings attach to the first alias of their owner type
//! - filters may share a parameter only if they bind it to the same value

use crate::dialect::Dialect;
use crate::entity_catalog::{Entity, EntityType, MetadataCache};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::join_predicate::{JoinPredicate, PredicateSide};
use crate::sql_builder::parameters::normalize_name;
use crate::sql_builder::{Parameters, QuerySelector};

use super::alias_table::AliasTable;
use super::{InnerJoin, JoinPlan, SelectColumn, TableRef};

/// One binary join step: `left.left_key_field == right.right_key_field`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub left_type: EntityType,
    pub right_type: EntityType,
    pub left_key_field: String,
    pub right_key_field: String,
}

impl JoinSpec {
    pub fn new<L: Entity, R: Entity>(
        left_key_field: impl Into<String>,
        right_key_field: impl Into<String>,
    ) -> Self {
        Self {
            left_type: EntityType::of::<L>(),
            right_type: EntityType::of::<R>(),
            left_key_field: left_key_field.into(),
            right_key_field: right_key_field.into(),
        }
    }

    pub fn from_predicate<L: Entity, R: Entity>(
        predicate: &JoinPredicate<L, R>,
    ) -> SynthesisResult<Self> {
        Ok(Self {
            left_type: predicate.key_type(PredicateSide::Left)?,
            right_type: predicate.key_type(PredicateSide::Right)?,
            left_key_field: predicate.key(PredicateSide::Left)?,
            right_key_field: predicate.key(PredicateSide::Right)?,
        })
    }

    /// `JoinSpec::parse::<Product, Category>("|p, c| p.category_id == c.category_id")`
    pub fn parse<L: Entity, R: Entity>(predicate: &str) -> SynthesisResult<Self> {
        Self::from_predicate(&JoinPredicate::<L, R>::parse(predicate)?)
    }
}

/// Post-join condition owned by one entity type.
///
/// `sql_fragment` is written relative to the owner's table (`UnitPrice > @MinPrice`)
/// and gets prefixed with the owner's alias.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinFilter {
    pub sql_fragment: String,
    pub owner_type: EntityType,
    pub parameters: Parameters,
}

impl JoinFilter {
    pub fn new<T: Entity>(sql_fragment: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            sql_fragment: sql_fragment.into(),
            owner_type: EntityType::of::<T>(),
            parameters,
        }
    }
}

/// ORDER BY term on one field of a joined type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOrder {
    pub owner_type: EntityType,
    pub field: String,
    pub descending: bool,
}

impl JoinOrder {
    pub fn ascending<T: Entity>(field: impl Into<String>) -> Self {
        Self {
            owner_type: EntityType::of::<T>(),
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending<T: Entity>(field: impl Into<String>) -> Self {
        Self {
            descending: true,
            ..Self::ascending::<T>(field)
        }
    }
}

pub struct JoinQueryBuilder<'a> {
    cache: &'a MetadataCache,
    dialect: &'a dyn Dialect,
    max_tables: usize,
    joins: Vec<JoinSpec>,
    filters: Vec<JoinFilter>,
    orders: Vec<JoinOrder>,
}

impl<'a> JoinQueryBuilder<'a> {
    pub fn new(cache: &'a MetadataCache, dialect: &'a dyn Dialect, max_tables: usize) -> Self {
        Self {
            cache,
            dialect,
            max_tables,
            joins: Vec::new(),
            filters: Vec::new(),
            orders: Vec::new(),
        }
    }

    pub fn join(mut self, spec: JoinSpec) -> Self {
        self.joins.push(spec);
        self
    }

    pub fn joins(mut self, specs: impl IntoIterator<Item = JoinSpec>) -> Self {
        self.joins.extend(specs);
        self
    }

    pub fn filter(mut self, filter: JoinFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = JoinFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn order_by(mut self, order: JoinOrder) -> Self {
        self.orders.push(order);
        self
    }

    pub fn build(&self) -> SynthesisResult<QuerySelector> {
        Ok(self.plan()?.into_selector())
    }

    pub fn plan(&self) -> SynthesisResult<JoinPlan> {
        let first = self.joins.first().ok_or(SynthesisError::EmptyJoinChain)?;

        let tables = self.joins.len() + 1;
        if tables > self.max_tables {
            return Err(SynthesisError::TooManyJoins {
                tables,
                max: self.max_tables,
            });
        }

        let mut aliases = AliasTable::new();
        let root_alias = aliases.register(first.left_type);
        let root = self.cache.resolve_type(first.left_type);
        root.require_columns("join")?;

        let mut joins = Vec::with_capacity(self.joins.len());
        for spec in &self.joins {
            let existing_alias = aliases
                .alias_of(&spec.left_type)
                .ok_or_else(|| SynthesisError::UnresolvedJoinAlias {
                    entity: spec.left_type.name().to_string(),
                })?
                .to_string();

            let left = self.cache.resolve_type(spec.left_type);
            let right = self.cache.resolve_type(spec.right_type);
            right.require_columns("join")?;

            let left_column = left.require_column_for_field(&spec.left_key_field)?;
            let right_column = right.require_column_for_field(&spec.right_key_field)?;

            let alias = aliases.register(spec.right_type);
            joins.push(InnerJoin {
                table: TableRef {
                    table_name: self.dialect.table(&right.table_name),
                    table_alias: alias,
                },
                existing_alias,
                left_column: self.dialect.identifier(&left_column.column_name),
                right_column: self.dialect.identifier(&right_column.column_name),
            });
        }

        let mut select = Vec::new();
        for (alias, entity) in aliases.iter() {
            let metadata = self.cache.resolve_type(entity);
            select.extend(metadata.mapped_columns().map(|c| SelectColumn {
                table_alias: alias.to_string(),
                column: self.dialect.identifier(&c.column_name),
            }));
        }

        let mut filters = Vec::with_capacity(self.filters.len());
        let mut parameters = Parameters::new();
        for filter in &self.filters {
            let alias = aliases.alias_of(&filter.owner_type).ok_or_else(|| {
                SynthesisError::UnresolvedFilterAlias {
                    entity: filter.owner_type.name().to_string(),
                }
            })?;
            filters.push(format!("{}.{}", alias, filter.sql_fragment.trim()));
            for (name, value) in &filter.parameters {
                let name = normalize_name(name);
                match parameters.get(name) {
                    Some(existing) if existing != value => {
                        return Err(SynthesisError::ConflictingParameter {
                            name: name.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        parameters.insert(name.to_string(), value.clone());
                    }
                }
            }
        }

        let mut order_by = Vec::with_capacity(self.orders.len());
        for order in &self.orders {
            let alias = aliases.alias_of(&order.owner_type).ok_or_else(|| {
                SynthesisError::UnresolvedFilterAlias {
                    entity: order.owner_type.name().to_string(),
                }
            })?;
            let metadata = self.cache.resolve_type(order.owner_type);
            let column = metadata.require_column_for_field(&order.field)?;
            order_by.push(format!(
                "{}.{}{}",
                alias,
                self.dialect.identifier(&column.column_name),
                if order.descending { " DESC" } else { "" }
            ));
        }

        log::debug!(
            "Join plan: {} tables, {} columns, {} filters, {} orderings",
            aliases.len(),
            select.len(),
            filters.len(),
            order_by.len()
        );

        Ok(JoinPlan {
            select,
            from: TableRef {
                table_name: self.dialect.table(&root.table_name),
                table_alias: root_alias,
            },
            joins,
            filters,
            order_by,
            parameters,
        })
    }
}
