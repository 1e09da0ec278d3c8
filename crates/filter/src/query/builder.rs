//! In-memory query target.

use sea_query::{PostgresQueryBuilder, Values};

use super::render;
use super::{Join, JoinKind, Parameter, ParameterValue, Predicate, QueryTarget};
use crate::error::RenderError;
use crate::metadata::FieldType;

/// Query builder collecting joins, WHERE predicates and named parameters
/// for a single root resource.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    resource: String,
    table: String,
    alias: Option<String>,
    joins: Vec<Join>,
    wheres: Vec<Predicate>,
    parameters: Vec<Parameter>,
}

impl QueryBuilder {
    /// Create a query selecting `resource` (stored in `table`) as `alias`.
    pub fn new(resource: &str, table: &str, alias: &str) -> Self {
        Self {
            resource: resource.to_string(),
            table: table.to_string(),
            alias: Some(alias.to_string()),
            joins: Vec::new(),
            wheres: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Create a query whose root has no alias.
    ///
    /// Filters treat such a query as not filterable.
    pub fn unaliased(resource: &str, table: &str) -> Self {
        Self {
            alias: None,
            ..Self::new(resource, table, "")
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn wheres(&self) -> &[Predicate] {
        &self.wheres
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Alias used when rendering: the root alias, or the table name.
    pub(crate) fn effective_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// Render the query as DQL-style text with named parameters.
    pub fn to_dql(&self) -> String {
        let alias = self.effective_alias();
        let mut dql = format!("SELECT {alias} FROM {} {alias}", self.resource);

        for join in &self.joins {
            let kind = match join.kind {
                JoinKind::Left => "LEFT JOIN",
                JoinKind::Inner => "INNER JOIN",
            };
            dql.push_str(&format!(" {kind} {} {}", join.path, join.alias));
        }

        if !self.wheres.is_empty() {
            let wheres: Vec<String> = self.wheres.iter().map(ToString::to_string).collect();
            dql.push_str(" WHERE ");
            dql.push_str(&wheres.join(" AND "));
        }

        dql
    }

    /// Render PostgreSQL with parameter values inlined.
    pub fn to_sql(&self) -> Result<String, RenderError> {
        Ok(render::select_statement(self)?.to_string(PostgresQueryBuilder))
    }

    /// Render PostgreSQL with positional placeholders and their values.
    pub fn build_sql(&self) -> Result<(String, Values), RenderError> {
        Ok(render::select_statement(self)?.build(PostgresQueryBuilder))
    }
}

impl QueryTarget for QueryBuilder {
    fn root_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    fn set_parameter(&mut self, name: &str, value: ParameterValue, ty: Option<FieldType>) {
        let parameter = Parameter {
            name: name.to_string(),
            value,
            ty,
        };
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }

    fn and_where(&mut self, predicate: Predicate) {
        self.wheres.push(predicate);
    }

    fn find_join(&self, path: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.path == path)
    }

    fn add_join(&mut self, join: Join) {
        self.joins.push(join);
    }
}
