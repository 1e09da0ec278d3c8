//! SQL rendering using SeaQuery.
//!
//! Named parameters are resolved against the query's bindings here, so the
//! SQL side only ever sees concrete values.

use sea_query::{Alias, Asterisk, Cond, Expr, ExprTrait, Query, SelectStatement, SimpleExpr, Value};

use super::builder::QueryBuilder;
use super::{Column, Comparison, JoinKind, ParameterValue, Predicate};
use crate::error::RenderError;

/// Build the SELECT statement for a query.
pub(super) fn select_statement(query: &QueryBuilder) -> Result<SelectStatement, RenderError> {
    let alias = query.effective_alias();
    let mut select = Query::select();

    select
        .column((Alias::new(alias), Asterisk))
        .from_as(Alias::new(query.table()), Alias::new(alias));

    for join in query.joins() {
        let table = join
            .table
            .as_deref()
            .ok_or_else(|| RenderError::UnmappedJoin(join.path.clone()))?;
        let join_type = match join.kind {
            JoinKind::Left => sea_query::JoinType::LeftJoin,
            JoinKind::Inner => sea_query::JoinType::InnerJoin,
        };
        let on_condition = Expr::col((
            Alias::new(&join.parent_alias),
            Alias::new(&join.local_column),
        ))
        .equals((Alias::new(&join.alias), Alias::new(&join.foreign_column)));

        select.join_as(
            join_type,
            Alias::new(table),
            Alias::new(&join.alias),
            on_condition,
        );
    }

    for predicate in query.wheres() {
        select.and_where(predicate_expr(predicate, query)?);
    }

    Ok(select)
}

fn predicate_expr(predicate: &Predicate, query: &QueryBuilder) -> Result<SimpleExpr, RenderError> {
    let expr = match predicate {
        Predicate::Compare {
            column,
            op,
            parameter,
        } => {
            let value = scalar(parameter, query)?;
            let col = column_expr(column);
            match op {
                Comparison::Eq => col.eq(value),
                Comparison::Lt => col.lt(value),
                Comparison::Lte => col.lte(value),
                Comparison::Gt => col.gt(value),
                Comparison::Gte => col.gte(value),
            }
        }
        Predicate::In { column, parameter } => column_expr(column).is_in(list(parameter, query)?),
        Predicate::Between { column, low, high } => {
            column_expr(column).between(scalar(low, query)?, scalar(high, query)?)
        }
        Predicate::IsNull(column) => column_expr(column).is_null(),
        Predicate::IsNotNull(column) => column_expr(column).is_not_null(),
        Predicate::All(parts) => {
            let mut cond = Cond::all();
            for part in parts {
                cond = cond.add(predicate_expr(part, query)?);
            }
            cond.into()
        }
        Predicate::Any(parts) => {
            let mut cond = Cond::any();
            for part in parts {
                cond = cond.add(predicate_expr(part, query)?);
            }
            cond.into()
        }
    };

    Ok(expr)
}

fn column_expr(column: &Column) -> Expr {
    Expr::col((Alias::new(&column.alias), Alias::new(&column.field)))
}

fn bound<'q>(name: &str, query: &'q QueryBuilder) -> Result<&'q ParameterValue, RenderError> {
    query
        .parameter(name)
        .map(|p| &p.value)
        .ok_or_else(|| RenderError::UnboundParameter(name.to_string()))
}

fn scalar(name: &str, query: &QueryBuilder) -> Result<Value, RenderError> {
    match bound(name, query)? {
        ParameterValue::List(_) => Err(RenderError::UnexpectedList(name.to_string())),
        value => Ok(to_value(value)),
    }
}

/// List parameters expand to their items; a scalar becomes a one-item list.
fn list(name: &str, query: &QueryBuilder) -> Result<Vec<Value>, RenderError> {
    match bound(name, query)? {
        ParameterValue::List(items) => {
            if items.iter().any(|item| matches!(item, ParameterValue::List(_))) {
                return Err(RenderError::UnexpectedList(name.to_string()));
            }
            Ok(items.iter().map(to_value).collect())
        }
        value => Ok(vec![to_value(value)]),
    }
}

/// Nested lists are rejected by the callers before reaching here.
fn to_value(value: &ParameterValue) -> Value {
    match value {
        ParameterValue::Int(i) => (*i).into(),
        ParameterValue::Float(f) => (*f).into(),
        ParameterValue::Text(s) => s.clone().into(),
        ParameterValue::Date(d) => (*d).into(),
        ParameterValue::DateTime(dt) => (*dt).into(),
        ParameterValue::DateTimeTz(dt) => (*dt).into(),
        ParameterValue::Time(t) => (*t).into(),
        ParameterValue::List(_) => Value::String(None),
    }
}
