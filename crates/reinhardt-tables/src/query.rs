//! Query plans
//!
//! A [`QueryPlan`] is the query-builder capability the table pipeline threads
//! through filters, search, sorting and pagination. It stays backend agnostic:
//! a repository can render it to SQL through [`QueryPlan::to_select_statement`]
//! or evaluate it against rows already in memory with [`QueryPlan::apply_to`].
//!
//! Plans only ever use ordered collections, so the same inputs always produce
//! the same plan.

use crate::record::Record;
use sea_query::{
	Alias, Asterisk, ColumnRef, Condition as SeaCondition, Expr, ExprTrait, IntoColumnRef, LikeExpr,
	Order, PostgresQueryBuilder, Query as SeaQuery, SelectStatement,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison operator of a single predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
	Eq,
	Ne,
	Gt,
	Gte,
	Lt,
	Lte,
	/// Value must be a JSON array
	In,
	/// Value must be a JSON array
	NotIn,
	/// Case-insensitive substring match; rendered as `ILIKE` with `%` and `_`
	/// taken literally
	Contains,
	/// Case-insensitive prefix match
	StartsWith,
	/// Case-insensitive suffix match
	EndsWith,
	IsNull,
	IsNotNull,
}

/// `field <operator> value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
	pub field: String,
	pub operator: Operator,
	pub value: Value,
}

impl Predicate {
	/// Create a predicate
	pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
		Self {
			field: field.into(),
			operator,
			value: value.into(),
		}
	}

	/// `field = value`
	pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::new(field, Operator::Eq, value)
	}

	/// `field` contains `needle` (case-insensitive)
	pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
		Self::new(field, Operator::Contains, Value::String(needle.into()))
	}

	/// `field IN (values)`
	pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
		Self::new(field, Operator::In, Value::Array(values))
	}

	/// Evaluate the predicate against a record; missing attributes read as `null`
	pub fn matches(&self, record: &Record) -> bool {
		let actual = record.get(&self.field).unwrap_or(&Value::Null);

		match self.operator {
			Operator::Eq => values_equal(actual, &self.value),
			Operator::Ne => !values_equal(actual, &self.value),
			Operator::Gt => compare_values(actual, &self.value) == Some(Ordering::Greater),
			Operator::Gte => matches!(
				compare_values(actual, &self.value),
				Some(Ordering::Greater | Ordering::Equal)
			),
			Operator::Lt => compare_values(actual, &self.value) == Some(Ordering::Less),
			Operator::Lte => matches!(
				compare_values(actual, &self.value),
				Some(Ordering::Less | Ordering::Equal)
			),
			Operator::In => self
				.value
				.as_array()
				.is_some_and(|items| items.iter().any(|item| values_equal(actual, item))),
			Operator::NotIn => self
				.value
				.as_array()
				.map(|items| !items.iter().any(|item| values_equal(actual, item)))
				.unwrap_or(true),
			Operator::Contains => text_match(actual, &self.value, |a, b| a.contains(b)),
			Operator::StartsWith => text_match(actual, &self.value, |a, b| a.starts_with(b)),
			Operator::EndsWith => text_match(actual, &self.value, |a, b| a.ends_with(b)),
			Operator::IsNull => actual.is_null(),
			Operator::IsNotNull => !actual.is_null(),
		}
	}
}

/// Composite condition supporting AND/OR/NOT nesting
///
/// # Examples
///
/// ```
/// use reinhardt_tables::query::{Condition, Predicate};
///
/// // status = 'active' AND (title ILIKE '%rust%' OR body ILIKE '%rust%')
/// let condition = Condition::and(vec![
///     Condition::single(Predicate::equals("status", "active")),
///     Condition::or(vec![
///         Condition::single(Predicate::contains("title", "rust")),
///         Condition::single(Predicate::contains("body", "rust")),
///     ]),
/// ]);
/// assert!(!condition.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
	/// A single predicate
	Single(Predicate),
	/// All conditions must match
	And(Vec<Condition>),
	/// Any condition must match
	Or(Vec<Condition>),
	/// Negates the inner condition
	Not(Box<Condition>),
}

impl Condition {
	/// Wrap a single predicate
	pub fn single(predicate: Predicate) -> Self {
		Self::Single(predicate)
	}

	/// AND of several conditions
	pub fn and(conditions: Vec<Condition>) -> Self {
		Self::And(conditions)
	}

	/// OR of several conditions
	pub fn or(conditions: Vec<Condition>) -> Self {
		Self::Or(conditions)
	}

	/// Negation of a condition
	// Named after the query-language operator, not `std::ops::Not`.
	#[allow(clippy::should_implement_trait)]
	pub fn not(condition: Condition) -> Self {
		Self::Not(Box::new(condition))
	}

	/// Whether the condition contains no predicate at all
	pub fn is_empty(&self) -> bool {
		match self {
			Condition::Single(_) => false,
			Condition::And(conditions) | Condition::Or(conditions) => {
				conditions.iter().all(Condition::is_empty)
			}
			Condition::Not(condition) => condition.is_empty(),
		}
	}

	/// Evaluate the condition against a record; empty groups match everything
	pub fn matches(&self, record: &Record) -> bool {
		if self.is_empty() {
			return true;
		}

		match self {
			Condition::Single(predicate) => predicate.matches(record),
			Condition::And(conditions) => conditions
				.iter()
				.filter(|c| !c.is_empty())
				.all(|c| c.matches(record)),
			Condition::Or(conditions) => conditions
				.iter()
				.filter(|c| !c.is_empty())
				.any(|c| c.matches(record)),
			Condition::Not(condition) => !condition.matches(record),
		}
	}

	fn to_sea_condition(&self) -> Option<SeaCondition> {
		match self {
			Condition::Single(predicate) => {
				predicate_expr(predicate).map(|expr| SeaCondition::all().add(expr))
			}
			Condition::And(conditions) => {
				if self.is_empty() {
					return None;
				}
				let mut all = SeaCondition::all();
				for condition in conditions {
					if let Some(sub) = condition.to_sea_condition() {
						all = all.add(sub);
					}
				}
				Some(all)
			}
			Condition::Or(conditions) => {
				if self.is_empty() {
					return None;
				}
				let mut any = SeaCondition::any();
				for condition in conditions {
					if let Some(sub) = condition.to_sea_condition() {
						any = any.add(sub);
					}
				}
				Some(any)
			}
			Condition::Not(inner) => inner.to_sea_condition().map(|c| c.not()),
		}
	}
}

impl From<Predicate> for Condition {
	fn from(predicate: Predicate) -> Self {
		Condition::Single(predicate)
	}
}

/// Collects row predicates that end up as one AND-grouped clause
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionGroup {
	conditions: Vec<Condition>,
}

impl ConditionGroup {
	/// Add a condition to the group, ignoring empty ones
	pub fn add(&mut self, condition: Condition) -> &mut Self {
		if !condition.is_empty() {
			self.conditions.push(condition);
		}
		self
	}

	/// Add a single predicate to the group
	pub fn predicate(&mut self, predicate: Predicate) -> &mut Self {
		self.add(Condition::Single(predicate))
	}

	/// Conditions collected so far
	pub fn conditions(&self) -> &[Condition] {
		&self.conditions
	}

	/// Whether nothing was added
	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	/// Collapse the group into a single AND condition
	pub fn into_condition(self) -> Option<Condition> {
		if self.conditions.is_empty() {
			None
		} else {
			Some(Condition::And(self.conditions))
		}
	}
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	#[default]
	Asc,
	Desc,
}

impl SortDirection {
	/// Opposite direction
	pub fn reversed(self) -> Self {
		match self {
			SortDirection::Asc => SortDirection::Desc,
			SortDirection::Desc => SortDirection::Asc,
		}
	}

	fn as_order(self) -> Order {
		match self {
			SortDirection::Asc => Order::Asc,
			SortDirection::Desc => Order::Desc,
		}
	}
}

/// Shape adjustment applied before row predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scope {
	/// `INNER JOIN table ON left = right`
	Join {
		table: String,
		left: String,
		right: String,
	},
	/// A global scope that constrains every row of the table
	Where(Condition),
}

/// One ORDER BY term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
	pub column: String,
	pub direction: SortDirection,
}

/// Record-fetch plan
///
/// # Examples
///
/// ```
/// use reinhardt_tables::query::{Predicate, QueryPlan, SortDirection};
///
/// let mut plan = QueryPlan::new("posts");
/// plan.where_group(|group| {
///     group.predicate(Predicate::equals("status", "published"));
/// })
/// .order_by("created_at", SortDirection::Desc)
/// .paginate(10, 20);
///
/// assert_eq!(plan.limit(), Some(10));
/// assert_eq!(plan.offset(), Some(20));
/// assert!(plan.to_sql().contains("LIMIT"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryPlan {
	table: String,
	scopes: Vec<Scope>,
	conditions: Vec<Condition>,
	order: Vec<OrderBy>,
	limit: Option<u64>,
	offset: Option<u64>,
}

impl QueryPlan {
	/// Start a plan selecting every row of `table`
	pub fn new(table: impl Into<String>) -> Self {
		Self {
			table: table.into(),
			..Self::default()
		}
	}

	/// Source table
	pub fn table(&self) -> &str {
		&self.table
	}

	/// Add a scope; a scope identical to one already present is skipped so
	/// that filters applied twice never produce duplicate joins
	pub fn add_scope(&mut self, scope: Scope) -> &mut Self {
		if !self.scopes.contains(&scope) {
			self.scopes.push(scope);
		}
		self
	}

	/// `INNER JOIN table ON left = right`
	pub fn join(
		&mut self,
		table: impl Into<String>,
		left: impl Into<String>,
		right: impl Into<String>,
	) -> &mut Self {
		self.add_scope(Scope::Join {
			table: table.into(),
			left: left.into(),
			right: right.into(),
		})
	}

	/// Global scope constraining every row
	pub fn scope(&mut self, condition: Condition) -> &mut Self {
		if condition.is_empty() {
			return self;
		}
		self.add_scope(Scope::Where(condition))
	}

	/// Add a row condition (ANDed with the existing ones)
	pub fn where_condition(&mut self, condition: Condition) -> &mut Self {
		if !condition.is_empty() {
			self.conditions.push(condition);
		}
		self
	}

	/// Build a grouped AND clause; nothing is added if the group stays empty
	pub fn where_group<F>(&mut self, build: F) -> &mut Self
	where
		F: FnOnce(&mut ConditionGroup),
	{
		let mut group = ConditionGroup::default();
		build(&mut group);
		if let Some(condition) = group.into_condition() {
			self.conditions.push(condition);
		}
		self
	}

	/// Append an ORDER BY term
	pub fn order_by(&mut self, column: impl Into<String>, direction: SortDirection) -> &mut Self {
		self.order.push(OrderBy {
			column: column.into(),
			direction,
		});
		self
	}

	/// Set LIMIT/OFFSET
	pub fn paginate(&mut self, limit: u64, offset: u64) -> &mut Self {
		self.limit = Some(limit);
		self.offset = Some(offset);
		self
	}

	/// Copy of the plan without LIMIT/OFFSET (counting, select-all resolution)
	pub fn without_pagination(&self) -> Self {
		Self {
			limit: None,
			offset: None,
			..self.clone()
		}
	}

	pub fn scopes(&self) -> &[Scope] {
		&self.scopes
	}

	pub fn conditions(&self) -> &[Condition] {
		&self.conditions
	}

	pub fn order(&self) -> &[OrderBy] {
		&self.order
	}

	pub fn limit(&self) -> Option<u64> {
		self.limit
	}

	pub fn offset(&self) -> Option<u64> {
		self.offset
	}

	/// Whether a record satisfies every global scope and row condition
	///
	/// Joins are a storage concern and are not evaluated here.
	pub fn matches(&self, record: &Record) -> bool {
		let scopes_match = self.scopes.iter().all(|scope| match scope {
			Scope::Where(condition) => condition.matches(record),
			Scope::Join { .. } => true,
		});

		scopes_match && self.conditions.iter().all(|c| c.matches(record))
	}

	/// Evaluate the plan over in-memory rows: filter, stable sort, offset, limit
	pub fn apply_to(&self, records: Vec<Record>) -> Vec<Record> {
		let mut matched: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();

		if !self.order.is_empty() {
			matched.sort_by(|a, b| {
				for term in &self.order {
					let left = a.get(&term.column).unwrap_or(&Value::Null);
					let right = b.get(&term.column).unwrap_or(&Value::Null);
					let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
					let ordering = match term.direction {
						SortDirection::Asc => ordering,
						SortDirection::Desc => ordering.reverse(),
					};
					if ordering != Ordering::Equal {
						return ordering;
					}
				}
				Ordering::Equal
			});
		}

		let offset = self.offset.unwrap_or(0) as usize;
		let iter = matched.into_iter().skip(offset);
		match self.limit {
			Some(limit) => iter.take(limit as usize).collect(),
			None => iter.collect(),
		}
	}

	/// Render the plan as a sea-query SELECT statement
	pub fn to_select_statement(&self) -> SelectStatement {
		let mut query = SeaQuery::select()
			.from(Alias::new(&self.table))
			.column(Asterisk)
			.to_owned();

		for scope in &self.scopes {
			match scope {
				Scope::Join { table, left, right } => {
					query.inner_join(
						Alias::new(table),
						Expr::col(column_ref(left)).equals(column_ref(right)),
					);
				}
				Scope::Where(condition) => {
					if let Some(cond) = condition.to_sea_condition() {
						query.cond_where(cond);
					}
				}
			}
		}

		for condition in &self.conditions {
			if let Some(cond) = condition.to_sea_condition() {
				query.cond_where(cond);
			}
		}

		for term in &self.order {
			query.order_by(column_ref(&term.column), term.direction.as_order());
		}

		if let Some(limit) = self.limit {
			query.limit(limit);
		}
		if let Some(offset) = self.offset {
			query.offset(offset);
		}

		query
	}

	/// Render the plan as PostgreSQL
	pub fn to_sql(&self) -> String {
		self.to_select_statement().to_string(PostgresQueryBuilder)
	}
}

/// `table.column` becomes a qualified column reference
fn column_ref(name: &str) -> ColumnRef {
	match name.split_once('.') {
		Some((table, column)) => (Alias::new(table), Alias::new(column)).into_column_ref(),
		None => Alias::new(name).into_column_ref(),
	}
}

fn json_to_sea_value(value: &Value) -> sea_query::Value {
	match value {
		Value::String(s) => s.clone().into(),
		Value::Number(n) => match n.as_i64() {
			Some(i) => i.into(),
			None => n.as_f64().unwrap_or_default().into(),
		},
		Value::Bool(b) => (*b).into(),
		Value::Null => sea_query::Value::Int(None),
		Value::Array(_) | Value::Object(_) => sea_query::Value::String(None),
	}
}

fn predicate_expr(predicate: &Predicate) -> Option<sea_query::SimpleExpr> {
	use sea_query::extension::postgres::PgExpr;

	let col = Expr::col(column_ref(&predicate.field));

	let expr = match (predicate.operator, &predicate.value) {
		(Operator::IsNull, _) | (Operator::Eq, Value::Null) => col.is_null(),
		(Operator::IsNotNull, _) | (Operator::Ne, Value::Null) => col.is_not_null(),
		(Operator::Eq, v) => col.eq(json_to_sea_value(v)),
		(Operator::Ne, v) => col.ne(json_to_sea_value(v)),
		(Operator::Gt, v) => col.gt(json_to_sea_value(v)),
		(Operator::Gte, v) => col.gte(json_to_sea_value(v)),
		(Operator::Lt, v) => col.lt(json_to_sea_value(v)),
		(Operator::Lte, v) => col.lte(json_to_sea_value(v)),
		(Operator::Contains, v) => col.ilike(like_pattern("%", &value_text(v)?, "%")),
		(Operator::StartsWith, v) => col.ilike(like_pattern("", &value_text(v)?, "%")),
		(Operator::EndsWith, v) => col.ilike(like_pattern("%", &value_text(v)?, "")),
		(Operator::In, Value::Array(items)) => {
			col.is_in(items.iter().map(json_to_sea_value).collect::<Vec<_>>())
		}
		(Operator::NotIn, Value::Array(items)) => {
			col.is_not_in(items.iter().map(json_to_sea_value).collect::<Vec<_>>())
		}
		_ => return None,
	};

	Some(expr)
}

/// Wrap user text in LIKE wildcards
fn like_pattern(prefix: &str, text: &str, suffix: &str) -> LikeExpr {
	LikeExpr::new(format!("{}{}{}", prefix, escape_like(text), suffix)).escape('\\')
}

/// Make `%`, `_` and the escape character match literally
fn escape_like(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		if matches!(c, '\\' | '%' | '_') {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	escaped
}

fn value_text(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

fn text_match(actual: &Value, needle: &Value, op: impl Fn(&str, &str) -> bool) -> bool {
	match (value_text(actual), value_text(needle)) {
		(Some(haystack), Some(needle)) => op(&haystack.to_lowercase(), &needle.to_lowercase()),
		_ => false,
	}
}

fn values_equal(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
		_ => left == right,
	}
}

/// Ordering used for comparisons and in-memory sorting; `null` sorts first
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
	match (left, right) {
		(Value::Null, Value::Null) => Some(Ordering::Equal),
		(Value::Null, _) => Some(Ordering::Less),
		(_, Value::Null) => Some(Ordering::Greater),
		(Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		(Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
		_ => None,
	}
}
