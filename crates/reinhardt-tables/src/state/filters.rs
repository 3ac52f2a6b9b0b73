//! Filter state
//!
//! Holds the filters form (one group per filter) and turns it into query
//! adjustments. Side effects of a change (session write, selection reset,
//! page reset) are orchestrated by the controller.

use crate::definition::TableDefinition;
use crate::error::Result;
use crate::form::{Form, FormData, GroupState};
use crate::query::QueryPlan;

/// Per-filter form state
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
	form: Form,
}

impl FilterState {
	/// Filters form of the definition, filled from defaults
	pub fn new(definition: &TableDefinition) -> Self {
		let mut form = definition.filters_form();
		form.fill_defaults();
		Self { form }
	}

	/// Hydrate from a stored mapping; `None` or an empty mapping fills defaults
	pub fn fill(&mut self, data: Option<&FormData>) {
		match data {
			Some(data) if !data.is_empty() => self.form.fill(Some(data)),
			_ => self.form.fill_defaults(),
		}
	}

	/// Hydrate from the incoming state with the persisted mapping merged over it
	///
	/// Persisted groups replace fields of the incoming groups one by one.
	pub fn restore(&mut self, incoming: Option<FormData>, persisted: Option<FormData>) {
		let mut merged = incoming.unwrap_or_default();
		for (group, fields) in persisted.unwrap_or_default() {
			merged.entry(group).or_default().extend(fields);
		}
		self.fill(Some(&merged));
	}

	/// Replace a filter's state; fields not given take their default
	pub fn apply_filter(
		&mut self,
		definition: &TableDefinition,
		name: &str,
		values: GroupState,
	) -> Result<()> {
		let filter = definition.filter(name)?;
		let mut state: GroupState = filter
			.form_schema()
			.into_iter()
			.map(|field| (field.name, field.default))
			.collect();
		state.extend(values);
		self.form.set_group(name, state);
		Ok(())
	}

	/// Blank one field of a filter, or the whole filter
	///
	/// A `field` that the filter does not declare blanks every field.
	pub fn remove_filter(
		&mut self,
		definition: &TableDefinition,
		name: &str,
		field: Option<&str>,
	) -> Result<()> {
		definition.filter(name)?;
		let fields: Vec<String> = self
			.form
			.field_names(name)
			.unwrap_or_default()
			.into_iter()
			.map(str::to_string)
			.collect();

		match field {
			Some(field) if fields.iter().any(|f| f == field) => {
				self.form.blank_field(name, field);
			}
			_ => {
				for field in &fields {
					self.form.blank_field(name, field);
				}
			}
		}
		Ok(())
	}

	/// Blank every field of every filter
	pub fn remove_all_filters(&mut self, definition: &TableDefinition) {
		for filter in definition.filters() {
			let fields: Vec<String> = self
				.form
				.field_names(filter.name())
				.unwrap_or_default()
				.into_iter()
				.map(str::to_string)
				.collect();
			for field in &fields {
				self.form.blank_field(filter.name(), field);
			}
		}
	}

	/// Re-fill every filter from its schema defaults
	pub fn reset_to_defaults(&mut self) {
		self.form.fill_defaults();
	}

	pub fn filter_state(&self, name: &str) -> Option<&GroupState> {
		self.form.group_state(name)
	}

	/// Full mapping, keyed by filter name
	pub fn raw_state(&self) -> &FormData {
		self.form.raw_state()
	}

	/// Apply every filter to the query
	///
	/// Base-query adjustments of all filters run first, in definition order.
	/// Row predicates of all filters are then added as one AND group.
	pub fn apply_filters_to_query(&self, definition: &TableDefinition, query: &mut QueryPlan) {
		let empty = GroupState::new();
		let state_of = |name: &str| self.form.group_state(name).unwrap_or(&empty);

		for filter in definition.filters() {
			filter.apply_to_base_query(query, state_of(filter.name()));
		}
		query.where_group(|group| {
			for filter in definition.filters() {
				filter.apply(group, state_of(filter.name()));
			}
		});
	}

	/// Names of filters whose state is not blank, in definition order
	pub fn active_filters<'a>(&self, definition: &'a TableDefinition) -> Vec<&'a str> {
		definition
			.filters()
			.iter()
			.filter(|filter| {
				self.form
					.group_state(filter.name())
					.is_some_and(|state| filter.is_active(state))
			})
			.map(|filter| filter.name())
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::TableError;
	use crate::filter::{CallbackFilter, SelectFilter, ToggleFilter};
	use crate::form::FieldSchema;
	use crate::query::{Condition, Predicate, Scope};
	use rstest::{fixture, rstest};
	use serde_json::{Value, json};

	#[fixture]
	fn definition() -> TableDefinition {
		TableDefinition::builder("posts")
			.filter(SelectFilter::new("status").multiple(true))
			.filter(ToggleFilter::new("featured", Predicate::equals("featured", true)))
			.filter(
				CallbackFilter::new(
					"author",
					vec![FieldSchema::scalar("name"), FieldSchema::toggle("verified")],
				)
				.base_query(|query, _| {
					query.join("authors", "posts.author_id", "authors.id");
				})
				.query(|group, state| {
					if let Some(name) = state.get("name").and_then(Value::as_str) {
						group.predicate(Predicate::equals("authors.name", name));
					}
				}),
			)
			.build()
			.unwrap()
	}

	fn group(pairs: &[(&str, Value)]) -> GroupState {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect()
	}

	#[rstest]
	fn test_apply_filter_round_trip(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		let value = group(&[("values", json!(["active"]))]);

		filters.apply_filter(&definition, "status", value.clone()).unwrap();

		assert_eq!(filters.filter_state("status"), Some(&value));
	}

	#[rstest]
	fn test_apply_filter_fills_missing_fields_with_defaults(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		filters
			.apply_filter(&definition, "author", group(&[("name", json!("kent"))]))
			.unwrap();

		assert_eq!(
			filters.filter_state("author"),
			Some(&group(&[("name", json!("kent")), ("verified", json!(false))]))
		);
	}

	#[rstest]
	fn test_unknown_filter_is_rejected(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		let result = filters.apply_filter(&definition, "missing", GroupState::new());
		assert!(matches!(result, Err(TableError::UnknownFilter(name)) if name == "missing"));
	}

	#[rstest]
	fn test_remove_filter_blanks_by_type(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		filters
			.apply_filter(&definition, "status", group(&[("values", json!(["active"]))]))
			.unwrap();
		filters
			.apply_filter(&definition, "featured", group(&[("is_active", json!(true))]))
			.unwrap();

		filters.remove_filter(&definition, "status", None).unwrap();
		filters.remove_filter(&definition, "featured", None).unwrap();

		assert_eq!(filters.filter_state("status").unwrap()["values"], json!([]));
		assert_eq!(filters.filter_state("featured").unwrap()["is_active"], json!(false));
	}

	#[rstest]
	fn test_remove_single_field(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		filters
			.apply_filter(
				&definition,
				"author",
				group(&[("name", json!("kent")), ("verified", json!(true))]),
			)
			.unwrap();

		filters.remove_filter(&definition, "author", Some("name")).unwrap();

		let state = filters.filter_state("author").unwrap();
		assert_eq!(state["name"], json!(null));
		assert_eq!(state["verified"], json!(true));
	}

	#[rstest]
	fn test_remove_unknown_field_blanks_whole_filter(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		filters
			.apply_filter(
				&definition,
				"author",
				group(&[("name", json!("kent")), ("verified", json!(true))]),
			)
			.unwrap();

		filters.remove_filter(&definition, "author", Some("nope")).unwrap();

		let state = filters.filter_state("author").unwrap();
		assert_eq!(state["name"], json!(null));
		assert_eq!(state["verified"], json!(false));
	}

	#[rstest]
	fn test_remove_all_and_reset() {
		let definition = TableDefinition::builder("posts")
			.filter(ToggleFilter::new("featured", Predicate::equals("featured", true)).default_on(true))
			.build()
			.unwrap();
		let mut filters = FilterState::new(&definition);

		filters.remove_all_filters(&definition);
		assert_eq!(filters.filter_state("featured").unwrap()["is_active"], json!(false));

		filters.reset_to_defaults();
		assert_eq!(filters.filter_state("featured").unwrap()["is_active"], json!(true));
	}

	#[rstest]
	fn test_restore_merges_persisted_over_incoming(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		let incoming = FormData::from([
			("status".to_string(), group(&[("values", json!(["draft"]))])),
			("featured".to_string(), group(&[("is_active", json!(true))])),
		]);
		let persisted = FormData::from([(
			"status".to_string(),
			group(&[("values", json!(["active"]))]),
		)]);

		filters.restore(Some(incoming), Some(persisted));

		assert_eq!(filters.filter_state("status").unwrap()["values"], json!(["active"]));
		assert_eq!(filters.filter_state("featured").unwrap()["is_active"], json!(true));
	}

	#[rstest]
	fn test_restore_empty_mapping_fills_defaults(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		filters
			.apply_filter(&definition, "status", group(&[("values", json!(["active"]))]))
			.unwrap();

		filters.restore(Some(FormData::new()), None);

		assert_eq!(filters.filter_state("status").unwrap()["values"], json!([]));
	}

	#[rstest]
	fn test_apply_filters_to_query_is_two_phase(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		filters
			.apply_filter(&definition, "status", group(&[("values", json!(["active"]))]))
			.unwrap();
		filters
			.apply_filter(&definition, "author", group(&[("name", json!("kent"))]))
			.unwrap();

		let mut query = QueryPlan::new("posts");
		filters.apply_filters_to_query(&definition, &mut query);

		assert_eq!(
			query.scopes(),
			&[Scope::Join {
				table: "authors".into(),
				left: "posts.author_id".into(),
				right: "authors.id".into(),
			}]
		);
		assert_eq!(
			query.conditions(),
			&[Condition::and(vec![
				Predicate::is_in("status", vec![json!("active")]).into(),
				Predicate::equals("authors.name", "kent").into(),
			])]
		);
	}

	#[rstest]
	fn test_blank_filters_add_no_conditions(definition: TableDefinition) {
		let filters = FilterState::new(&definition);
		let mut query = QueryPlan::new("posts");

		filters.apply_filters_to_query(&definition, &mut query);

		assert!(query.conditions().is_empty());
		assert!(filters.active_filters(&definition).is_empty());
	}

	#[rstest]
	fn test_active_filters(definition: TableDefinition) {
		let mut filters = FilterState::new(&definition);
		filters
			.apply_filter(&definition, "featured", group(&[("is_active", json!(true))]))
			.unwrap();

		assert_eq!(filters.active_filters(&definition), vec!["featured"]);
	}
}
