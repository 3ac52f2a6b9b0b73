//! Reactive data-table state engine for Reinhardt
//!
//! This crate keeps the state of an interactive admin table (filters, sort,
//! search, selection, pagination, manual ordering, column visibility) and
//! turns it into a record query. It also mounts and runs the table's record
//! and bulk actions. Rendering is left to the hosting page.
//!
//! # Features
//!
//! - **Definitions**: Declarative table definitions with name-keyed registries
//! - **Filters**: Form-backed filters applied as one AND group (`SelectFilter`, `ToggleFilter`, `CallbackFilter`)
//! - **Sorting**: none → ascending → descending cycle with default resolution
//! - **Selection**: Key-based selection surviving pagination, with lazy select-all
//! - **Reordering**: 1-based positions on record rows or many-to-many pivot rows
//! - **Actions**: Confirmation flow, fail-fast bulk execution, notifications
//! - **Persistence**: Filters, search and column toggles kept in a session store
//!
//! # Architecture
//!
//! ```mermaid
//! graph TD
//!     A[TableController] --> B[FilterState]
//!     A --> C[SortState]
//!     A --> D[SearchState]
//!     A --> E[SelectionState]
//!     A --> F[Pagination]
//!     A --> G[ColumnToggleState]
//!     A --> H[ActionDispatcher]
//!     A --> I[ReorderEngine]
//!     B & C & D & F --> J[TableQueryBuilder]
//!     J --> K[QueryPlan]
//!     K --> L[RecordRepository]
//!     H --> L
//!     I --> L
//!     I --> M[Relationship]
//!     B & D & G --> N[SessionStore]
//! ```
//!
//! # Example
//!
//! ```rust
//! use reinhardt_tables::filter::SelectFilter;
//! use reinhardt_tables::query::SortDirection;
//! use reinhardt_tables::records::InMemoryRecords;
//! use reinhardt_tables::{Column, Record, TableController, TableDefinition};
//! use std::sync::Arc;
//!
//! # async fn example() -> reinhardt_tables::Result<()> {
//! let definition = TableDefinition::builder("posts")
//!     .column(Column::new("title").sortable(true).searchable(true))
//!     .filter(SelectFilter::new("status").multiple(true))
//!     .default_sort("title", SortDirection::Asc)
//!     .build()?;
//! let records = InMemoryRecords::from_records([
//!     Record::new(1).attribute("title", "Ownership"),
//!     Record::new(2).attribute("title", "Borrowing"),
//! ]);
//!
//! let mut table = TableController::builder(Arc::new(definition), Arc::new(records))
//!     .mount()
//!     .await?;
//! table.set_search("own").await?;
//!
//! let page = table.records().await?;
//! assert_eq!(page.meta.total, 1);
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::broken_intra_doc_links)]

pub mod action;
pub mod builder;
pub mod column;
pub mod controller;
pub mod definition;
pub mod error;
pub mod filter;
pub mod form;
pub mod query;
pub mod record;
pub mod records;
pub mod reorder;
pub mod session;
pub mod settings;
pub mod state;

// Re-exports for convenience
pub use column::Column;
pub use controller::{TableController, TableControllerBuilder, TablePage};
pub use definition::{RelationshipDescriptor, TableDefinition, TableDefinitionBuilder};
pub use error::{Result, TableError};
pub use record::{Attributes, Record, RecordKey};
pub use settings::TableSettings;
