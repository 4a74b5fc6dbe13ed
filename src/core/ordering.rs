//! Custom display order for class names and material categories.
//!
//! Both label sets live in their own rank table and are derived from a column
//! on another table, so one [`LabelOrdering`] value describes each of them.
//! Rank rows for labels that no longer exist are kept but ignored.

use crate::{
    core::validation::require_text,
    errors::{Error, Result},
};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, Statement, StatementBuilder, TransactionTrait,
    sea_query::{Alias, Expr, Order, Query},
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// A rank table and the column whose distinct values it orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelOrdering {
    table: &'static str,
    label_column: &'static str,
    source_table: &'static str,
    source_column: &'static str,
}

/// Ordering of `students.class_name`.
pub const CLASSES: LabelOrdering = LabelOrdering {
    table: "class_order",
    label_column: "class_name",
    source_table: "students",
    source_column: "class_name",
};

/// Ordering of `materials.category`.
pub const CATEGORIES: LabelOrdering = LabelOrdering {
    table: "category_order",
    label_column: "category_name",
    source_table: "materials",
    source_column: "category",
};

const SORT_ORDER: &str = "sort_order";

fn build<C, S>(db: &C, statement: &S) -> Statement
where
    C: ConnectionTrait,
    S: StatementBuilder,
{
    db.get_database_backend().build(statement)
}

impl LabelOrdering {
    /// Ranked labels from the rank table, lowest rank first.
    async fn ranked<C>(&self, db: &C) -> Result<Vec<(String, i32)>>
    where
        C: ConnectionTrait,
    {
        let query = Query::select()
            .column(Alias::new(self.label_column))
            .column(Alias::new(SORT_ORDER))
            .from(Alias::new(self.table))
            .order_by(Alias::new(SORT_ORDER), Order::Asc)
            .order_by(Alias::new(self.label_column), Order::Asc)
            .to_owned();

        let rows = db.query_all(build(db, &query)).await?;
        rows.iter()
            .map(|row| -> Result<(String, i32)> {
                Ok((
                    row.try_get::<String>("", self.label_column)?,
                    row.try_get::<i32>("", SORT_ORDER)?,
                ))
            })
            .collect()
    }

    /// Distinct non-empty labels currently in use.
    async fn labels_in_use(&self, db: &DatabaseConnection) -> Result<Vec<String>> {
        let column = Alias::new(self.source_column);
        let query = Query::select()
            .distinct()
            .column(column.clone())
            .from(Alias::new(self.source_table))
            .and_where(Expr::col(column.clone()).is_not_null())
            .and_where(Expr::col(column.clone()).ne(""))
            .order_by(column, Order::Asc)
            .to_owned();

        let rows = db.query_all(build(db, &query)).await?;
        rows.iter()
            .map(|row| row.try_get::<String>("", self.source_column).map_err(Error::from))
            .collect()
    }

    /// Rank of every label in the rank table.
    pub async fn get_order(&self, db: &DatabaseConnection) -> Result<HashMap<String, i32>> {
        Ok(self.ranked(db).await?.into_iter().collect())
    }

    /// Labels in use, custom-ordered ones first, then the rest alphabetically.
    pub async fn get_ordered_labels(&self, db: &DatabaseConnection) -> Result<Vec<String>> {
        let in_use = self.labels_in_use(db).await?;
        let ranked = self.ranked(db).await?;

        let mut labels: Vec<String> = ranked
            .into_iter()
            .map(|(label, _)| label)
            .filter(|label| in_use.contains(label))
            .collect();
        let mut rest: Vec<String> = in_use
            .into_iter()
            .filter(|label| !labels.contains(label))
            .collect();
        rest.sort();
        labels.extend(rest);

        debug!(table = self.table, count = labels.len(), "Ordered labels");
        Ok(labels)
    }

    /// Replaces the whole order; `labels[i]` gets rank `i`.
    #[instrument(skip(self, db, labels), fields(table = self.table))]
    pub async fn set_order(&self, db: &DatabaseConnection, labels: &[String]) -> Result<()> {
        let mut seen = HashSet::new();
        let mut checked = Vec::with_capacity(labels.len());
        for label in labels {
            let label = require_text("Label", label)?;
            if !seen.insert(label.clone()) {
                return Err(Error::Validation {
                    message: format!("'{label}' appears more than once"),
                });
            }
            checked.push(label);
        }

        let txn = db.begin().await?;
        let clear = Query::delete().from_table(Alias::new(self.table)).to_owned();
        txn.execute(build(&txn, &clear)).await?;

        if !checked.is_empty() {
            let mut insert = Query::insert()
                .into_table(Alias::new(self.table))
                .columns([Alias::new(self.label_column), Alias::new(SORT_ORDER)])
                .to_owned();
            for (rank, label) in (0_i32..).zip(checked) {
                insert
                    .values([label.into(), rank.into()])
                    .map_err(|e| Error::Validation {
                        message: e.to_string(),
                    })?;
            }
            txn.execute(build(&txn, &insert)).await?;
        }

        txn.commit().await?;
        info!(count = labels.len(), "Saved label order");
        Ok(())
    }

    /// Swaps `label` with the ranked label before it. False when it is first or unranked.
    pub async fn move_up(&self, db: &DatabaseConnection, label: &str) -> Result<bool> {
        self.swap_with_neighbour(db, label, true).await
    }

    /// Swaps `label` with the ranked label after it. False when it is last or unranked.
    pub async fn move_down(&self, db: &DatabaseConnection, label: &str) -> Result<bool> {
        self.swap_with_neighbour(db, label, false).await
    }

    #[instrument(skip(self, db), fields(table = self.table))]
    async fn swap_with_neighbour(
        &self,
        db: &DatabaseConnection,
        label: &str,
        upwards: bool,
    ) -> Result<bool> {
        let txn = db.begin().await?;
        let ranked = self.ranked(&txn).await?;

        let Some(index) = ranked.iter().position(|(name, _)| name == label) else {
            return Ok(false);
        };
        let neighbour = if upwards {
            index.checked_sub(1)
        } else {
            Some(index + 1).filter(|&next| next < ranked.len())
        };
        let Some(neighbour) = neighbour else {
            return Ok(false);
        };

        let (name, rank) = &ranked[index];
        let (other_name, other_rank) = &ranked[neighbour];
        for (target, new_rank) in [(name, *other_rank), (other_name, *rank)] {
            let update = Query::update()
                .table(Alias::new(self.table))
                .value(Alias::new(SORT_ORDER), new_rank)
                .and_where(Expr::col(Alias::new(self.label_column)).eq(target.as_str()))
                .to_owned();
            txn.execute(build(&txn, &update)).await?;
        }

        txn.commit().await?;
        info!(label, neighbour = %other_name, "Moved label");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::student::{StudentInput, add_student};
    use crate::test_utils::*;

    async fn add_classes(db: &DatabaseConnection, classes: &[&str]) -> Result<()> {
        for (i, class) in classes.iter().enumerate() {
            add_student(db, StudentInput::new(format!("Student {i}")).in_class(*class)).await?;
        }
        Ok(())
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_unordered_labels_are_alphabetical() -> Result<()> {
        let db = setup_test_db().await?;
        add_classes(&db, &["Wednesday", "Monday", "Monday"]).await?;
        create_test_student(&db, "No Class").await?;

        assert_eq!(
            CLASSES.get_ordered_labels(&db).await?,
            labels(&["Monday", "Wednesday"])
        );
        assert!(CLASSES.get_order(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_order_then_append_unordered() -> Result<()> {
        let db = setup_test_db().await?;
        add_classes(&db, &["c1", "c2", "c3", "b-new", "a-new"]).await?;

        CLASSES.set_order(&db, &labels(&["c3", "c1", "c2"])).await?;

        assert_eq!(
            CLASSES.get_ordered_labels(&db).await?,
            labels(&["c3", "c1", "c2", "a-new", "b-new"])
        );
        let order = CLASSES.get_order(&db).await?;
        assert_eq!(order["c3"], 0);
        assert_eq!(order["c2"], 2);

        // Setting again clears the previous ranks
        CLASSES.set_order(&db, &labels(&["c2"])).await?;
        assert_eq!(CLASSES.get_order(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_order_rejects_duplicates() -> Result<()> {
        let db = setup_test_db().await?;
        CLASSES.set_order(&db, &labels(&["a", "b"])).await?;

        let result = CLASSES.set_order(&db, &labels(&["x", "y", "x"])).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
        let result = CLASSES.set_order(&db, &labels(&["x", " "])).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        // Previous order untouched
        assert_eq!(CLASSES.get_order(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_order_rolls_back_on_failure() -> Result<()> {
        let db = setup_test_db().await?;
        add_classes(&db, &["a", "b", "c"]).await?;
        CLASSES.set_order(&db, &labels(&["c", "b", "a"])).await?;
        db.execute_unprepared(
            "CREATE TRIGGER freeze_class_order BEFORE INSERT ON class_order \
             BEGIN SELECT RAISE(ABORT, 'order locked'); END",
        )
        .await?;

        let result = CLASSES.set_order(&db, &labels(&["a", "b", "c"])).await;
        assert!(matches!(result.unwrap_err(), Error::Database(_)));

        // The cleared ranks come back with the rollback
        assert_eq!(CLASSES.get_ordered_labels(&db).await?, labels(&["c", "b", "a"]));
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_entries_are_inert() -> Result<()> {
        let db = setup_test_db().await?;
        add_classes(&db, &["Monday"]).await?;

        CLASSES.set_order(&db, &labels(&["Retired", "Monday"])).await?;

        assert_eq!(CLASSES.get_ordered_labels(&db).await?, labels(&["Monday"]));
        assert!(CLASSES.get_order(&db).await?.contains_key("Retired"));
        Ok(())
    }

    #[tokio::test]
    async fn test_move_up_and_down() -> Result<()> {
        let db = setup_test_db().await?;
        add_classes(&db, &["a", "b", "c"]).await?;
        CLASSES.set_order(&db, &labels(&["a", "b", "c"])).await?;

        assert!(!CLASSES.move_up(&db, "a").await?);
        assert!(!CLASSES.move_down(&db, "c").await?);
        assert!(!CLASSES.move_up(&db, "missing").await?);
        assert_eq!(CLASSES.get_ordered_labels(&db).await?, labels(&["a", "b", "c"]));

        assert!(CLASSES.move_up(&db, "c").await?);
        assert_eq!(CLASSES.get_ordered_labels(&db).await?, labels(&["a", "c", "b"]));

        assert!(CLASSES.move_down(&db, "a").await?);
        assert_eq!(CLASSES.get_ordered_labels(&db).await?, labels(&["c", "a", "b"]));
        Ok(())
    }

    #[tokio::test]
    async fn test_category_ordering() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_material(&db, "Solder", Some("Tools"), 5.0, 1.0, 0.0).await?;
        create_custom_material(&db, "Hooks", Some("Findings"), 5.0, 1.0, 0.0).await?;
        create_custom_material(&db, "Sheet", Some("Silver"), 5.0, 1.0, 0.0).await?;

        CATEGORIES.set_order(&db, &labels(&["Tools"])).await?;
        assert_eq!(
            CATEGORIES.get_ordered_labels(&db).await?,
            labels(&["Tools", "Findings", "Silver"])
        );

        // The class table is separate
        assert!(CLASSES.get_order(&db).await?.is_empty());
        Ok(())
    }
}
