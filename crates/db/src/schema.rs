//! Visibility checks for the externally managed eatery schema.
//!
//! The tables, procedure and function are owned by the database, not by this
//! workspace; these checks only report what is missing.

use crate::DbPool;

pub const REQUIRED_TABLES: &[&str] = &["orders", "order_tracking"];
pub const REQUIRED_ROUTINES: &[&str] = &["insert_order_item", "get_total_order_price"];

const VISIBLE_TABLES_SQL: &str = "SELECT CAST(TABLE_NAME AS CHAR) \
     FROM information_schema.TABLES WHERE TABLE_SCHEMA = DATABASE()";
const VISIBLE_ROUTINES_SQL: &str = "SELECT CAST(ROUTINE_NAME AS CHAR) \
     FROM information_schema.ROUTINES WHERE ROUTINE_SCHEMA = DATABASE()";

/// Required tables and routines that the connected database does not expose,
/// in declaration order. Empty when the schema is complete.
pub async fn missing_schema_objects(pool: &DbPool) -> Result<Vec<&'static str>, sqlx::Error> {
    let tables = sqlx::query_scalar::<_, String>(VISIBLE_TABLES_SQL).fetch_all(pool).await?;
    let routines = sqlx::query_scalar::<_, String>(VISIBLE_ROUTINES_SQL).fetch_all(pool).await?;

    Ok(missing_from(REQUIRED_TABLES, &tables)
        .chain(missing_from(REQUIRED_ROUTINES, &routines))
        .collect())
}

fn missing_from<'a>(
    required: &'static [&'static str],
    visible: &'a [String],
) -> impl Iterator<Item = &'static str> + 'a {
    required
        .iter()
        .copied()
        .filter(move |name| !visible.iter().any(|seen| seen.eq_ignore_ascii_case(name)))
}

#[cfg(test)]
mod tests {
    use super::{missing_from, REQUIRED_ROUTINES, REQUIRED_TABLES};

    #[test]
    fn complete_schema_reports_nothing_missing() {
        let visible = vec!["ORDERS".to_string(), "order_tracking".to_string(), "food_items".into()];
        assert_eq!(missing_from(REQUIRED_TABLES, &visible).count(), 0);
    }

    #[test]
    fn missing_routines_are_listed_in_declaration_order() {
        let visible = vec!["some_other_proc".to_string()];
        let missing: Vec<_> = missing_from(REQUIRED_ROUTINES, &visible).collect();
        assert_eq!(missing, vec!["insert_order_item", "get_total_order_price"]);
    }
}
