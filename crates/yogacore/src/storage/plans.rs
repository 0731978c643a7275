use rusqlite::{Connection, OptionalExtension, Row};

/// Subscription plan offered to users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub plan_id: i64,
    pub title: String,
    /// Free-text duration as entered by the club, e.g. "1 месяц" or "7 дней"
    pub duration: String,
    /// Price in whole currency units
    pub price: i64,
    pub currency: String,
}

fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<Plan> {
    Ok(Plan {
        plan_id: row.get(0)?,
        title: row.get(1)?,
        duration: row.get(2)?,
        price: row.get(3)?,
        currency: row.get(4)?,
    })
}

/// Plans currently on sale, cheapest first.
pub fn list_active_plans(conn: &Connection) -> rusqlite::Result<Vec<Plan>> {
    let mut stmt = conn.prepare(
        "SELECT plan_id, title, duration, price, currency FROM subscription_plans
         WHERE is_active = 1 ORDER BY price ASC, plan_id ASC",
    )?;
    let rows = stmt.query_map([], plan_from_row)?;
    rows.collect()
}

/// Fetches a plan by id, including plans no longer on sale.
pub fn get_plan(conn: &Connection, plan_id: i64) -> rusqlite::Result<Option<Plan>> {
    conn.query_row(
        "SELECT plan_id, title, duration, price, currency FROM subscription_plans WHERE plan_id = ?1",
        [plan_id],
        plan_from_row,
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;

    #[test]
    fn seeded_plans_are_listed_by_price() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        let plans = list_active_plans(&conn).unwrap();
        assert_eq!(plans.len(), 3);
        assert!(plans.windows(2).all(|w| w[0].price <= w[1].price));
    }

    #[test]
    fn inactive_plans_are_hidden_but_still_readable() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute("UPDATE subscription_plans SET is_active = 0 WHERE plan_id = 1", [])
            .unwrap();

        assert!(list_active_plans(&conn).unwrap().iter().all(|p| p.plan_id != 1));
        assert_eq!(get_plan(&conn, 1).unwrap().unwrap().plan_id, 1);
        assert!(get_plan(&conn, 99).unwrap().is_none());
    }
}
