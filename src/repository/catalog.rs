// Copyright 2023 Remi Bernotavicius

//! The fixed lookup tables: ingredient categories and meal times.

use crate::database;
use crate::database::models::{IngredientCategory, MealTime};
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

pub fn categories(conn: &mut database::Connection) -> QueryResult<Vec<IngredientCategory>> {
    use database::schema::ingredient_categories;

    ingredient_categories::table
        .select(IngredientCategory::as_select())
        .order(ingredient_categories::name.asc())
        .load(conn)
}

/// In creation order, which is the order meal slots are laid out in a day.
pub fn meal_times(conn: &mut database::Connection) -> QueryResult<Vec<MealTime>> {
    use database::schema::meal_times;

    meal_times::table
        .select(MealTime::as_select())
        .order(meal_times::id.asc())
        .load(conn)
}

#[test]
fn seeded_catalog() {
    use maplit::hashset;
    use std::collections::HashSet;

    let mut conn = database::test_connection();

    let names: Vec<_> = meal_times(&mut conn)
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, ["Desayuno", "Comida", "Cena"]);

    let categories = categories(&mut conn).unwrap();
    let names: HashSet<_> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        hashset! {"Proteína", "Verdura", "Fruta", "Cereal", "Lácteo", "Grasa"}
    );
    assert!(categories
        .iter()
        .any(|c| c.name == "Verdura" && c.color == "#22C55E"));
}
