// Copyright 2023 Remi Bernotavicius

//! Lookups that let callers refer to rows by name (or color) instead of by id.
//!
//! The `*_or_create` helpers select by the unique name first and insert on a miss. That is only
//! sound with a single writer on the database, which is the only way this application runs.

use super::models::{IngredientCategoryId, IngredientId, MealTimeId};
use super::schema::{ingredient_categories, ingredients, meal_times};
use super::Connection;
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;

pub fn find_meal_time(conn: &mut Connection, name: &str) -> QueryResult<Option<MealTimeId>> {
    meal_times::table
        .filter(meal_times::name.eq(name))
        .select(meal_times::id)
        .first(conn)
        .optional()
}

pub fn meal_time_or_create(conn: &mut Connection, name: &str) -> QueryResult<MealTimeId> {
    if let Some(id) = find_meal_time(conn, name)? {
        return Ok(id);
    }
    log::debug!("creating meal time {name:?}");
    diesel::insert_into(meal_times::table)
        .values(meal_times::name.eq(name))
        .returning(meal_times::id)
        .get_result(conn)
}

pub fn find_ingredient(conn: &mut Connection, name: &str) -> QueryResult<Option<IngredientId>> {
    ingredients::table
        .filter(ingredients::name.eq(name))
        .select(ingredients::id)
        .first(conn)
        .optional()
}

pub fn ingredient_or_create(conn: &mut Connection, name: &str) -> QueryResult<IngredientId> {
    if let Some(id) = find_ingredient(conn, name)? {
        return Ok(id);
    }
    log::debug!("creating ingredient {name:?}");
    diesel::insert_into(ingredients::table)
        .values(ingredients::name.eq(name))
        .returning(ingredients::id)
        .get_result(conn)
}

/// Exact string match against the category colors. No match is not an error.
pub fn find_category_by_color(
    conn: &mut Connection,
    color: &str,
) -> QueryResult<Option<IngredientCategoryId>> {
    ingredient_categories::table
        .filter(ingredient_categories::color.eq(color))
        .order(ingredient_categories::id)
        .select(ingredient_categories::id)
        .first(conn)
        .optional()
}

/// Trims names, drops blank ones and keeps only the first occurrence of each.
pub fn normalize_names<S: AsRef<str>>(names: &[S]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty() && seen.insert(*n))
        .collect()
}

#[test]
fn meal_time_is_reused_or_created() {
    let mut conn = super::test_connection();

    let desayuno = find_meal_time(&mut conn, "Desayuno").unwrap().unwrap();
    assert_eq!(meal_time_or_create(&mut conn, "Desayuno").unwrap(), desayuno);

    assert_eq!(find_meal_time(&mut conn, "Colación").unwrap(), None);
    let colacion = meal_time_or_create(&mut conn, "Colación").unwrap();
    assert_ne!(colacion, desayuno);
    assert_eq!(meal_time_or_create(&mut conn, "Colación").unwrap(), colacion);

    let count: i64 = meal_times::table.count().get_result(&mut conn).unwrap();
    assert_eq!(count, 4);
}

#[test]
fn ingredient_is_reused_or_created() {
    let mut conn = super::test_connection();

    let pollo = find_ingredient(&mut conn, "Pollo").unwrap().unwrap();
    assert_eq!(ingredient_or_create(&mut conn, "Pollo").unwrap(), pollo);

    let nopal = ingredient_or_create(&mut conn, "Nopal").unwrap();
    assert_eq!(find_ingredient(&mut conn, "Nopal").unwrap(), Some(nopal));
    assert_eq!(ingredient_or_create(&mut conn, "Nopal").unwrap(), nopal);
}

#[test]
fn category_color_is_exact_match() {
    let mut conn = super::test_connection();

    assert!(find_category_by_color(&mut conn, "#EF4444")
        .unwrap()
        .is_some());
    assert_eq!(find_category_by_color(&mut conn, "#ef4444").unwrap(), None);
    assert_eq!(find_category_by_color(&mut conn, "#123456").unwrap(), None);
}

#[test]
fn names_are_normalized() {
    assert_eq!(
        normalize_names(&[" Pollo", "Limón", "", "Pollo ", "  "]),
        ["Pollo", "Limón"]
    );
}
