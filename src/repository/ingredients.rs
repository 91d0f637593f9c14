// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{Ingredient, IngredientCategory, IngredientCategoryId, IngredientId};
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientListing {
    pub ingredient: Ingredient,
    pub category: Option<IngredientCategory>,
}

pub fn list(conn: &mut database::Connection) -> QueryResult<Vec<IngredientListing>> {
    use database::schema::{ingredient_categories, ingredients};

    Ok(ingredients::table
        .left_join(ingredient_categories::table)
        .select((
            Ingredient::as_select(),
            Option::<IngredientCategory>::as_select(),
        ))
        .order(ingredients::name.asc())
        .load::<(Ingredient, Option<IngredientCategory>)>(conn)?
        .into_iter()
        .map(|(ingredient, category)| IngredientListing {
            ingredient,
            category,
        })
        .collect())
}

pub fn get(conn: &mut database::Connection, get_id: IngredientId) -> QueryResult<Option<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .find(get_id)
        .select(Ingredient::as_select())
        .first(conn)
        .optional()
}

pub fn create(
    conn: &mut database::Connection,
    new_name: &str,
    new_category: Option<IngredientCategoryId>,
) -> QueryResult<IngredientId> {
    use database::schema::ingredients::dsl::*;
    use diesel::insert_into;

    insert_into(ingredients)
        .values((name.eq(new_name), category_id.eq(new_category)))
        .returning(id)
        .get_result(conn)
}

pub fn update(
    conn: &mut database::Connection,
    edit_id: IngredientId,
    edit_name: &str,
    edit_category: Option<IngredientCategoryId>,
) -> QueryResult<bool> {
    use database::schema::ingredients::dsl::*;
    use diesel::update;

    let updated = update(ingredients.find(edit_id))
        .set((name.eq(edit_name), category_id.eq(edit_category)))
        .execute(conn)?;
    Ok(updated > 0)
}

/// Also drops the ingredient from every recipe and every patient's avoid list.
pub fn delete(conn: &mut database::Connection, delete_id: IngredientId) -> QueryResult<bool> {
    use database::schema::ingredients::dsl::*;
    use diesel::delete;

    Ok(delete(ingredients.find(delete_id)).execute(conn)? > 0)
}

#[cfg(test)]
fn category_named(conn: &mut database::Connection, category_name: &str) -> IngredientCategoryId {
    use database::schema::ingredient_categories::dsl::*;

    ingredient_categories
        .filter(name.eq(category_name))
        .select(id)
        .first(conn)
        .unwrap()
}

#[test]
fn create_update_delete() {
    let mut conn = database::test_connection();
    let verdura = category_named(&mut conn, "Verdura");

    let id = create(&mut conn, "Nopal", Some(verdura)).unwrap();
    let nopal = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(nopal.name, "Nopal");
    assert_eq!(nopal.category_id, Some(verdura));

    assert!(update(&mut conn, id, "Nopales", None).unwrap());
    let nopal = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(nopal.name, "Nopales");
    assert_eq!(nopal.category_id, None);

    assert!(delete(&mut conn, id).unwrap());
    assert_eq!(get(&mut conn, id).unwrap(), None);
    assert!(!delete(&mut conn, id).unwrap());
    assert!(!update(&mut conn, id, "Nopal", None).unwrap());
}

#[test]
fn duplicate_name_is_rejected() {
    use diesel::result::{DatabaseErrorKind, Error};

    let mut conn = database::test_connection();
    let err = create(&mut conn, "Pollo", None).unwrap_err();
    assert!(matches!(
        err,
        Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    ));
}

#[test]
fn list_is_sorted_and_joined_with_category() {
    let mut conn = database::test_connection();
    create(&mut conn, "Amaranto", None).unwrap();

    let listing = list(&mut conn).unwrap();
    let names: Vec<_> = listing.iter().map(|l| l.ingredient.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    assert_eq!(names[0], "Aguacate");
    let amaranto = &listing[1];
    assert_eq!(amaranto.ingredient.name, "Amaranto");
    assert_eq!(amaranto.category, None);

    let huevo = listing
        .iter()
        .find(|l| l.ingredient.name == "Huevo")
        .unwrap();
    let category = huevo.category.as_ref().unwrap();
    assert_eq!(category.name, "Proteína");
    assert_eq!(category.color, "#EF4444");
}

#[test]
fn delete_removes_memberships() {
    use database::schema::{patient_avoid_ingredients, recipe_ingredients};

    let mut conn = database::test_connection();
    let tortilla = database::resolve::find_ingredient(&mut conn, "Tortilla")
        .unwrap()
        .unwrap();
    let patient = super::patients::create(&mut conn, "Ana", &[tortilla]).unwrap();

    assert!(delete(&mut conn, tortilla).unwrap());

    let usages: i64 = recipe_ingredients::table
        .filter(recipe_ingredients::ingredient_id.eq(tortilla))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(usages, 0);
    let avoided: i64 = patient_avoid_ingredients::table
        .filter(patient_avoid_ingredients::patient_id.eq(patient))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(avoided, 0);
}
