// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{Ingredient, MealTimeId, Recipe, RecipeId};
use crate::database::resolve;
use crate::database::schema::{ingredients, meal_times, recipe_ingredients, recipes};
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use diesel::{AsChangeset, Insertable};
use std::collections::HashMap;

/// A recipe together with the name of its meal time and its ingredients, in the order they were
/// added.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDetails {
    pub recipe: Recipe,
    pub meal_time: String,
    pub ingredients: Vec<Ingredient>,
}

/// Everything needed to create a recipe. The meal time and the ingredients are given by name and
/// are created if they don't exist yet.
#[derive(Debug, Clone, Default)]
pub struct RecipeDraft {
    pub name: String,
    pub meal_time: String,
    pub prep_time: String,
    pub calories: i32,
    pub image_path: String,
    pub link: Option<String>,
    pub ingredients: Vec<String>,
}

/// A partial update. Fields left as `None` are not touched.
///
/// `link: Some(None)` clears the link. When `ingredients` is present the whole ingredient list is
/// replaced by it.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub meal_time: Option<String>,
    pub prep_time: Option<String>,
    pub calories: Option<i32>,
    pub image_path: Option<String>,
    pub link: Option<Option<String>>,
    pub ingredients: Option<Vec<String>>,
}

#[derive(Insertable)]
#[diesel(table_name = recipes)]
struct NewRecipe<'a> {
    name: &'a str,
    meal_time_id: MealTimeId,
    prep_time: &'a str,
    calories: i32,
    image_path: &'a str,
    link: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = recipes)]
struct RecipeChangeset<'a> {
    name: Option<&'a str>,
    meal_time_id: Option<MealTimeId>,
    prep_time: Option<&'a str>,
    calories: Option<i32>,
    image_path: Option<&'a str>,
    link: Option<Option<&'a str>>,
}

impl RecipeChangeset<'_> {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.meal_time_id.is_none()
            && self.prep_time.is_none()
            && self.calories.is_none()
            && self.image_path.is_none()
            && self.link.is_none()
    }
}

fn ingredients_of(conn: &mut database::Connection, recipe: RecipeId) -> QueryResult<Vec<Ingredient>> {
    recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(recipe))
        .order(recipe_ingredients::id.asc())
        .select(Ingredient::as_select())
        .load(conn)
}

fn insert_ingredients<S: AsRef<str>>(
    conn: &mut database::Connection,
    recipe: RecipeId,
    names: &[S],
) -> QueryResult<()> {
    for name in resolve::normalize_names(names) {
        let ingredient = resolve::ingredient_or_create(conn, name)?;
        diesel::insert_into(recipe_ingredients::table)
            .values((
                recipe_ingredients::recipe_id.eq(recipe),
                recipe_ingredients::ingredient_id.eq(ingredient),
            ))
            .execute(conn)?;
    }
    Ok(())
}

/// Not atomic: a failure part way through leaves the recipe with a partial ingredient list.
fn replace_ingredients<S: AsRef<str>>(
    conn: &mut database::Connection,
    recipe: RecipeId,
    names: &[S],
) -> QueryResult<()> {
    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe)))
        .execute(conn)?;
    insert_ingredients(conn, recipe, names)
}

pub fn list(conn: &mut database::Connection) -> QueryResult<Vec<RecipeDetails>> {
    let mut memberships: HashMap<RecipeId, Vec<Ingredient>> = HashMap::new();
    let rows = recipe_ingredients::table
        .inner_join(ingredients::table)
        .order(recipe_ingredients::id.asc())
        .select((recipe_ingredients::recipe_id, Ingredient::as_select()))
        .load::<(RecipeId, Ingredient)>(conn)?;
    for (recipe_id, ingredient) in rows {
        memberships.entry(recipe_id).or_default().push(ingredient);
    }

    Ok(recipes::table
        .inner_join(meal_times::table)
        .select((Recipe::as_select(), meal_times::name))
        .order((recipes::name.asc(), recipes::id.asc()))
        .load::<(Recipe, String)>(conn)?
        .into_iter()
        .map(|(recipe, meal_time)| RecipeDetails {
            ingredients: memberships.remove(&recipe.id).unwrap_or_default(),
            recipe,
            meal_time,
        })
        .collect())
}

pub fn get(conn: &mut database::Connection, id: RecipeId) -> QueryResult<Option<RecipeDetails>> {
    let Some((recipe, meal_time)) = recipes::table
        .inner_join(meal_times::table)
        .filter(recipes::id.eq(id))
        .select((Recipe::as_select(), meal_times::name))
        .first::<(Recipe, String)>(conn)
        .optional()?
    else {
        return Ok(None);
    };
    let ingredients = ingredients_of(conn, recipe.id)?;
    Ok(Some(RecipeDetails {
        recipe,
        meal_time,
        ingredients,
    }))
}

/// Fails without touching the database when the meal time is blank.
pub fn create(conn: &mut database::Connection, draft: &RecipeDraft) -> QueryResult<RecipeId> {
    let meal_time = draft.meal_time.trim();
    if meal_time.is_empty() {
        return Err(diesel::result::Error::QueryBuilderError(
            format!("recipe {:?} has no meal time", draft.name).into(),
        ));
    }
    let meal_time_id = resolve::meal_time_or_create(conn, meal_time)?;
    let id = diesel::insert_into(recipes::table)
        .values(NewRecipe {
            name: &draft.name,
            meal_time_id,
            prep_time: &draft.prep_time,
            calories: draft.calories,
            image_path: &draft.image_path,
            link: draft.link.as_deref(),
        })
        .returning(recipes::id)
        .get_result(conn)?;
    insert_ingredients(conn, id, &draft.ingredients)?;
    log::debug!("created recipe {id} {:?}", draft.name);
    Ok(id)
}

/// Returns `false` if there is no recipe with the given id. A blank meal time leaves the current one.
pub fn update(
    conn: &mut database::Connection,
    id: RecipeId,
    changes: &RecipeChanges,
) -> QueryResult<bool> {
    let meal_time_id = changes
        .meal_time
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| resolve::meal_time_or_create(conn, name))
        .transpose()?;
    let changeset = RecipeChangeset {
        name: changes.name.as_deref(),
        meal_time_id,
        prep_time: changes.prep_time.as_deref(),
        calories: changes.calories,
        image_path: changes.image_path.as_deref(),
        link: changes.link.as_ref().map(|l| l.as_deref()),
    };

    let found = if changeset.is_empty() {
        diesel::select(diesel::dsl::exists(recipes::table.find(id))).get_result(conn)?
    } else {
        diesel::update(recipes::table.find(id))
            .set(&changeset)
            .execute(conn)?
            > 0
    };
    if !found {
        return Ok(false);
    }

    if let Some(names) = &changes.ingredients {
        replace_ingredients(conn, id, names)?;
    }
    Ok(true)
}

/// Also drops the recipe's ingredient memberships. The ingredients themselves stay.
pub fn delete(conn: &mut database::Connection, id: RecipeId) -> QueryResult<bool> {
    Ok(diesel::delete(recipes::table.find(id)).execute(conn)? > 0)
}

#[cfg(test)]
fn ingredient_names(details: &RecipeDetails) -> Vec<&str> {
    details
        .ingredients
        .iter()
        .map(|i| i.name.as_str())
        .collect()
}

#[cfg(test)]
fn count_meal_times_named(conn: &mut database::Connection, name: &str) -> i64 {
    meal_times::table
        .filter(meal_times::name.eq(name))
        .count()
        .get_result(conn)
        .unwrap()
}

#[test]
fn create_then_get() {
    let mut conn = database::test_connection();
    assert_eq!(count_meal_times_named(&mut conn, "Comida"), 1);

    let id = create(
        &mut conn,
        &RecipeDraft {
            name: "Tacos".into(),
            meal_time: "Comida".into(),
            prep_time: "20 min".into(),
            calories: 450,
            image_path: "assets/recipes/tacos.png".into(),
            link: Some("https://example.com/tacos".into()),
            ingredients: vec!["Pollo".into(), "Limón".into()],
        },
    )
    .unwrap();

    let tacos = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(tacos.recipe.name, "Tacos");
    assert_eq!(tacos.meal_time, "Comida");
    assert_eq!(tacos.recipe.prep_time, "20 min");
    assert_eq!(tacos.recipe.calories, 450);
    assert_eq!(tacos.recipe.image_path, "assets/recipes/tacos.png");
    assert_eq!(
        tacos.recipe.link.as_deref(),
        Some("https://example.com/tacos")
    );
    assert_eq!(ingredient_names(&tacos), ["Pollo", "Limón"]);
    assert_eq!(count_meal_times_named(&mut conn, "Comida"), 1);
}

#[test]
fn unknown_names_are_created_once() {
    let mut conn = database::test_connection();
    let count_ingredients = |conn: &mut database::Connection| -> i64 {
        ingredients::table.count().get_result(conn).unwrap()
    };
    let before = count_ingredients(&mut conn);

    let id = create(
        &mut conn,
        &RecipeDraft {
            name: "Pudín de chía".into(),
            meal_time: "Colación".into(),
            ingredients: vec!["Chía".into(), "Leche".into(), " Chía ".into(), "".into()],
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(count_meal_times_named(&mut conn, "Colación"), 1);
    assert_eq!(count_ingredients(&mut conn), before + 1);

    let pudin = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(pudin.meal_time, "Colación");
    assert_eq!(ingredient_names(&pudin), ["Chía", "Leche"]);

    create(
        &mut conn,
        &RecipeDraft {
            name: "Agua de chía".into(),
            meal_time: "Colación".into(),
            ingredients: vec!["Chía".into(), "Limón".into()],
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(count_meal_times_named(&mut conn, "Colación"), 1);
    assert_eq!(count_ingredients(&mut conn), before + 1);
}

#[test]
fn partial_update() {
    let mut conn = database::test_connection();
    let id = create(
        &mut conn,
        &RecipeDraft {
            name: "Tacos".into(),
            meal_time: "Comida".into(),
            prep_time: "20 min".into(),
            calories: 450,
            link: Some("https://example.com/tacos".into()),
            ingredients: vec!["Pollo".into(), "Limón".into()],
            ..Default::default()
        },
    )
    .unwrap();

    let changes = RecipeChanges {
        calories: Some(400),
        ..Default::default()
    };
    assert!(update(&mut conn, id, &changes).unwrap());
    let tacos = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(tacos.recipe.calories, 400);
    assert_eq!(tacos.recipe.name, "Tacos");
    assert_eq!(tacos.recipe.prep_time, "20 min");
    assert_eq!(tacos.meal_time, "Comida");
    assert_eq!(
        tacos.recipe.link.as_deref(),
        Some("https://example.com/tacos")
    );
    assert_eq!(ingredient_names(&tacos), ["Pollo", "Limón"]);

    let changes = RecipeChanges {
        meal_time: Some("Cena".into()),
        link: Some(None),
        ingredients: Some(vec!["Tortilla".into(), "Pollo".into(), "Aguacate".into()]),
        ..Default::default()
    };
    assert!(update(&mut conn, id, &changes).unwrap());
    let tacos = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(tacos.meal_time, "Cena");
    assert_eq!(tacos.recipe.link, None);
    assert_eq!(tacos.recipe.calories, 400);
    assert_eq!(ingredient_names(&tacos), ["Tortilla", "Pollo", "Aguacate"]);
}

#[test]
fn blank_meal_time() {
    let mut conn = database::test_connection();
    let count_all_meal_times = |conn: &mut database::Connection| -> i64 {
        meal_times::table.count().get_result(conn).unwrap()
    };
    let before = count_all_meal_times(&mut conn);

    let err = create(
        &mut conn,
        &RecipeDraft {
            name: "Sopa".into(),
            meal_time: "   ".into(),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, diesel::result::Error::QueryBuilderError(_)));
    assert_eq!(count_all_meal_times(&mut conn), before);
    assert!(list(&mut conn).unwrap().iter().all(|d| d.recipe.name != "Sopa"));

    let id = create(
        &mut conn,
        &RecipeDraft {
            name: "Sopa".into(),
            meal_time: "Comida".into(),
            ..Default::default()
        },
    )
    .unwrap();
    let changes = RecipeChanges {
        meal_time: Some(" ".into()),
        calories: Some(120),
        ..Default::default()
    };
    assert!(update(&mut conn, id, &changes).unwrap());
    let sopa = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(sopa.meal_time, "Comida");
    assert_eq!(sopa.recipe.calories, 120);
    assert_eq!(count_all_meal_times(&mut conn), before);

    let changes = RecipeChanges {
        meal_time: Some("".into()),
        ..Default::default()
    };
    assert!(update(&mut conn, id, &changes).unwrap());
    assert_eq!(count_all_meal_times(&mut conn), before);
}

#[test]
fn update_creates_new_meal_time() {
    let mut conn = database::test_connection();
    let id = create(
        &mut conn,
        &RecipeDraft {
            name: "Yogur con fresa".into(),
            meal_time: "Desayuno".into(),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(count_meal_times_named(&mut conn, "Merienda"), 0);

    let changes = RecipeChanges {
        meal_time: Some(" Merienda ".into()),
        ..Default::default()
    };
    assert!(update(&mut conn, id, &changes).unwrap());
    assert_eq!(get(&mut conn, id).unwrap().unwrap().meal_time, "Merienda");
    assert_eq!(count_meal_times_named(&mut conn, "Merienda"), 1);
}

#[test]
fn update_missing_recipe() {
    let mut conn = database::test_connection();
    let id = create(
        &mut conn,
        &RecipeDraft {
            name: "Sopa".into(),
            meal_time: "Comida".into(),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(delete(&mut conn, id).unwrap());

    let changes = RecipeChanges {
        name: Some("Caldo".into()),
        ..Default::default()
    };
    assert!(!update(&mut conn, id, &changes).unwrap());
    let changes = RecipeChanges {
        ingredients: Some(vec!["Pollo".into()]),
        ..Default::default()
    };
    assert!(!update(&mut conn, id, &changes).unwrap());
    assert_eq!(get(&mut conn, id).unwrap(), None);
}

#[test]
fn delete_keeps_ingredients() {
    let mut conn = database::test_connection();
    let details = list(&mut conn).unwrap();
    let pollo_con_arroz = details
        .iter()
        .find(|d| d.recipe.name == "Pollo con arroz")
        .unwrap();
    let id = pollo_con_arroz.recipe.id;

    assert!(delete(&mut conn, id).unwrap());
    assert_eq!(get(&mut conn, id).unwrap(), None);

    let usages: i64 = recipe_ingredients::table
        .filter(recipe_ingredients::recipe_id.eq(id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(usages, 0);
    assert!(resolve::find_ingredient(&mut conn, "Arroz")
        .unwrap()
        .is_some());
}

#[test]
fn list_is_sorted_and_hydrated() {
    let mut conn = database::test_connection();
    let recipes = list(&mut conn).unwrap();

    let names: Vec<_> = recipes.iter().map(|r| r.recipe.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "Avena con plátano",
            "Ensalada de espinaca",
            "Huevos a la mexicana",
            "Pollo con arroz",
            "Tacos de frijol",
        ]
    );
    assert_eq!(recipes[0].meal_time, "Desayuno");
    assert_eq!(ingredient_names(&recipes[0]), ["Avena", "Leche", "Plátano"]);
    assert_eq!(
        ingredient_names(&recipes[2]),
        ["Huevo", "Jitomate", "Cebolla", "Tortilla"]
    );
}
