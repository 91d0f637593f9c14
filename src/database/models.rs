// Copyright 2023 Remi Bernotavicius

use derive_more::{Display, From};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel_derive_newtype::DieselNewType;

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct MealTimeId(i32);

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::meal_times)]
pub struct MealTime {
    pub id: MealTimeId,
    pub name: String,
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct IngredientCategoryId(i32);

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::ingredient_categories)]
pub struct IngredientCategory {
    pub id: IngredientCategoryId,
    pub name: String,
    /// Display color, e.g. `#EF4444`.
    pub color: String,
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct IngredientId(i32);

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub category_id: Option<IngredientCategoryId>,
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct RecipeId(i32);

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub meal_time_id: MealTimeId,
    /// Free text, e.g. "20 min".
    pub prep_time: String,
    pub calories: i32,
    /// Relative to the data directory, see [`crate::assets::save_recipe_image`].
    pub image_path: String,
    pub link: Option<String>,
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct PatientId(i32);

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::patients)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct MenuId(i32);

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::menus)]
pub struct Menu {
    pub id: MenuId,
    pub patient_id: PatientId,
    pub name: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct MenuItemId(i32);

/// One row of one meal-slot table of a patient's menu.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::menu_items)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub patient_id: PatientId,
    /// `None` for items of the patient's working menu.
    pub menu_id: Option<MenuId>,
    pub meal_time_id: MealTimeId,
    pub category_id: Option<IngredientCategoryId>,
    pub code: Option<i32>,
    pub quantity: Option<f64>,
    pub name: String,
    pub recipe_title: Option<String>,
}
