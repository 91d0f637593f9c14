// Copyright 2023 Remi Bernotavicius

//! Patient menus.
//!
//! Every patient has a working menu (items with no menu id) and may have any number of named
//! menus, each with an ordered list of meal slots. The items of a menu are never patched: saving
//! replaces all of them in one transaction.

use crate::database;
use crate::database::models::{
    IngredientCategoryId, MealTime, MealTimeId, Menu, MenuId, MenuItem, PatientId,
};
use crate::database::resolve;
use crate::database::schema::{ingredient_categories, meal_times, menu_items, menu_slots, menus};
use diesel::prelude::OptionalExtension as _;
use diesel::Connection as _;
use diesel::ExpressionMethods as _;
use diesel::Insertable;
use diesel::NullableExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

/// Which set of items an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget {
    /// The patient's working menu.
    Patient(PatientId),
    Menu(MenuId),
}

/// A menu item as entered by the user. The meal time is given by name and the category by its
/// display color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuItemDraft {
    pub meal_time: String,
    pub name: String,
    pub quantity: Option<f64>,
    pub code: Option<i32>,
    pub color: Option<String>,
    pub recipe_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemView {
    pub item: MenuItem,
    pub meal_time: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuDetails {
    pub menu: Menu,
    pub slots: Vec<MealTime>,
    pub items: Vec<MenuItemView>,
}

#[derive(Insertable)]
#[diesel(table_name = menu_items)]
struct NewMenuItem<'a> {
    patient_id: PatientId,
    menu_id: Option<MenuId>,
    meal_time_id: MealTimeId,
    category_id: Option<IngredientCategoryId>,
    code: Option<i32>,
    quantity: Option<f64>,
    name: &'a str,
    recipe_title: Option<&'a str>,
}

/// The patient owning the target's items, and the menu id stored on them.
fn owner(
    conn: &mut database::Connection,
    target: MenuTarget,
) -> QueryResult<(PatientId, Option<MenuId>)> {
    match target {
        MenuTarget::Patient(patient) => Ok((patient, None)),
        MenuTarget::Menu(menu) => {
            let patient = menus::table
                .find(menu)
                .select(menus::patient_id)
                .first(conn)?;
            Ok((patient, Some(menu)))
        }
    }
}

pub(crate) fn load_items(
    conn: &mut database::Connection,
    target: MenuTarget,
) -> QueryResult<Vec<MenuItemView>> {
    let mut query = menu_items::table
        .inner_join(meal_times::table)
        .left_join(ingredient_categories::table)
        .select((
            MenuItem::as_select(),
            meal_times::name,
            ingredient_categories::color.nullable(),
        ))
        .order(menu_items::id.asc())
        .into_boxed();
    query = match target {
        MenuTarget::Patient(patient) => query
            .filter(menu_items::patient_id.eq(patient))
            .filter(menu_items::menu_id.is_null()),
        MenuTarget::Menu(menu) => query.filter(menu_items::menu_id.eq(menu)),
    };
    Ok(query
        .load::<(MenuItem, String, Option<String>)>(conn)?
        .into_iter()
        .map(|(item, meal_time, color)| MenuItemView {
            item,
            meal_time,
            color,
        })
        .collect())
}

fn delete_items(conn: &mut database::Connection, target: MenuTarget) -> QueryResult<usize> {
    match target {
        MenuTarget::Patient(patient) => diesel::delete(
            menu_items::table
                .filter(menu_items::patient_id.eq(patient))
                .filter(menu_items::menu_id.is_null()),
        )
        .execute(conn),
        MenuTarget::Menu(menu) => {
            diesel::delete(menu_items::table.filter(menu_items::menu_id.eq(menu))).execute(conn)
        }
    }
}

/// Creates a named menu for the patient with one slot per meal time, in the given order. Unknown
/// meal times are created.
pub fn create<S: AsRef<str>>(
    conn: &mut database::Connection,
    patient: PatientId,
    name: &str,
    meal_times: &[S],
) -> QueryResult<MenuId> {
    let id = diesel::insert_into(menus::table)
        .values((menus::patient_id.eq(patient), menus::name.eq(name)))
        .returning(menus::id)
        .get_result(conn)?;
    for (position, meal_time) in resolve::normalize_names(meal_times).into_iter().enumerate() {
        let meal_time_id = resolve::meal_time_or_create(conn, meal_time)?;
        diesel::insert_into(menu_slots::table)
            .values((
                menu_slots::menu_id.eq(id),
                menu_slots::meal_time_id.eq(meal_time_id),
                menu_slots::position.eq(position as i32),
            ))
            .execute(conn)?;
    }
    Ok(id)
}

pub fn list_by_patient(
    conn: &mut database::Connection,
    patient: PatientId,
) -> QueryResult<Vec<Menu>> {
    menus::table
        .filter(menus::patient_id.eq(patient))
        .select(Menu::as_select())
        .order((menus::created_at.asc(), menus::id.asc()))
        .load(conn)
}

pub fn get(conn: &mut database::Connection, id: MenuId) -> QueryResult<Option<MenuDetails>> {
    let Some(menu) = menus::table
        .find(id)
        .select(Menu::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };
    let slots = menu_slots::table
        .inner_join(meal_times::table)
        .filter(menu_slots::menu_id.eq(id))
        .order(menu_slots::position.asc())
        .select(MealTime::as_select())
        .load(conn)?;
    let items = load_items(conn, MenuTarget::Menu(id))?;
    Ok(Some(MenuDetails { menu, slots, items }))
}

/// The items of the patient's working menu.
pub fn items_by_patient(
    conn: &mut database::Connection,
    patient: PatientId,
) -> QueryResult<Vec<MenuItemView>> {
    load_items(conn, MenuTarget::Patient(patient))
}

/// Replaces all the items of the target with `items`, atomically.
///
/// Items with a blank name are dropped. Items whose meal time isn't exactly the name of an existing
/// meal time are dropped with a warning. A color that matches no ingredient category leaves the item without
/// a category. Returns how many items were stored.
pub fn save_items(
    conn: &mut database::Connection,
    target: MenuTarget,
    items: &[MenuItemDraft],
) -> QueryResult<usize> {
    conn.transaction(|conn| {
        let (patient_id, menu_id) = owner(conn, target)?;
        delete_items(conn, target)?;

        let mut saved = 0;
        for item in items {
            let name = item.name.trim();
            if name.is_empty() {
                continue;
            }
            let Some(meal_time_id) = resolve::find_meal_time(conn, &item.meal_time)? else {
                log::warn!(
                    "skipping menu item {name:?}: no meal time named {:?}",
                    item.meal_time
                );
                continue;
            };
            let category_id = match item.color.as_deref() {
                Some(color) => {
                    let category = resolve::find_category_by_color(conn, color)?;
                    if category.is_none() {
                        log::warn!("menu item {name:?}: no ingredient category has color {color}");
                    }
                    category
                }
                None => None,
            };

            diesel::insert_into(menu_items::table)
                .values(NewMenuItem {
                    patient_id,
                    menu_id,
                    meal_time_id,
                    category_id,
                    code: item.code,
                    quantity: item.quantity,
                    name,
                    recipe_title: item
                        .recipe_title
                        .as_deref()
                        .map(str::trim)
                        .filter(|t| !t.is_empty()),
                })
                .execute(conn)?;
            saved += 1;
        }
        log::info!("saved {saved} menu items for patient {patient_id}");
        Ok(saved)
    })
}

/// Removes the named menu, its slots and its items.
pub fn delete(conn: &mut database::Connection, id: MenuId) -> QueryResult<bool> {
    Ok(diesel::delete(menus::table.find(id)).execute(conn)? > 0)
}

/// Removes every menu and menu item of the patient. Returns the number of items removed.
pub fn delete_by_patient(conn: &mut database::Connection, patient: PatientId) -> QueryResult<usize> {
    let removed = diesel::delete(menu_items::table.filter(menu_items::patient_id.eq(patient)))
        .execute(conn)?;
    diesel::delete(menus::table.filter(menus::patient_id.eq(patient))).execute(conn)?;
    Ok(removed)
}

#[cfg(test)]
fn item(meal_time: &str, name: &str) -> MenuItemDraft {
    MenuItemDraft {
        meal_time: meal_time.into(),
        name: name.into(),
        ..Default::default()
    }
}

#[cfg(test)]
fn item_names(items: &[MenuItemView]) -> Vec<&str> {
    items.iter().map(|i| i.item.name.as_str()).collect()
}

#[test]
fn save_then_read_back() {
    let mut conn = database::test_connection();
    let patient = super::patients::create(&mut conn, "Ana", &[]).unwrap();

    let saved = save_items(
        &mut conn,
        MenuTarget::Patient(patient),
        &[MenuItemDraft {
            meal_time: "Desayuno".into(),
            name: "Huevo".into(),
            quantity: Some(2.0),
            code: Some(30),
            color: Some("#EF4444".into()),
            recipe_title: None,
        }],
    )
    .unwrap();
    assert_eq!(saved, 1);

    let items = items_by_patient(&mut conn, patient).unwrap();
    assert_eq!(items.len(), 1);
    let huevo = &items[0];
    assert_eq!(huevo.meal_time, "Desayuno");
    assert_eq!(huevo.item.quantity, Some(2.0));
    assert_eq!(huevo.item.code, Some(30));
    assert_eq!(huevo.color.as_deref(), Some("#EF4444"));
    assert_eq!(
        huevo.item.category_id,
        resolve::find_category_by_color(&mut conn, "#EF4444").unwrap()
    );
    assert_eq!(huevo.item.menu_id, None);
}

#[test]
fn tolerant_of_bad_entries() {
    let mut conn = database::test_connection();
    let patient = super::patients::create(&mut conn, "Ana", &[]).unwrap();

    let saved = save_items(
        &mut conn,
        MenuTarget::Patient(patient),
        &[
            item("Desayuno", "Avena"),
            item("Desayuno", "   "),
            item("Merienda", "Galletas"),
            item(" Cena", "Pan"),
            item("desayuno", "Fruta"),
            MenuItemDraft {
                color: Some("#000000".into()),
                recipe_title: Some("Pollo con arroz".into()),
                ..item("Comida", "Pollo")
            },
        ],
    )
    .unwrap();
    assert_eq!(saved, 2);

    let items = items_by_patient(&mut conn, patient).unwrap();
    assert_eq!(item_names(&items), ["Avena", "Pollo"]);
    assert_eq!(items[1].item.category_id, None);
    assert_eq!(items[1].color, None);
    assert_eq!(
        items[1].item.recipe_title.as_deref(),
        Some("Pollo con arroz")
    );
    assert_eq!(resolve::find_meal_time(&mut conn, "Merienda").unwrap(), None);
}

#[test]
fn save_replaces_previous_items() {
    let mut conn = database::test_connection();
    let patient = super::patients::create(&mut conn, "Ana", &[]).unwrap();
    let other = super::patients::create(&mut conn, "Beto", &[]).unwrap();
    let target = MenuTarget::Patient(patient);

    save_items(&mut conn, target, &[item("Desayuno", "Avena"), item("Cena", "Pan")]).unwrap();
    save_items(&mut conn, MenuTarget::Patient(other), &[item("Comida", "Sopa")]).unwrap();
    save_items(&mut conn, target, &[item("Comida", "Arroz")]).unwrap();

    assert_eq!(
        item_names(&items_by_patient(&mut conn, patient).unwrap()),
        ["Arroz"]
    );
    assert_eq!(
        item_names(&items_by_patient(&mut conn, other).unwrap()),
        ["Sopa"]
    );

    save_items(&mut conn, target, &[]).unwrap();
    assert!(items_by_patient(&mut conn, patient).unwrap().is_empty());
}

#[test]
fn failed_save_rolls_back() {
    use diesel::connection::SimpleConnection as _;

    let mut conn = database::test_connection();
    let patient = super::patients::create(&mut conn, "Ana", &[]).unwrap();
    let target = MenuTarget::Patient(patient);
    save_items(&mut conn, target, &[item("Desayuno", "Avena"), item("Cena", "Pan")]).unwrap();

    conn.batch_execute(
        "CREATE TRIGGER fail_menu_item BEFORE INSERT ON MenuPaciente \
         WHEN NEW.Nombre = 'boom' \
         BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
    )
    .unwrap();

    save_items(&mut conn, target, &[item("Comida", "Arroz"), item("Comida", "boom")])
        .unwrap_err();

    assert_eq!(
        item_names(&items_by_patient(&mut conn, patient).unwrap()),
        ["Avena", "Pan"]
    );
}

#[test]
fn save_for_unknown_patient_fails() {
    use diesel::result::{DatabaseErrorKind, Error};

    let mut conn = database::test_connection();
    let err = save_items(
        &mut conn,
        MenuTarget::Patient(PatientId::from(4242)),
        &[item("Desayuno", "Avena")],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    ));
}

#[test]
fn named_menus() {
    let mut conn = database::test_connection();
    let patient = super::patients::create(&mut conn, "Ana", &[]).unwrap();
    save_items(
        &mut conn,
        MenuTarget::Patient(patient),
        &[item("Desayuno", "Avena")],
    )
    .unwrap();

    let first = create(
        &mut conn,
        patient,
        "Semana 1",
        &["Desayuno", "Colación", "Comida", "Desayuno"],
    )
    .unwrap();
    let second = create(&mut conn, patient, "Semana 2", &["Cena"]).unwrap();

    let names: Vec<_> = list_by_patient(&mut conn, patient)
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, ["Semana 1", "Semana 2"]);

    save_items(
        &mut conn,
        MenuTarget::Menu(first),
        &[item("Colación", "Manzana"), item("Comida", "Sopa")],
    )
    .unwrap();

    let details = get(&mut conn, first).unwrap().unwrap();
    assert_eq!(details.menu.name, "Semana 1");
    assert_eq!(details.menu.patient_id, patient);
    let slots: Vec<_> = details.slots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(slots, ["Desayuno", "Colación", "Comida"]);
    assert_eq!(item_names(&details.items), ["Manzana", "Sopa"]);
    assert!(details.items.iter().all(|i| i.item.menu_id == Some(first)));

    assert!(get(&mut conn, second).unwrap().unwrap().items.is_empty());
    assert_eq!(
        item_names(&items_by_patient(&mut conn, patient).unwrap()),
        ["Avena"]
    );

    assert!(delete(&mut conn, first).unwrap());
    assert_eq!(get(&mut conn, first).unwrap(), None);
    assert_eq!(
        item_names(&items_by_patient(&mut conn, patient).unwrap()),
        ["Avena"]
    );
}

#[test]
fn save_for_unknown_menu_fails() {
    let mut conn = database::test_connection();
    let err = save_items(
        &mut conn,
        MenuTarget::Menu(MenuId::from(77)),
        &[item("Desayuno", "Avena")],
    )
    .unwrap_err();
    assert!(matches!(err, diesel::result::Error::NotFound));
}

#[test]
fn delete_everything_for_patient() {
    let mut conn = database::test_connection();
    let patient = super::patients::create(&mut conn, "Ana", &[]).unwrap();
    let menu = create(&mut conn, patient, "Semana 1", &["Desayuno"]).unwrap();
    save_items(&mut conn, MenuTarget::Menu(menu), &[item("Desayuno", "Pan")]).unwrap();
    save_items(
        &mut conn,
        MenuTarget::Patient(patient),
        &[item("Desayuno", "Avena"), item("Cena", "Té")],
    )
    .unwrap();

    assert_eq!(delete_by_patient(&mut conn, patient).unwrap(), 3);
    assert!(list_by_patient(&mut conn, patient).unwrap().is_empty());
    assert!(items_by_patient(&mut conn, patient).unwrap().is_empty());
    assert!(super::patients::get(&mut conn, patient).unwrap().is_some());
}
