// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{Ingredient, IngredientId, Patient, PatientId};
use crate::database::schema::{ingredients, patient_avoid_ingredients, patients};
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

#[derive(Debug, Clone, PartialEq)]
pub struct PatientDetails {
    pub patient: Patient,
    pub avoid: Vec<Ingredient>,
}

fn insert_avoid_list(
    conn: &mut database::Connection,
    patient: PatientId,
    avoid: &[IngredientId],
) -> QueryResult<()> {
    let mut seen = std::collections::HashSet::new();
    for &ingredient in avoid.iter().filter(|i| seen.insert(**i)) {
        diesel::insert_into(patient_avoid_ingredients::table)
            .values((
                patient_avoid_ingredients::patient_id.eq(patient),
                patient_avoid_ingredients::ingredient_id.eq(ingredient),
            ))
            .execute(conn)?;
    }
    Ok(())
}

pub fn list(conn: &mut database::Connection) -> QueryResult<Vec<Patient>> {
    patients::table
        .select(Patient::as_select())
        .order((patients::name.asc(), patients::id.asc()))
        .load(conn)
}

pub fn get(conn: &mut database::Connection, id: PatientId) -> QueryResult<Option<PatientDetails>> {
    let Some(patient) = patients::table
        .find(id)
        .select(Patient::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };
    let avoid = patient_avoid_ingredients::table
        .inner_join(ingredients::table)
        .filter(patient_avoid_ingredients::patient_id.eq(id))
        .order(patient_avoid_ingredients::id.asc())
        .select(Ingredient::as_select())
        .load(conn)?;
    Ok(Some(PatientDetails { patient, avoid }))
}

pub fn create(
    conn: &mut database::Connection,
    name: &str,
    avoid: &[IngredientId],
) -> QueryResult<PatientId> {
    let id = diesel::insert_into(patients::table)
        .values(patients::name.eq(name))
        .returning(patients::id)
        .get_result(conn)?;
    insert_avoid_list(conn, id, avoid)?;
    log::debug!("created patient {id} {name:?}");
    Ok(id)
}

/// Renames the patient and, when `avoid` is given, replaces the whole avoid list with it. Returns
/// `false` if there is no such patient.
pub fn update(
    conn: &mut database::Connection,
    id: PatientId,
    name: &str,
    avoid: Option<&[IngredientId]>,
) -> QueryResult<bool> {
    let updated = diesel::update(patients::table.find(id))
        .set(patients::name.eq(name))
        .execute(conn)?;
    if updated == 0 {
        return Ok(false);
    }
    if let Some(avoid) = avoid {
        diesel::delete(
            patient_avoid_ingredients::table.filter(patient_avoid_ingredients::patient_id.eq(id)),
        )
        .execute(conn)?;
        insert_avoid_list(conn, id, avoid)?;
    }
    Ok(true)
}

/// Cascades to the patient's avoid list, menus and menu items.
pub fn delete(conn: &mut database::Connection, id: PatientId) -> QueryResult<bool> {
    Ok(diesel::delete(patients::table.find(id)).execute(conn)? > 0)
}

#[cfg(test)]
fn ingredient(conn: &mut database::Connection, name: &str) -> IngredientId {
    database::resolve::find_ingredient(conn, name)
        .unwrap()
        .unwrap()
}

#[test]
fn create_update_get() {
    let mut conn = database::test_connection();
    let huevo = ingredient(&mut conn, "Huevo");
    let leche = ingredient(&mut conn, "Leche");
    let fresa = ingredient(&mut conn, "Fresa");

    let id = create(&mut conn, "Ana López", &[huevo, leche, huevo]).unwrap();
    let ana = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(ana.patient.name, "Ana López");
    let avoid: Vec<_> = ana.avoid.iter().map(|i| i.id).collect();
    assert_eq!(avoid, [huevo, leche]);

    assert!(update(&mut conn, id, "Ana L.", None).unwrap());
    let ana = get(&mut conn, id).unwrap().unwrap();
    assert_eq!(ana.patient.name, "Ana L.");
    assert_eq!(ana.avoid.len(), 2);

    assert!(update(&mut conn, id, "Ana L.", Some(&[fresa][..])).unwrap());
    let ana = get(&mut conn, id).unwrap().unwrap();
    let avoid: Vec<_> = ana.avoid.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(avoid, ["Fresa"]);

    assert!(update(&mut conn, id, "Ana L.", Some(&[][..])).unwrap());
    assert!(get(&mut conn, id).unwrap().unwrap().avoid.is_empty());
}

#[test]
fn list_is_sorted_by_name() {
    let mut conn = database::test_connection();
    create(&mut conn, "Mario", &[]).unwrap();
    create(&mut conn, "Beatriz", &[]).unwrap();
    create(&mut conn, "Carlos", &[]).unwrap();

    let names: Vec<_> = list(&mut conn)
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["Beatriz", "Carlos", "Mario"]);
}

#[test]
fn missing_patient() {
    let mut conn = database::test_connection();
    let id = create(&mut conn, "Temporal", &[]).unwrap();
    assert!(delete(&mut conn, id).unwrap());

    assert_eq!(get(&mut conn, id).unwrap(), None);
    assert!(!update(&mut conn, id, "Otro", Some(&[][..])).unwrap());
    assert!(!delete(&mut conn, id).unwrap());
}

#[test]
fn unknown_avoid_ingredient_is_rejected() {
    use diesel::result::{DatabaseErrorKind, Error};

    let mut conn = database::test_connection();
    let err = create(&mut conn, "Ana", &[IngredientId::from(9999)]).unwrap_err();
    assert!(matches!(
        err,
        Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    ));
}

#[test]
fn delete_cascades_but_keeps_catalog() {
    use super::menus::{self, MenuItemDraft, MenuTarget};
    use crate::database::schema::{menu_items, recipes};

    let mut conn = database::test_connection();
    let huevo = ingredient(&mut conn, "Huevo");
    let id = create(&mut conn, "Ana", &[huevo]).unwrap();
    menus::save_items(
        &mut conn,
        MenuTarget::Patient(id),
        &[MenuItemDraft {
            meal_time: "Desayuno".into(),
            name: "Huevo".into(),
            quantity: Some(2.0),
            ..Default::default()
        }],
    )
    .unwrap();
    let menu = menus::create(&mut conn, id, "Semana 1", &["Desayuno", "Comida"]).unwrap();

    let recipes_before: i64 = recipes::table.count().get_result(&mut conn).unwrap();
    let ingredients_before: i64 = ingredients::table.count().get_result(&mut conn).unwrap();

    assert!(delete(&mut conn, id).unwrap());

    let items: i64 = menu_items::table
        .filter(menu_items::patient_id.eq(id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(items, 0);
    let avoided: i64 = patient_avoid_ingredients::table
        .filter(patient_avoid_ingredients::patient_id.eq(id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(avoided, 0);
    assert_eq!(menus::get(&mut conn, menu).unwrap(), None);

    let recipes_after: i64 = recipes::table.count().get_result(&mut conn).unwrap();
    let ingredients_after: i64 = ingredients::table.count().get_result(&mut conn).unwrap();
    assert_eq!(recipes_after, recipes_before);
    assert_eq!(ingredients_after, ingredients_before);
}
