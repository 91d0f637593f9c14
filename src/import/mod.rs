// Copyright 2023 Remi Bernotavicius

//! Importing a menu from a tab-separated sheet, one item per line:
//!
//! ```text
//! meal time <TAB> name <TAB> quantity <TAB> code <TAB> color <TAB> recipe title
//! ```
//!
//! Only the first two columns are required. Blank lines and lines starting with `#` are ignored.

use crate::database;
use crate::repository::menus::{self, MenuItemDraft, MenuTarget};
use crate::Result;
use std::path::Path;

/// Accepts both `1.5` and `1,5`. Anything unparsable is no quantity.
pub fn parse_quantity(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite())
}

pub fn parse_code(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

fn optional_column(column: Option<&str>) -> Option<String> {
    column.filter(|c| !c.is_empty()).map(Into::into)
}

/// Fields may be quoted the way spreadsheets export them, so a quoted name can hold a tab.
pub fn parse_menu_sheet(text: &str) -> Result<Vec<MenuItemDraft>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut items = vec![];
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        items.push(MenuItemDraft {
            meal_time: record.get(0).unwrap_or_default().into(),
            name: record.get(1).unwrap_or_default().into(),
            quantity: record.get(2).and_then(parse_quantity),
            code: record.get(3).and_then(parse_code),
            color: optional_column(record.get(4)),
            recipe_title: optional_column(record.get(5)),
        });
    }
    Ok(items)
}

/// Replaces the target's menu with the items in the sheet at `path`. Returns how many were stored.
pub fn import_menu(
    conn: &mut database::Connection,
    target: MenuTarget,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    let items = parse_menu_sheet(&std::fs::read_to_string(path)?)?;
    let saved = menus::save_items(conn, target, &items)?;
    log::info!(
        "imported {saved} of {} menu items from {path:?}",
        items.len()
    );
    Ok(saved)
}

#[test]
fn quantities_and_codes() {
    assert_eq!(parse_quantity("2"), Some(2.0));
    assert_eq!(parse_quantity(" 1,5 "), Some(1.5));
    assert_eq!(parse_quantity("0.25"), Some(0.25));
    assert_eq!(parse_quantity(""), None);
    assert_eq!(parse_quantity("media taza"), None);
    assert_eq!(parse_quantity("inf"), None);

    assert_eq!(parse_code("30"), Some(30));
    assert_eq!(parse_code(" 7 "), Some(7));
    assert_eq!(parse_code("A1"), None);
}

#[test]
fn sheet_parsing() {
    let sheet = "# tiempo\tnombre\tcantidad\tcodigo\tcolor\treceta\n\
                 Desayuno\tHuevo\t2\t30\t#EF4444\n\
                 \n\
                 Comida\tPollo\t1,5\t\t\tPollo con arroz\n\
                 Cena\tTé\n";
    let items = parse_menu_sheet(sheet).unwrap();
    assert_eq!(
        items,
        [
            MenuItemDraft {
                meal_time: "Desayuno".into(),
                name: "Huevo".into(),
                quantity: Some(2.0),
                code: Some(30),
                color: Some("#EF4444".into()),
                recipe_title: None,
            },
            MenuItemDraft {
                meal_time: "Comida".into(),
                name: "Pollo".into(),
                quantity: Some(1.5),
                code: None,
                color: None,
                recipe_title: Some("Pollo con arroz".into()),
            },
            MenuItemDraft {
                meal_time: "Cena".into(),
                name: "Té".into(),
                ..Default::default()
            },
        ]
    );
}

#[test]
fn quoted_fields() {
    let sheet = "\"Desayuno\"\t\"Huevo\ttibio\"\t2\n\
                 Cena\t\"Té \"\"verde\"\"\"\t\t\t\t\"Cena ligera\"\n\
                 \t \t\n";
    let items = parse_menu_sheet(sheet).unwrap();
    assert_eq!(
        items,
        [
            MenuItemDraft {
                meal_time: "Desayuno".into(),
                name: "Huevo\ttibio".into(),
                quantity: Some(2.0),
                ..Default::default()
            },
            MenuItemDraft {
                meal_time: "Cena".into(),
                name: "Té \"verde\"".into(),
                recipe_title: Some("Cena ligera".into()),
                ..Default::default()
            },
        ]
    );
}

#[test]
fn import_replaces_working_menu() {
    use crate::repository::patients;

    let mut conn = database::test_connection();
    let patient = patients::create(&mut conn, "Ana", &[]).unwrap();
    let path = std::env::temp_dir().join(format!("menu-sheet-{}.tsv", std::process::id()));
    std::fs::write(&path, "Desayuno\tHuevo\t2\t30\t#EF4444\nMerienda\tGalletas\n").unwrap();

    let saved = import_menu(&mut conn, MenuTarget::Patient(patient), &path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(saved, 1);

    let items = menus::items_by_patient(&mut conn, patient).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].meal_time, "Desayuno");
    assert_eq!(items[0].item.quantity, Some(2.0));
}
