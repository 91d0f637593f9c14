// Copyright 2023 Remi Bernotavicius

//! Exporting a composed menu as a word-processor document.

use crate::assets::slug;
use crate::database;
use crate::database::models::MealTimeId;
use crate::repository::menus::{self, MenuTarget};
use crate::repository::patients;
use derive_more::Display;
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use std::fmt;
use std::path::{Path, PathBuf};
use strum::EnumIter;

mod rtf;

pub use rtf::render;

/// How many tables go side by side in one section of the document.
pub const TABLES_PER_SECTION: usize = 7;

#[derive(Debug, Display, EnumIter, Copy, Clone, PartialEq, Eq)]
pub enum HeaderColor {
    #[display("green")]
    Green,
    #[display("orange")]
    Orange,
}

impl HeaderColor {
    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    fn for_position(position: usize) -> Self {
        if position % 2 == 0 {
            Self::Green
        } else {
            Self::Orange
        }
    }

    fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Green => (22, 163, 74),
            Self::Orange => (234, 88, 12),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuLine {
    pub quantity: String,
    pub name: String,
}

impl fmt::Display for MenuLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantity.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.quantity, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeReference {
    pub title: String,
    pub link: Option<String>,
}

/// One table of the exported document: a meal slot's lines, optionally headed by a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuTable {
    pub title: String,
    pub header_color: HeaderColor,
    pub lines: Vec<MenuLine>,
    pub recipe: Option<RecipeReference>,
}

fn recipe_link(conn: &mut database::Connection, title: &str) -> QueryResult<Option<String>> {
    use database::schema::recipes::dsl::*;

    Ok(recipes
        .filter(name.eq(title))
        .order(id.asc())
        .select(link)
        .first::<Option<String>>(conn)
        .optional()?
        .flatten())
}

/// Groups the stored items of the target into tables. Consecutive items with the same meal time
/// and recipe title share a table.
pub fn build_tables(
    conn: &mut database::Connection,
    target: MenuTarget,
) -> QueryResult<Vec<MenuTable>> {
    let mut tables: Vec<MenuTable> = vec![];
    let mut current: Option<(MealTimeId, Option<String>)> = None;

    for view in menus::load_items(conn, target)? {
        let key = (view.item.meal_time_id, view.item.recipe_title);
        if current.as_ref() != Some(&key) {
            let recipe = match &key.1 {
                Some(title) => Some(RecipeReference {
                    title: title.clone(),
                    link: recipe_link(conn, title)?,
                }),
                None => None,
            };
            tables.push(MenuTable {
                title: view.meal_time,
                header_color: HeaderColor::for_position(tables.len()),
                lines: vec![],
                recipe,
            });
            current = Some(key);
        }
        if let Some(table) = tables.last_mut() {
            table.lines.push(MenuLine {
                quantity: view.item.quantity.map(|q| q.to_string()).unwrap_or_default(),
                name: view.item.name,
            });
        }
    }
    Ok(tables)
}

/// Writes the target's menu to `dir` and returns the path of the new document.
pub fn export_menu(
    conn: &mut database::Connection,
    target: MenuTarget,
    dir: &Path,
) -> crate::Result<PathBuf> {
    let (patient_id, menu_name) = match target {
        MenuTarget::Patient(patient) => (patient, None),
        MenuTarget::Menu(menu) => {
            let details = menus::get(conn, menu)?.ok_or_else(|| format!("no menu with id {menu}"))?;
            (details.menu.patient_id, Some(details.menu.name))
        }
    };
    let patient = patients::get(conn, patient_id)?
        .ok_or_else(|| format!("no patient with id {patient_id}"))?
        .patient;

    let heading = match &menu_name {
        Some(menu_name) => format!("{menu_name} - {}", patient.name),
        None => format!("Menú - {}", patient.name),
    };
    let tables = build_tables(conn, target)?;
    let document = render(&heading, &tables);

    std::fs::create_dir_all(dir)?;
    let date = chrono::Local::now().date_naive();
    let path = dir.join(format!("menu-{}-{date}.rtf", slug(&patient.name)));
    std::fs::write(&path, document)?;
    log::info!("exported {} menu tables to {path:?}", tables.len());
    Ok(path)
}

#[cfg(test)]
fn draft(meal_time: &str, name: &str, recipe_title: Option<&str>) -> menus::MenuItemDraft {
    menus::MenuItemDraft {
        meal_time: meal_time.into(),
        name: name.into(),
        quantity: Some(1.5),
        recipe_title: recipe_title.map(Into::into),
        ..Default::default()
    }
}

#[test]
fn tables_group_consecutive_items() {
    use crate::repository::recipes::{self, RecipeDraft};

    let mut conn = database::test_connection();
    recipes::create(
        &mut conn,
        &RecipeDraft {
            name: "Tacos".into(),
            meal_time: "Comida".into(),
            link: Some("https://example.com/tacos".into()),
            ..Default::default()
        },
    )
    .unwrap();
    let patient = patients::create(&mut conn, "Ana", &[]).unwrap();
    let target = MenuTarget::Patient(patient);
    menus::save_items(
        &mut conn,
        target,
        &[
            draft("Desayuno", "Avena", Some("Avena con plátano")),
            draft("Desayuno", "Leche", Some("Avena con plátano")),
            draft("Comida", "Tortilla", Some("Tacos")),
            draft("Comida", "Pollo", Some("Tacos")),
            draft("Comida", "Agua", None),
            draft("Cena", "Pan", None),
        ],
    )
    .unwrap();

    let tables = build_tables(&mut conn, target).unwrap();
    let titles: Vec<_> = tables.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Desayuno", "Comida", "Comida", "Cena"]);

    let colors: Vec<_> = tables.iter().map(|t| t.header_color).collect();
    assert_eq!(
        colors,
        [
            HeaderColor::Green,
            HeaderColor::Orange,
            HeaderColor::Green,
            HeaderColor::Orange
        ]
    );

    assert_eq!(
        tables[0].recipe,
        Some(RecipeReference {
            title: "Avena con plátano".into(),
            link: None
        })
    );
    assert_eq!(
        tables[1].recipe.as_ref().unwrap().link.as_deref(),
        Some("https://example.com/tacos")
    );
    assert_eq!(tables[2].recipe, None);

    let lines: Vec<_> = tables[1].lines.iter().map(|l| l.to_string()).collect();
    assert_eq!(lines, ["1.5 Tortilla", "1.5 Pollo"]);
}

#[test]
fn menu_line_display() {
    let line = MenuLine {
        quantity: "2".into(),
        name: "Huevo".into(),
    };
    assert_eq!(line.to_string(), "2 Huevo");
    let line = MenuLine {
        quantity: String::new(),
        name: "Agua natural".into(),
    };
    assert_eq!(line.to_string(), "Agua natural");
}

#[test]
fn export_writes_document() {
    let mut conn = database::test_connection();
    let patient = patients::create(&mut conn, "Ana López", &[]).unwrap();
    let menu = menus::create(&mut conn, patient, "Semana 1", &["Desayuno"]).unwrap();
    menus::save_items(
        &mut conn,
        MenuTarget::Menu(menu),
        &[draft("Desayuno", "Avena", None)],
    )
    .unwrap();

    let dir = std::env::temp_dir().join(format!("menu-export-{}", std::process::id()));
    let path = export_menu(&mut conn, MenuTarget::Menu(menu), &dir).unwrap();
    let file_name = path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("menu-ana-lópez-"));
    assert!(file_name.ends_with(".rtf"));

    let document = std::fs::read_to_string(&path).unwrap();
    assert!(document.starts_with("{\\rtf1"));
    assert!(document.contains("Semana 1"));
    assert!(document.contains("1.5 Avena"));

    std::fs::remove_dir_all(&dir).unwrap();

    assert!(menus::delete(&mut conn, menu).unwrap());
    assert!(export_menu(&mut conn, MenuTarget::Menu(menu), &dir).is_err());
}

#[test]
fn export_working_menu() {
    let mut conn = database::test_connection();
    let patient = patients::create(&mut conn, "Beto Ruiz", &[]).unwrap();
    let named = menus::create(&mut conn, patient, "Semana 1", &["Comida"]).unwrap();
    menus::save_items(
        &mut conn,
        MenuTarget::Menu(named),
        &[draft("Comida", "Sopa de lentejas", None)],
    )
    .unwrap();
    menus::save_items(
        &mut conn,
        MenuTarget::Patient(patient),
        &[
            draft("Cena", "Tortilla", Some("Tacos de frijol")),
            draft("Cena", "Frijol", Some("Tacos de frijol")),
        ],
    )
    .unwrap();

    let dir = std::env::temp_dir().join(format!("menu-export-working-{}", std::process::id()));
    let path = export_menu(&mut conn, MenuTarget::Patient(patient), &dir).unwrap();
    let file_name = path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("menu-beto-ruiz-"));

    let document = std::fs::read_to_string(&path).unwrap();
    assert!(document.contains("Beto Ruiz"));
    assert!(document.contains("Tacos de frijol"));
    assert!(document.contains("Tortilla"));
    assert!(!document.contains("Semana 1"));
    assert!(!document.contains("Sopa de lentejas"));

    std::fs::remove_dir_all(&dir).unwrap();
}
