// Copyright 2023 Remi Bernotavicius

use crate::database::models::{IngredientId, MenuId, PatientId, RecipeId};
use crate::repository::menus::{MenuItemView, MenuTarget};
use crate::repository::recipes::{RecipeChanges, RecipeDetails, RecipeDraft};
use crate::repository::{catalog, ingredients, menus, patients, recipes};
use crate::{assets, database, export, import, Result};
use clap::{Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(subcommand)]
    Recipes(RecipeCommand),
    #[command(subcommand)]
    Patients(PatientCommand),
    #[command(subcommand)]
    Ingredients(IngredientCommand),
    /// The ingredient categories and their colors.
    #[command(subcommand)]
    Categories(ListCommand),
    #[command(subcommand)]
    MealTimes(ListCommand),
    #[command(subcommand)]
    Menu(MenuCommand),
    #[command(subcommand)]
    Image(ImageCommand),
}

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    List,
}

#[derive(Debug, Subcommand)]
pub enum ImageCommand {
    /// Copy an image into the data directory and print the path to use for a recipe.
    Save { path: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum RecipeCommand {
    List,
    Show {
        id: i32,
    },
    Add {
        name: String,
        #[arg(long)]
        meal_time: String,
        #[arg(long, default_value = "")]
        prep_time: String,
        #[arg(long, default_value_t = 0)]
        calories: i32,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
    },
    /// Change only the given fields. Giving any `--ingredient` replaces the whole list.
    Update {
        id: i32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        meal_time: Option<String>,
        #[arg(long)]
        prep_time: Option<String>,
        #[arg(long)]
        calories: Option<i32>,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, conflicts_with = "clear_link")]
        link: Option<String>,
        #[arg(long)]
        clear_link: bool,
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
    },
    Delete {
        id: i32,
    },
}

#[derive(Debug, Subcommand)]
pub enum PatientCommand {
    List,
    Show {
        id: i32,
    },
    Add {
        name: String,
        /// Id of an ingredient the patient must avoid.
        #[arg(long)]
        avoid: Vec<i32>,
    },
    /// Rename a patient. Giving `--avoid` or `--clear-avoid` replaces the avoid list.
    Update {
        id: i32,
        name: String,
        #[arg(long)]
        avoid: Vec<i32>,
        #[arg(long, conflicts_with = "avoid")]
        clear_avoid: bool,
    },
    Delete {
        id: i32,
    },
}

#[derive(Debug, Subcommand)]
pub enum IngredientCommand {
    List,
    Show {
        id: i32,
    },
    Add {
        name: String,
        #[arg(long)]
        category: Option<i32>,
    },
    Update {
        id: i32,
        name: String,
        #[arg(long)]
        category: Option<i32>,
    },
    Delete {
        id: i32,
    },
}

#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// The patient's working menu.
    #[arg(long)]
    patient: Option<i32>,
    /// A named menu.
    #[arg(long)]
    menu: Option<i32>,
}

impl TargetArgs {
    fn target(&self) -> Result<MenuTarget> {
        match (self.patient, self.menu) {
            (_, Some(menu)) => Ok(MenuTarget::Menu(menu.into())),
            (Some(patient), None) => Ok(MenuTarget::Patient(patient.into())),
            (None, None) => Err("either --patient or --menu is required".into()),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum MenuCommand {
    /// Create a named menu with the given meal slots.
    Create {
        patient: i32,
        name: String,
        #[arg(long = "meal-time")]
        meal_times: Vec<String>,
    },
    List {
        patient: i32,
    },
    Show {
        menu: i32,
    },
    /// Show the items of a patient's working menu.
    Items {
        patient: i32,
    },
    /// Replace a menu's items with the ones in a tab-separated sheet.
    Import {
        path: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
    },
    Delete {
        menu: i32,
    },
    /// Delete every menu and menu item of a patient.
    DeleteAll {
        patient: i32,
    },
    Export {
        #[command(flatten)]
        target: TargetArgs,
        /// Defaults to `menus` in the data directory.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        no_open: bool,
    },
}

fn store_image(data_dir: &Path, path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let relative = assets::save_recipe_image(data_dir, &bytes, &filename)?;
    Ok(relative.to_string_lossy().into_owned())
}

fn print_recipe(details: &RecipeDetails) {
    let recipe = &details.recipe;
    println!(
        "{}\t{}\t{}\t{}\t{} kcal",
        recipe.id, recipe.name, details.meal_time, recipe.prep_time, recipe.calories
    );
    if !recipe.image_path.is_empty() {
        println!("\timage: {}", recipe.image_path);
    }
    if let Some(link) = &recipe.link {
        println!("\tlink: {link}");
    }
    let names: Vec<_> = details.ingredients.iter().map(|i| i.name.as_str()).collect();
    println!("\tingredients: {}", names.join(", "));
}

fn print_items(items: &[MenuItemView]) {
    for view in items {
        let item = &view.item;
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            view.meal_time,
            item.quantity.map(|q| q.to_string()).unwrap_or_default(),
            item.name,
            item.code.map(|c| c.to_string()).unwrap_or_default(),
            view.color.as_deref().unwrap_or_default(),
            item.recipe_title.as_deref().unwrap_or_default(),
        );
    }
}

fn not_found(what: &str, id: i32) -> crate::Error {
    format!("no {what} with id {id}").into()
}

fn run_recipes(
    conn: &mut database::Connection,
    data_dir: &Path,
    command: RecipeCommand,
) -> Result<()> {
    match command {
        RecipeCommand::List => {
            for details in recipes::list(conn)? {
                print_recipe(&details);
            }
        }
        RecipeCommand::Show { id } => {
            let details = recipes::get(conn, id.into())?.ok_or_else(|| not_found("recipe", id))?;
            print_recipe(&details);
        }
        RecipeCommand::Add {
            name,
            meal_time,
            prep_time,
            calories,
            image,
            link,
            ingredients,
        } => {
            if meal_time.trim().is_empty() {
                return Err("--meal-time must not be blank".into());
            }
            let image_path = match image {
                Some(image) => store_image(data_dir, &image)?,
                None => String::new(),
            };
            let id = recipes::create(
                conn,
                &RecipeDraft {
                    name,
                    meal_time,
                    prep_time,
                    calories,
                    image_path,
                    link,
                    ingredients,
                },
            )?;
            println!("{id}");
        }
        RecipeCommand::Update {
            id,
            name,
            meal_time,
            prep_time,
            calories,
            image,
            link,
            clear_link,
            ingredients,
        } => {
            let changes = RecipeChanges {
                name,
                meal_time,
                prep_time,
                calories,
                image_path: image.map(|i| store_image(data_dir, &i)).transpose()?,
                link: if clear_link { Some(None) } else { link.map(Some) },
                ingredients: (!ingredients.is_empty()).then_some(ingredients),
            };
            if !recipes::update(conn, RecipeId::from(id), &changes)? {
                return Err(not_found("recipe", id));
            }
        }
        RecipeCommand::Delete { id } => {
            if !recipes::delete(conn, id.into())? {
                return Err(not_found("recipe", id));
            }
        }
    }
    Ok(())
}

fn run_patients(conn: &mut database::Connection, command: PatientCommand) -> Result<()> {
    let to_ids = |ids: Vec<i32>| -> Vec<IngredientId> { ids.into_iter().map(Into::into).collect() };
    match command {
        PatientCommand::List => {
            for patient in patients::list(conn)? {
                println!("{}\t{}\t{}", patient.id, patient.name, patient.created_at);
            }
        }
        PatientCommand::Show { id } => {
            let details = patients::get(conn, id.into())?.ok_or_else(|| not_found("patient", id))?;
            let patient = &details.patient;
            println!("{}\t{}\t{}", patient.id, patient.name, patient.created_at);
            let names: Vec<_> = details.avoid.iter().map(|i| i.name.as_str()).collect();
            println!("\tavoid: {}", names.join(", "));
        }
        PatientCommand::Add { name, avoid } => {
            let id = patients::create(conn, &name, &to_ids(avoid))?;
            println!("{id}");
        }
        PatientCommand::Update {
            id,
            name,
            avoid,
            clear_avoid,
        } => {
            let avoid = (clear_avoid || !avoid.is_empty()).then(|| to_ids(avoid));
            if !patients::update(conn, PatientId::from(id), &name, avoid.as_deref())? {
                return Err(not_found("patient", id));
            }
        }
        PatientCommand::Delete { id } => {
            if !patients::delete(conn, id.into())? {
                return Err(not_found("patient", id));
            }
        }
    }
    Ok(())
}

fn run_ingredients(conn: &mut database::Connection, command: IngredientCommand) -> Result<()> {
    match command {
        IngredientCommand::List => {
            for listing in ingredients::list(conn)? {
                let (category, color) = listing
                    .category
                    .map(|c| (c.name, c.color))
                    .unwrap_or_default();
                println!(
                    "{}\t{}\t{category}\t{color}",
                    listing.ingredient.id, listing.ingredient.name
                );
            }
        }
        IngredientCommand::Show { id } => {
            let ingredient =
                ingredients::get(conn, id.into())?.ok_or_else(|| not_found("ingredient", id))?;
            let category = ingredient
                .category_id
                .map(|c| c.to_string())
                .unwrap_or_default();
            println!("{}\t{}\t{category}", ingredient.id, ingredient.name);
        }
        IngredientCommand::Add { name, category } => {
            let id = ingredients::create(conn, &name, category.map(Into::into))?;
            println!("{id}");
        }
        IngredientCommand::Update { id, name, category } => {
            if !ingredients::update(conn, id.into(), &name, category.map(Into::into))? {
                return Err(not_found("ingredient", id));
            }
        }
        IngredientCommand::Delete { id } => {
            if !ingredients::delete(conn, id.into())? {
                return Err(not_found("ingredient", id));
            }
        }
    }
    Ok(())
}

fn run_menu(conn: &mut database::Connection, data_dir: &Path, command: MenuCommand) -> Result<()> {
    match command {
        MenuCommand::Create {
            patient,
            name,
            meal_times,
        } => {
            let id = menus::create(conn, patient.into(), &name, &meal_times)?;
            println!("{id}");
        }
        MenuCommand::List { patient } => {
            for menu in menus::list_by_patient(conn, patient.into())? {
                println!("{}\t{}\t{}", menu.id, menu.name, menu.created_at);
            }
        }
        MenuCommand::Show { menu } => {
            let details = menus::get(conn, MenuId::from(menu))?.ok_or_else(|| not_found("menu", menu))?;
            let slots: Vec<_> = details.slots.iter().map(|s| s.name.as_str()).collect();
            println!("{}\t{}\t{}", details.menu.id, details.menu.name, slots.join(", "));
            print_items(&details.items);
        }
        MenuCommand::Items { patient } => {
            print_items(&menus::items_by_patient(conn, patient.into())?);
        }
        MenuCommand::Import { path, target } => {
            let saved = import::import_menu(conn, target.target()?, path)?;
            println!("saved {saved} items");
        }
        MenuCommand::Delete { menu } => {
            if !menus::delete(conn, menu.into())? {
                return Err(not_found("menu", menu));
            }
        }
        MenuCommand::DeleteAll { patient } => {
            let removed = menus::delete_by_patient(conn, patient.into())?;
            println!("removed {removed} items");
        }
        MenuCommand::Export {
            target,
            out,
            no_open,
        } => {
            let dir = out.unwrap_or_else(|| data_dir.join("menus"));
            let path = export::export_menu(conn, target.target()?, &dir)?;
            println!("{}", path.display());
            if !no_open {
                open::that(path)?;
            }
        }
    }
    Ok(())
}

pub fn run(conn: &mut database::Connection, data_dir: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Recipes(command) => run_recipes(conn, data_dir, command)?,
        Commands::Patients(command) => run_patients(conn, command)?,
        Commands::Ingredients(command) => run_ingredients(conn, command)?,
        Commands::Categories(ListCommand::List) => {
            for category in catalog::categories(conn)? {
                println!("{}\t{}\t{}", category.id, category.name, category.color);
            }
        }
        Commands::MealTimes(ListCommand::List) => {
            for meal_time in catalog::meal_times(conn)? {
                println!("{}\t{}", meal_time.id, meal_time.name);
            }
        }
        Commands::Menu(command) => run_menu(conn, data_dir, command)?,
        Commands::Image(ImageCommand::Save { path }) => {
            println!("{}", store_image(data_dir, &path)?)
        }
    }
    Ok(())
}

#[test]
fn verify_cli() {
    use clap::CommandFactory as _;
    crate::Args::command().debug_assert();
}

#[test]
fn catalog_and_image_commands() {
    use clap::Parser as _;

    let parse = |args: &[&str]| crate::Args::try_parse_from(args).map(|a| a.commands);
    assert!(matches!(
        parse(&["menu-planner", "categories", "list"]).unwrap(),
        Commands::Categories(ListCommand::List)
    ));
    assert!(matches!(
        parse(&["menu-planner", "meal-times", "list"]).unwrap(),
        Commands::MealTimes(ListCommand::List)
    ));
    let Commands::Image(ImageCommand::Save { path }) =
        parse(&["menu-planner", "image", "save", "tacos.png"]).unwrap()
    else {
        panic!("expected image save");
    };
    assert_eq!(path, PathBuf::from("tacos.png"));

    assert!(parse(&["menu-planner", "categories"]).is_err());
    assert!(parse(&["menu-planner", "save-recipe-image", "tacos.png"]).is_err());
}

#[test]
fn blank_meal_time_is_rejected_before_storing() {
    use clap::Parser as _;

    let data_dir = std::env::temp_dir().join(format!("menu-cli-{}", std::process::id()));
    let mut conn = database::test_connection();
    let before = recipes::list(&mut conn).unwrap().len();

    let args = crate::Args::try_parse_from([
        "menu-planner",
        "recipes",
        "add",
        "Sopa",
        "--meal-time",
        " ",
        "--image",
        "missing.png",
    ])
    .unwrap();
    let err = run(&mut conn, &data_dir, args.commands).unwrap_err();
    assert!(err.to_string().contains("--meal-time"));
    assert_eq!(recipes::list(&mut conn).unwrap().len(), before);
    assert!(!data_dir.exists());
}

#[test]
fn menu_target_arguments() {
    use clap::Parser as _;

    let args = crate::Args::try_parse_from(["menu-planner", "menu", "export", "--menu", "3"]).unwrap();
    let crate::cli::Commands::Menu(MenuCommand::Export { target, .. }) = args.commands else {
        panic!("expected menu export");
    };
    assert_eq!(target.target().unwrap(), MenuTarget::Menu(MenuId::from(3)));

    assert!(crate::Args::try_parse_from(["menu-planner", "menu", "export"]).is_err());
    assert!(crate::Args::try_parse_from([
        "menu-planner",
        "menu",
        "export",
        "--menu",
        "3",
        "--patient",
        "1"
    ])
    .is_err());
}
