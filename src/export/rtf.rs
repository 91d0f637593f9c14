// Copyright 2023 Remi Bernotavicius

use super::{HeaderColor, MenuTable, RecipeReference, TABLES_PER_SECTION};

// Letter, landscape. All in twips.
const PAGE_WIDTH: usize = 15840;
const PAGE_HEIGHT: usize = 12240;
const MARGIN: usize = 720;

const INNER_BORDER: &str = "\\brdrs\\brdrw10";

impl HeaderColor {
    /// Index into the document's color table. The header colors come first.
    fn color_index(&self) -> usize {
        Self::iter().position(|c| c == *self).unwrap_or(0) + 1
    }
}

fn white_index() -> usize {
    HeaderColor::iter().count() + 1
}

fn link_index() -> usize {
    white_index() + 1
}

/// Escapes text for RTF. Anything outside ASCII is written as UTF-16 `\u` escapes.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped += "\\line ",
            c if c.is_ascii() => escaped.push(c),
            c => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf).iter() {
                    escaped += &format!("\\u{}?", *unit as i16);
                }
            }
        }
    }
    escaped
}

fn rich_text_header() -> String {
    let mut rich_text = String::new();
    rich_text += "{\\rtf1\\ansi\\deff0\n";
    rich_text += "{\\fonttbl\\f0\\fswiss\\fcharset0 Helvetica;}\n";

    rich_text += "{\\colortbl;";
    for color in HeaderColor::iter() {
        let (r, g, b) = color.rgb();
        rich_text += &format!("\\red{r}\\green{g}\\blue{b};");
    }
    rich_text += "\\red255\\green255\\blue255;\\red37\\green99\\blue235;}\n";

    rich_text += &format!(
        "\\paperw{PAGE_WIDTH}\\paperh{PAGE_HEIGHT}\\margl{MARGIN}\\margr{MARGIN}\\margt{MARGIN}\\margb{MARGIN}\\landscape\n"
    );
    rich_text
}

fn rich_text_heading(text: &str) -> String {
    format!("\\pard\\qc\\f0\\b\\fs32 {}\\b0\\fs20\\par\\par\n", escape(text))
}

fn recipe_title(recipe: &RecipeReference) -> String {
    let title = escape(&recipe.title);
    match &recipe.link {
        Some(link) => format!(
            "{{\\field{{\\*\\fldinst{{HYPERLINK \"{}\"}}}}{{\\fldrslt{{\\b\\ul\\cf{} {title}}}}}}}",
            escape(&link.replace('"', "%22")),
            link_index()
        ),
        None => format!("{{\\b {title}}}"),
    }
}

/// Cell boundaries for a row of `count` cells. Only the borders between cells (and under the
/// header) are drawn, the outside of the table has none.
fn row_definition(count: usize, header_colors: Option<Vec<HeaderColor>>) -> String {
    let cell_width = (PAGE_WIDTH - 2 * MARGIN) / TABLES_PER_SECTION;
    let mut rich_text = String::from("\\trowd\\trgaph108\\trleft0\n");
    for i in 0..count {
        if i > 0 {
            rich_text += &format!("\\clbrdrl{INNER_BORDER}");
        }
        match &header_colors {
            Some(colors) => {
                rich_text += &format!(
                    "\\clbrdrb{INNER_BORDER}\\clcbpat{}",
                    colors[i].color_index()
                );
            }
            None => rich_text += "\\clvertalt",
        }
        rich_text += &format!("\\cellx{}\n", cell_width * (i + 1));
    }
    rich_text
}

fn rich_text_section(tables: &[MenuTable]) -> String {
    let colors = tables.iter().map(|t| t.header_color).collect();
    let mut rich_text = row_definition(tables.len(), Some(colors));
    for table in tables {
        rich_text += &format!(
            "\\pard\\intbl\\qc\\b\\cf{} {}\\b0\\cf0\\cell\n",
            white_index(),
            escape(&table.title)
        );
    }
    rich_text += "\\row\n";

    rich_text += &row_definition(tables.len(), None);
    for table in tables {
        let mut paragraphs = vec![];
        if let Some(recipe) = &table.recipe {
            paragraphs.push(recipe_title(recipe));
        }
        paragraphs.extend(table.lines.iter().map(|l| escape(&l.to_string())));
        rich_text += "\\pard\\intbl\\ql ";
        rich_text += &paragraphs.join("\\par\n");
        rich_text += "\\cell\n";
    }
    rich_text += "\\row\n\\pard\\par\n";
    rich_text
}

/// Renders the whole document: a heading, then the tables side by side in sections of
/// [`TABLES_PER_SECTION`].
pub fn render(heading: &str, tables: &[MenuTable]) -> String {
    let mut rich_text = rich_text_header();
    rich_text += &rich_text_heading(heading);
    for section in tables.chunks(TABLES_PER_SECTION) {
        rich_text += &rich_text_section(section);
    }
    rich_text += "}";
    rich_text
}

#[cfg(test)]
fn table(title: &str, header_color: HeaderColor, recipe: Option<RecipeReference>) -> MenuTable {
    MenuTable {
        title: title.into(),
        header_color,
        lines: vec![super::MenuLine {
            quantity: "1".into(),
            name: "Limón".into(),
        }],
        recipe,
    }
}

#[test]
fn escaping() {
    assert_eq!(escape("Pan {integral}"), "Pan \\{integral\\}");
    assert_eq!(escape("a\\b"), "a\\\\b");
    assert_eq!(escape("Limón"), "Lim\\u243?n");
    assert_eq!(escape("🍋"), "\\u-10180?\\u-8373?");
}

#[test]
fn sections_of_seven() {
    let tables: Vec<_> = (0..9)
        .map(|i| table(&format!("Día {i}"), HeaderColor::Green, None))
        .collect();
    let document = render("Menú", &tables);

    assert!(document.starts_with("{\\rtf1"));
    assert!(document.ends_with('}'));
    assert!(document.contains("\\landscape"));
    assert_eq!(document.matches("\\row\n").count(), 4);
    assert_eq!(document.matches("\\cell\n").count(), 18);
    assert_eq!(document.matches("\\cellx").count(), 18);
    assert!(document.contains("1 Lim\\u243?n"));
}

#[test]
fn header_colors_and_links() {
    let tables = [
        table(
            "Desayuno",
            HeaderColor::Green,
            Some(RecipeReference {
                title: "Tacos".into(),
                link: Some("https://example.com/tacos".into()),
            }),
        ),
        table(
            "Comida",
            HeaderColor::Orange,
            Some(RecipeReference {
                title: "Sopa".into(),
                link: None,
            }),
        ),
    ];
    let document = render("Menú", &tables);

    assert!(document.contains("\\clcbpat1\\cellx"));
    assert!(document.contains("\\clcbpat2\\cellx"));
    assert!(document.contains("HYPERLINK \"https://example.com/tacos\""));
    assert!(document.contains("{\\b Sopa}"));
    // no border on the outside of the first cell
    assert!(!document.contains("\\trleft0\n\\clbrdrl"));
}
