//! Content stream rendering: turns a page's high-level contents into PDF operators.

use crate::colour::Colour;
use crate::font::Font;
use crate::page::{PageContents, SpanFont, SpanLayout};
use id_arena::Arena;
use std::io::Write;

#[allow(clippy::write_with_newline)]
pub(crate) fn render_contents(
    contents: &[PageContents],
    fonts: &Arena<Font>,
) -> Result<Vec<u8>, std::io::Error> {
    if contents.is_empty() {
        return Ok(Vec::default());
    }

    let mut content: Vec<u8> = Vec::default();

    for page_content in contents.iter() {
        match page_content {
            PageContents::Text(spans) => {
                render_text_spans(&mut content, spans, fonts)?;
            }
            PageContents::Image(image) => {
                write!(&mut content, "q\n")?;
                write!(
                    &mut content,
                    "{} 0 0 {} {} {} cm\n",
                    image.width, image.height, image.origin.0, image.origin.1
                )?;
                write!(&mut content, "/I{} Do\n", image.image_id.index())?;
                write!(&mut content, "Q\n")?;
            }
        }
    }

    Ok(content)
}

#[allow(clippy::write_with_newline)]
fn render_text_spans(
    content: &mut Vec<u8>,
    spans: &[SpanLayout],
    fonts: &Arena<Font>,
) -> Result<(), std::io::Error> {
    let Some(first) = spans.first() else {
        return Ok(());
    };

    write!(content, "q\n")?;

    let mut current_font: SpanFont = first.font;
    let mut current_colour: Colour = first.colour;
    write!(
        content,
        "/F{} {} Tf\n",
        current_font.id.index(),
        current_font.size
    )?;
    write_colour(content, current_colour)?;

    for span in spans.iter() {
        if span.font != current_font {
            current_font = span.font;
            write!(
                content,
                "/F{} {} Tf\n",
                current_font.id.index(),
                current_font.size
            )?;
        }
        if span.colour != current_colour {
            current_colour = span.colour;
            write_colour(content, current_colour)?;
        }

        let Some(font) = fonts.get(current_font.id) else {
            continue;
        };

        write!(content, "BT\n")?;
        write!(content, "{} {} Td\n", span.coords.0, span.coords.1)?;
        write!(content, "<")?;
        for byte in font.encode(&span.text) {
            write!(content, "{byte:02x}")?;
        }
        write!(content, "> Tj\n")?;
        write!(content, "ET\n")?;
    }

    write!(content, "Q\n")?;
    Ok(())
}

#[allow(clippy::write_with_newline)]
fn write_colour(content: &mut Vec<u8>, colour: Colour) -> Result<(), std::io::Error> {
    match colour {
        Colour::RGB { r, g, b } => write!(content, "{r} {g} {b} rg\n"),
        Colour::CMYK { c, m, y, k } => write!(content, "{c} {m} {y} {k} k\n"),
        Colour::Grey { g } => write!(content, "{g} g\n"),
    }
}
