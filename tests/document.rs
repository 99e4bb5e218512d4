use common::{
    blue, check_xref, count, find, inflate, raw_streams, rect, red, streams, SerializeSettingsExt,
};
use folio::font::{Glyph, GlyphRun, StandardFont};
use folio::{
    BlendMode, Document, FillRule, LinkAnnotation, PageSettings, PathBuilder, Point,
    SerializeSettings, Target, Transform,
};

mod common;

fn document() -> Document {
    Document::new_with(SerializeSettings::uncompressed())
}

fn square_page() -> PageSettings {
    PageSettings::new(100.0, 100.0).unwrap()
}

fn single_page(f: impl FnOnce(&mut folio::Surface)) -> Vec<u8> {
    let mut document = document();
    let mut page = document.start_page_with(square_page());
    f(&mut page.surface());
    page.finish().unwrap();
    document.finish().unwrap()
}

#[test]
fn simple_page() {
    let pdf = single_page(|surface| surface.draw_rect(rect(0.0, 0.0, 100.0, 100.0), &red()));

    assert!(pdf.starts_with(b"%PDF-1.4\n%\xD3\xEB\xE9\xE1\n"));
    assert_eq!(count(&pdf, "/Type /Page\n"), 1);
    assert_eq!(count(&pdf, "/Type /Pages\n"), 1);
    assert_eq!(count(&pdf, "/Alpha"), 0);
    assert_eq!(count(&pdf, "/Luminosity"), 0);

    let streams = streams(&pdf);
    assert_eq!(streams.len(), 1);
    assert_eq!(
        streams[0],
        "1 0 0 -1 0 100 cm\n1 0 0 RG\n1 0 0 rg\n/G0 gs\n0 0 100 100 re\nf"
    );
    check_xref(&pdf);
}

#[test]
fn source_in_is_built_from_two_forms() {
    let pdf = single_page(|surface| {
        surface.draw_rect(rect(0.0, 0.0, 100.0, 100.0), &blue());
        surface.draw_path(
            &PathBuilder::from_circle(80.0, 80.0, 40.0).unwrap(),
            &red().with_blend_mode(BlendMode::SourceIn),
        );
    });

    assert_eq!(count(&pdf, "/Subtype /Form"), 2);
    assert_eq!(count(&pdf, "/S /Alpha"), 1);
    assert_eq!(count(&pdf, "/Luminosity"), 0);
    check_xref(&pdf);
}

#[test]
fn destination_mode_changes_nothing() {
    let plain = single_page(|surface| surface.draw_rect(rect(0.0, 0.0, 50.0, 50.0), &red()));
    let with_destination = single_page(|surface| {
        surface.draw_rect(rect(0.0, 0.0, 50.0, 50.0), &red());
        surface.draw_rect(
            rect(10.0, 10.0, 80.0, 80.0),
            &blue().with_blend_mode(BlendMode::Destination),
        );
    });

    assert_eq!(plain, with_destination);
}

#[test]
fn destination_over_draws_behind() {
    let pdf = single_page(|surface| {
        surface.draw_rect(rect(0.0, 0.0, 50.0, 50.0), &red());
        surface.draw_rect(
            rect(25.0, 25.0, 50.0, 50.0),
            &blue().with_blend_mode(BlendMode::DestinationOver),
        );
    });

    let content = &streams(&pdf)[0];
    let blue = content.find("0 0 1 rg").unwrap();
    let red = content.find("1 0 0 rg").unwrap();
    assert!(blue < red);
}

#[test]
fn destination_over_without_paint_leaves_no_trace() {
    let plain = single_page(|surface| surface.draw_rect(rect(0.0, 0.0, 50.0, 50.0), &red()));
    let with_empty_draw = single_page(|surface| {
        surface.draw_rect(rect(0.0, 0.0, 50.0, 50.0), &red());
        let mut line = PathBuilder::new();
        line.move_to(10.0, 10.0);
        line.line_to(90.0, 10.0);
        surface.draw_path(
            &line.finish().unwrap(),
            &blue().with_blend_mode(BlendMode::DestinationOver),
        );
    });

    assert_eq!(plain, with_empty_draw);
}

#[test]
fn destination_over_with_nothing_to_show_is_dropped() {
    let plain = single_page(|surface| surface.draw_rect(rect(0.0, 0.0, 50.0, 50.0), &red()));
    let with_empty_text = single_page(|surface| {
        surface.draw_rect(rect(0.0, 0.0, 50.0, 50.0), &red());
        // Helvetica has no glyph with this id, so no text object is written.
        let run = GlyphRun::new(StandardFont::helvetica(), 12.0, vec![Glyph::new(3, 10.0, 10.0)]);
        surface.draw_glyphs(&run, &red().with_blend_mode(BlendMode::DestinationOver));
    });

    assert_eq!(plain, with_empty_text);
}

#[test]
fn inverse_fill_with_default_settings() {
    let mut document = Document::new();
    let mut page = document.start_page_with(square_page());
    page.surface().fill_path_inverse(
        &PathBuilder::from_rect(rect(0.0, 0.0, 50.0, 100.0)),
        FillRule::NonZero,
        &red(),
    );
    page.finish().unwrap();
    let pdf = document.finish().unwrap();

    let streams = raw_streams(&pdf);
    assert_eq!(streams.len(), 1);
    let content = inflate(streams[0]);
    assert!(content.ends_with("50 0 50 100 re\nf"), "{content}");
    check_xref(&pdf);
}

#[test]
fn seventeen_pages() {
    let mut document = document();
    for _ in 0..17 {
        let mut page = document.start_page_with(square_page());
        page.surface().draw_rect(rect(0.0, 0.0, 10.0, 10.0), &red());
        page.finish().unwrap();
    }
    let pdf = document.finish().unwrap();

    assert_eq!(count(&pdf, "/Type /Page\n"), 17);
    assert_eq!(count(&pdf, "/Type /Pages\n"), 3);
    assert_eq!(count(&pdf, "/Count 8"), 2);
    assert_eq!(count(&pdf, "/Count 17"), 1);
    // Every page shares the graphics state of the first one.
    assert_eq!(count(&pdf, "/Type /ExtGState"), 1);
    check_xref(&pdf);
}

#[test]
fn no_pages_no_output() {
    assert!(document().finish().unwrap().is_empty());
}

#[test]
fn aborted_document() {
    let mut document = document();
    let image = folio::Image::from_rgba8(1, 1, &[255, 0, 0, 128]).unwrap();
    let mut page = document.start_page_with(square_page());
    page.surface().draw_image(&image, 0.0, 0.0, &red());
    page.finish().unwrap();
    document
        .start_page()
        .surface()
        .draw_rect(rect(0.0, 0.0, 10.0, 10.0), &red());
    document.abort();

    assert!(document.finish().unwrap().is_empty());
}

#[test]
fn aborted_document_can_start_over() {
    let mut document = document();
    let mut page = document.start_page_with(square_page());
    page.surface().draw_rect(rect(0.0, 0.0, 10.0, 10.0), &red());
    page.finish().unwrap();
    document.abort();

    let mut page = document.start_page_with(square_page());
    page.surface().draw_rect(rect(0.0, 0.0, 10.0, 10.0), &blue());
    page.finish().unwrap();
    let pdf = document.finish().unwrap();

    assert_eq!(count(&pdf, "/Type /Page\n"), 1);
    let streams = streams(&pdf);
    assert_eq!(streams.len(), 1);
    assert!(streams[0].contains("0 0 1 rg"));
    assert!(!streams[0].contains("1 0 0 rg"));
    check_xref(&pdf);
}

#[test]
fn output_is_deterministic() {
    let build = || {
        single_page(|surface| {
            surface.push_transform(&Transform::from_rotate(30.0));
            surface.draw_path(
                &PathBuilder::from_circle(50.0, 50.0, 20.0).unwrap(),
                &red().with_opacity(0.5),
            );
            surface.pop();
            surface.draw_rect(
                rect(0.0, 0.0, 30.0, 30.0),
                &blue().with_blend_mode(BlendMode::DestinationIn),
            );
        })
    };

    assert_eq!(build(), build());
}

#[test]
fn saves_and_restores_are_balanced() {
    let pdf = single_page(|surface| {
        for i in 0..5 {
            let offset = i as f32 * 5.0;
            surface.push_clip_rect(rect(offset, offset, 80.0, 80.0));
            surface.push_transform(&Transform::from_translate(1.0, 2.0));
            surface.draw_rect(rect(0.0, 0.0, 10.0, 10.0), &red());
        }
        for _ in 0..10 {
            surface.pop();
        }
        surface.push_clip_difference(
            &PathBuilder::from_rect(rect(10.0, 10.0, 10.0, 10.0)),
            FillRule::EvenOdd,
        );
        surface.draw_rect(rect(0.0, 0.0, 50.0, 50.0), &blue().with_opacity(0.5));
        surface.draw_rect(
            rect(20.0, 20.0, 50.0, 50.0),
            &red().with_blend_mode(BlendMode::SourceOut),
        );
        surface.pop();
    });

    for stream in streams(&pdf) {
        let saves = stream.lines().filter(|line| *line == "q").count();
        let restores = stream.lines().filter(|line| *line == "Q").count();
        assert_eq!(saves, restores);
    }
    check_xref(&pdf);
}

#[test]
fn links_and_named_destinations() {
    let mut document = document();

    let mut page = document.start_page_with(square_page());
    page.add_named_destination("conclusion", Point::from_xy(0.0, 10.0));
    page.finish().unwrap();

    let mut page = document.start_page_with(square_page());
    page.add_annotation(LinkAnnotation {
        rect: rect(0.0, 0.0, 20.0, 10.0),
        target: Target::Named("conclusion".to_string()),
    });
    page.add_annotation(LinkAnnotation {
        rect: rect(0.0, 20.0, 20.0, 10.0),
        target: Target::Url("https://example.com".to_string()),
    });
    page.finish().unwrap();

    let pdf = document.finish().unwrap();
    assert_eq!(count(&pdf, "/Subtype /Link"), 2);
    assert_eq!(count(&pdf, "/Dest /conclusion"), 1);
    assert_eq!(count(&pdf, "/URI (https://example.com)"), 1);
    assert!(find(&pdf, b"/Dests <<\n    /conclusion [").is_some());
    check_xref(&pdf);
}

#[test]
fn text_uses_the_standard_font() {
    let pdf = single_page(|surface| {
        let run = StandardFont::helvetica().layout("Hello", 12.0, 10.0, 20.0);
        surface.draw_glyphs(&run, &red());
    });

    assert_eq!(count(&pdf, "/BaseFont /Helvetica"), 1);
    let content = &streams(&pdf)[0];
    assert!(content.contains("BT\n/F0 12 Tf\n"));
    assert!(content.contains("Tj\nET"));
    check_xref(&pdf);
}

#[test]
fn images_are_written_once() {
    let image = folio::Image::from_rgba8(2, 1, &[255, 0, 0, 255, 0, 0, 255, 128]).unwrap();

    let mut document = Document::new();
    for _ in 0..2 {
        let mut page = document.start_page_with(square_page());
        let mut surface = page.surface();
        surface.draw_image(&image, 0.0, 0.0, &red());
        surface.draw_image(&image, 10.0, 10.0, &red());
        drop(surface);
        page.finish().unwrap();
    }
    let pdf = document.finish().unwrap();

    assert_eq!(count(&pdf, "/Subtype /Image"), 2);
    assert_eq!(count(&pdf, "/SMask "), 1);
    check_xref(&pdf);
}
