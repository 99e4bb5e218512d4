use crate::device::PdfDevice;
use crate::paint::{Color, Paint};
use crate::serialize::{SerializeContext, SerializeSettings};
use crate::surface::Surface;
use difference::{Changeset, Difference};
use tiny_skia_path::{Path, PathBuilder, Rect, Transform};

pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::from_xywh(x, y, w, h).unwrap()
}

pub fn rect_to_path(x: f32, y: f32, w: f32, h: f32) -> Path {
    PathBuilder::from_rect(rect(x, y, w, h))
}

pub fn circle_path(cx: f32, cy: f32, r: f32) -> Path {
    PathBuilder::from_circle(cx, cy, r).unwrap()
}

pub fn red_paint() -> Paint {
    Paint::from(Color::new(255, 0, 0))
}

/// Draw on a 100x100 device without an initial transform and return the
/// resulting content stream.
pub fn page_content(f: impl FnOnce(&mut Surface)) -> String {
    let mut sc = SerializeContext::new(SerializeSettings::default_test());
    let mut device = PdfDevice::new(rect(0.0, 0.0, 100.0, 100.0), Transform::identity());

    let mut surface = Surface::new(&mut sc, &mut device, Transform::identity());
    f(&mut surface);
    drop(surface);

    sc.check().unwrap();
    let (content, _) = device.finish(&sc).unwrap();
    String::from_utf8(content).unwrap()
}

/// Compare a content stream line by line, printing the difference if there
/// is any.
pub fn check_content(actual: &str, expected: &str) {
    let changeset = Changeset::new(expected, actual, "\n");

    if changeset.distance != 0 {
        for diff in changeset.diffs {
            match diff {
                Difference::Same(ref x) => {
                    eprintln!(" {}", x);
                }
                Difference::Add(ref x) => {
                    eprintln!("+++++++++++++++++++\n{}\n+++++++++++++++++++", x);
                }
                Difference::Rem(ref x) => {
                    eprintln!("-------------------\n{}\n-------------------", x);
                }
            }
        }
    }

    assert_eq!(changeset.distance, 0);
}
